use std::io;

use anyhow::{Context, Result};
use thermal_color::{args_parser, bridge::serve, logger, node::NodeConfig};
use tracing::info;

fn main() -> Result<()> {
    args_parser!("thermal-color-node")
        .about(
            "Speak rosbridge JSON on stdin/stdout: false-color frames from \
             /flir_one_node/ir_16b/image_raw onto /flir_one_node/ir_rgb/image_raw.",
        )
        .get_matches();
    logger::init();

    let config = NodeConfig::default();
    let stdin = io::stdin();
    let (stats, _) =
        serve(stdin.lock(), io::stdout(), &config).context("rosbridge stream failed")?;

    info!(
        received = stats.received,
        published = stats.published,
        dropped = stats.dropped,
        "stream closed"
    );
    Ok(())
}
