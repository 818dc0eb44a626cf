mod args;
mod proc;

use anyhow::Result;
use rayon::prelude::*;
use thermal_color::{cli::process_paths_par, logger, ThermalImageConverter};
use tracing::{error, info};

use crate::{args::Args, proc::colorize_to_png};

fn main() -> Result<()> {
    let args = Args::from_cmd_line()?;
    logger::init();

    let Args {
        paths,
        is_json,
        output,
    } = args;
    std::fs::create_dir_all(&output)?;

    let conv = ThermalImageConverter::new();
    let (written, dropped) = process_paths_par(paths, is_json)
        .into_par_iter()
        .map(|inp| colorize_to_png(inp?, &conv, &output))
        .fold(
            || (0usize, 0usize),
            |(ok, bad), res| match res {
                Ok(path) => {
                    info!(path = %path.display(), "wrote frame");
                    (ok + 1, bad)
                }
                Err(e) => {
                    error!("Error processing thermal image: {:#}", e);
                    (ok, bad + 1)
                }
            },
        )
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    eprintln!("Processed {} frames ({} dropped)", written, dropped);
    Ok(())
}
