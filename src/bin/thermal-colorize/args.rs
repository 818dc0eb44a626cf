use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_color::{arg, args_parser, opt};

pub struct Args {
    pub paths: Vec<String>,
    pub is_json: bool,
    pub output: PathBuf,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-colorize")
            .about("False-color 16-bit thermal frames into RGB PNGs.")
            .arg(
                opt!("json")
                    .short("j")
                    .takes_value(false)
                    .help("Paths are rosbridge JSON captures (default: paths are 16-bit images)"),
            )
            .arg(
                opt!("output")
                    .short("o")
                    .required(true)
                    .help("Directory to write PNGs to"),
            )
            .arg(
                arg!("paths")
                    .required(true)
                    .multiple(true)
                    .help("Image / capture paths"),
            )
            .get_matches();

        let paths = matches
            .values_of("paths")
            .unwrap()
            .map(|f| f.into())
            .collect();
        let output = value_t_or_exit!(matches, "output", PathBuf);
        let is_json = matches.is_present("json");

        Ok(Args {
            paths,
            is_json,
            output,
        })
    }
}
