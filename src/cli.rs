use clap::ArgMatches;
use anyhow::{anyhow, Result};

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub input_file: String,
    pub input_kind: InputKind,
    pub output_file: Option<String>,
    pub output_format: OutputFormat,
    pub snapshot_file: Option<String>,
    pub check_only: bool,
    pub verbose_level: u8,
}

/// How the input file is read
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// Line-oriented circuit script
    Script,
    /// JSON snapshot of a saved circuit
    Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl CliArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input_file = matches
            .get_one::<String>("input")
            .ok_or_else(|| anyhow!("Input file is required"))?
            .clone();

        let input_kind = if input_file.to_lowercase().ends_with(".json") {
            InputKind::Snapshot
        } else {
            InputKind::Script
        };

        let output_file = matches.get_one::<String>("output").cloned();
        let snapshot_file = matches.get_one::<String>("snapshot").cloned();
        let check_only = matches.get_flag("check");
        let verbose_level = matches.get_count("verbose");

        let output_format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("csv") | None => OutputFormat::Csv,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(anyhow!("Invalid output format: {}", other)),
        };

        Ok(CliArgs {
            input_file,
            input_kind,
            output_file,
            output_format,
            snapshot_file,
            check_only,
            verbose_level,
        })
    }
}

/// Log level for a number of `-v` flags
pub fn log_level(verbose_level: u8) -> log::LevelFilter {
    match verbose_level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
