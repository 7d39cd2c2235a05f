use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use log::{error, info};
use std::io;
use std::path::Path;

use elecnet::cli::{self, CliArgs, InputKind};
use elecnet::{Circuit, NetlistExporter, ScriptParser};

fn main() {
    let matches = create_cli().get_matches();

    env_logger::Builder::new()
        .filter_level(cli::log_level(matches.get_count("verbose")))
        .parse_default_env()
        .init();

    if let Err(e) = run_application(&matches) {
        error!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn create_cli() -> Command {
    Command::new("elecnet")
        .version(elecnet::VERSION)
        .about(elecnet::DESCRIPTION)
        .arg(
            Arg::new("input")
                .help("Circuit script, or a JSON snapshot (.json)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the netlist to FILE instead of stdout"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value("csv")
                .value_parser(["csv", "json"])
                .help("Netlist format"),
        )
        .arg(
            Arg::new("snapshot")
                .long("snapshot")
                .value_name("FILE")
                .help("Save the compiled circuit as a JSON snapshot"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Only compile, do not emit a netlist"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase verbosity level"),
        )
}

fn run_application(matches: &ArgMatches) -> anyhow::Result<()> {
    let args = CliArgs::from_matches(matches)?;

    info!("Input file: {}", args.input_file.bright_blue());

    if !Path::new(&args.input_file).exists() {
        return Err(anyhow::anyhow!("Input file '{}' not found", args.input_file));
    }

    let mut circuit = match args.input_kind {
        InputKind::Script => ScriptParser::new().parse_file(&args.input_file)?.build()?,
        InputKind::Snapshot => Circuit::load_json(&args.input_file)?,
    };

    if let Err(errors) = circuit.compile() {
        for e in &errors {
            eprintln!("{} {}", "error:".red().bold(), e);
        }
        return Err(anyhow::anyhow!("compile failed with {} problem(s)", errors.len()));
    }
    eprintln!("{}", circuit.summary().to_string().green());

    if let Some(snapshot_file) = &args.snapshot_file {
        circuit.save_json(snapshot_file)?;
    }

    if args.check_only {
        return Ok(());
    }

    let records = circuit.get_netlist()?;
    match &args.output_file {
        Some(output_file) => {
            NetlistExporter::export_to_file(&records, output_file, &args.output_format)?;
            info!("Netlist written to: {}", output_file.bright_green());
        }
        None => match args.output_format {
            cli::OutputFormat::Csv => NetlistExporter::write_csv(&records, io::stdout())?,
            cli::OutputFormat::Json => NetlistExporter::write_json(&records, io::stdout())?,
        },
    }

    Ok(())
}
