//! Command-line interface for gedchart
//! Lays out a genealogy record file as generation columns and prints the chart
//! in one of the registered formats.
//!
//! Usage:
//!   gedchart `<path>` [--format `<format>`] [--output `<file>`]   - Lay out and print a chart
//!   gedchart `<path>` --write-layout [--force]                 - Also write an editable layout file
//!   gedchart --list-formats                                  - List available output formats

use clap::{Arg, ArgAction, ArgMatches, Command};
use gedchart::chart::config::{ChartConfig, Loader};
use gedchart::chart::formats::{FormatError, FormatRegistry};
use gedchart::chart::overrides::WriteOutcome;
use gedchart::chart::{ChartError, ChartLoader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GEDCHART_LOG";
const LOCAL_CONFIG: &str = "gedchart.toml";

fn main() {
    let matches = Command::new("gedchart")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lay out a genealogy record file as generation columns")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the record file")
                .required_unless_present("list-formats")
                .index(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (e.g., 'columns', 'json', 'yaml')")
                .default_value("columns"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write the chart to this file instead of stdout"),
        )
        .arg(
            Arg::new("write-layout")
                .long("write-layout")
                .short('w')
                .help("Write the layout file for hand editing and use the computed layout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .help("Replace an existing layout file when writing it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("layout")
                .long("layout")
                .short('l')
                .help("Layout file to read or write (default: <FILE>.txt beside the input)"),
        )
        .arg(
            Arg::new("alignment")
                .long("alignment")
                .help("How spouse generations are aligned")
                .value_parser(["fixed-point", "single-pass"]),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log progress to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available output formats")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return;
    }

    if let Err(e) = handle_chart_command(&matches) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build, lay out and print one chart
fn handle_chart_command(matches: &ArgMatches) -> Result<(), ChartError> {
    let Some(path) = matches.get_one::<String>("path") else {
        return Ok(());
    };
    let input = PathBuf::from(path);
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("columns");

    let loader = ChartLoader::with_config(load_config(matches)?);

    // Fail on an unknown format before touching any file.
    if !loader.formats().has(format) {
        return Err(FormatError::FormatNotFound(format.to_string()).into());
    }

    let mut chart = loader.load(&input)?;
    let layout = matches
        .get_one::<String>("layout")
        .map(PathBuf::from)
        .unwrap_or_else(|| loader.layout_path(&input, &chart));

    if matches.get_flag("write-layout") {
        match loader.write_layout(&chart, &layout, matches.get_flag("force"))? {
            WriteOutcome::Written => eprintln!("Wrote layout file {}", layout.display()),
            WriteOutcome::Skipped => eprintln!(
                "Layout file {} already exists, use --force to replace it",
                layout.display()
            ),
        }
    } else {
        loader.apply_layout(&mut chart, &layout)?;
    }

    let output = loader.serialize(&chart, format)?;
    match matches.get_one::<String>("output") {
        Some(target) => write_output(Path::new(target), &output),
        None => {
            print!("{}", output);
            Ok(())
        }
    }
}

fn load_config(matches: &ArgMatches) -> Result<ChartConfig, ChartError> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(file) = matches.get_one::<String>("config") {
        loader = loader.with_file(file);
    }
    if let Some(alignment) = matches.get_one::<String>("alignment") {
        loader = loader.set_override("generations.alignment", alignment.as_str())?;
    }
    Ok(loader.build()?)
}

fn write_output(path: &Path, output: &str) -> Result<(), ChartError> {
    std::fs::write(path, output).map_err(|source| ChartError::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    let registry = FormatRegistry::with_defaults();
    println!("Available output formats:\n");
    for name in registry.list_formats() {
        if let Some(formatter) = registry.get(&name) {
            println!("  {}", name);
            println!("    {}", formatter.description());
        }
    }
}
