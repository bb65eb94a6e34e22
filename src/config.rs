use crate::parser::DEFAULT_PROGRESS_EVERY;
use crate::postprocess::EXCLUDED_TYPES;
use crate::source::DBLP_URL;
use clap::{Arg, ArgAction, ArgMatches, Command, command, value_parser};
use std::path::PathBuf;

/// Settings for turning a corpus file into the output tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub excluded_types: Vec<String>,
    /// Cell text written for absent values.
    pub null_marker: String,
    pub progress_every: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            input: PathBuf::from("dblp.xml.gz"),
            output_dir: PathBuf::from("."),
            excluded_types: EXCLUDED_TYPES.iter().map(|kind| kind.to_string()).collect(),
            null_marker: String::new(),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub url: String,
    pub output: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            url: DBLP_URL.to_string(),
            output: PathBuf::from("dblp.xml.gz"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Fetch(FetchConfig),
    Convert(ConvertConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub verbose: bool,
    pub task: Task,
}

pub fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("log debug output (RUST_LOG takes precedence)")
        )
        .subcommand(
            Command::new("fetch")
                .about("download the DBLP XML dump")
                .arg(
                    Arg::new("url")
                        .long("url")
                        .value_parser(value_parser!(String))
                        .default_value(DBLP_URL)
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("dblp.xml.gz")
                        .help("destination; the dump is decompressed unless the name ends in .gz")
                )
        )
        .subcommand(
            Command::new("convert")
                .about("convert a DBLP XML dump into publication and author tables")
                .arg(
                    Arg::new("input")
                        .value_parser(value_parser!(PathBuf))
                        .help("path to dblp.xml or dblp.xml.gz")
                        .required(true)
                )
                .arg(
                    Arg::new("out_dir")
                        .short('o')
                        .long("out-dir")
                        .value_parser(value_parser!(PathBuf))
                        .default_value(".")
                        .help("directory for publications.csv, authors.csv and authorships.csv")
                )
                .arg(
                    Arg::new("exclude")
                        .short('x')
                        .long("exclude")
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Append)
                        .help("record type to drop, replaces the default data/mastersthesis/phdthesis/www")
                )
                .arg(
                    Arg::new("null_marker")
                        .long("null-marker")
                        .value_parser(value_parser!(String))
                        .help("text written for absent values, empty by default")
                )
                .arg(
                    Arg::new("progress_every")
                        .long("progress-every")
                        .value_parser(value_parser!(u64))
                        .default_value("10000000")
                        .help("log progress after this many elements, 0 disables")
                )
        )
}

impl Config {
    /// Builds the configuration from parsed arguments. Returns `None` when
    /// no known subcommand was given.
    pub fn from_matches(matches: &ArgMatches) -> Option<Config> {
        let verbose = matches.get_flag("verbose");
        let task = match matches.subcommand()? {
            ("fetch", sub) => Task::Fetch(fetch_config(sub)),
            ("convert", sub) => Task::Convert(convert_config(sub)),
            _ => return None,
        };
        Some(Config { verbose, task })
    }
}

fn fetch_config(matches: &ArgMatches) -> FetchConfig {
    let defaults = FetchConfig::default();
    FetchConfig {
        url: matches.get_one::<String>("url").cloned().unwrap_or(defaults.url),
        output: matches.get_one::<PathBuf>("output").cloned().unwrap_or(defaults.output),
    }
}

fn convert_config(matches: &ArgMatches) -> ConvertConfig {
    let defaults = ConvertConfig::default();
    ConvertConfig {
        input: matches.get_one::<PathBuf>("input").cloned().unwrap_or(defaults.input),
        output_dir: matches.get_one::<PathBuf>("out_dir").cloned().unwrap_or(defaults.output_dir),
        excluded_types: matches
            .get_many::<String>("exclude")
            .map(|kinds| kinds.cloned().collect())
            .unwrap_or(defaults.excluded_types),
        null_marker: matches
            .get_one::<String>("null_marker")
            .cloned()
            .unwrap_or(defaults.null_marker),
        progress_every: matches
            .get_one::<u64>("progress_every")
            .copied()
            .unwrap_or(defaults.progress_every),
    }
}
