use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

#[derive(Debug, Default)]
pub struct CliSources {
    pub metric_from_cli: bool,
    pub timeout_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            metric_from_cli: value_from_cli(matches, "metric"),
            timeout_from_cli: value_from_cli(matches, "timeout_secs"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "vq-score",
    about = "Compute objective video quality scores for reference/distorted pairs",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Quality metric to run (see --list-metrics)
    #[arg(short = 'm', long = "metric", default_value = "VMAF")]
    pub metric: String,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// JSON file listing the assets to score
    #[arg(long = "assets", value_name = "FILE", conflicts_with = "ref_path")]
    pub assets: Option<PathBuf>,

    /// Reference video of a single asset
    #[arg(long = "ref", id = "ref_path", requires_all = ["dis_path", "width", "height"])]
    pub ref_path: Option<PathBuf>,

    /// Distorted video of a single asset
    #[arg(long = "dis", id = "dis_path", requires = "ref_path")]
    pub dis_path: Option<PathBuf>,

    /// Frame width of a single asset
    #[arg(long = "width", value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Frame height of a single asset
    #[arg(long = "height", value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Pixel format of a single asset
    #[arg(long = "yuv-type", default_value = "yuv420p")]
    pub yuv_type: String,

    /// Model file overriding the metric's default model
    #[arg(long = "model", value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Pull scores of dark frames towards the top of the score range
    #[arg(long = "enable-warp")]
    pub enable_warp: bool,

    /// Directory receiving intermediate logs
    #[arg(long = "workdir", value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Timeout applied to every external program
    #[arg(
        long = "timeout",
        id = "timeout_secs",
        value_name = "SECS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Write the JSON report here instead of stdout
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the registered metrics and exit
    #[arg(long = "list-metrics")]
    pub list_metrics: bool,

    /// Delete intermediate artifacts of the assets instead of scoring them
    #[arg(long = "remove")]
    pub remove: bool,

    /// Emit logs as JSON lines
    #[arg(long = "log-json")]
    pub log_json: bool,
}
