pub mod record;
pub mod run;

use std::path::PathBuf;

use clap::CommandFactory as _;
use rebench_core::{engine::EngineKind, testing::TimeUnit, Config};

use crate::{config, error::CliError, util};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    /// Path to a JSON file with regexes and input strings
    #[arg(long, value_name = "PATH", conflicts_with = "regex")]
    pub jsonfile: Option<PathBuf>,

    /// Regex to test
    #[arg(long, requires = "input")]
    pub regex: Option<String>,

    /// Input string to match with the regex
    #[arg(long, requires = "regex")]
    pub input: Option<String>,

    /// Timeout after how many seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<String>,

    /// Write results back into the JSON file under "<label_prefix><VERSION>"
    #[arg(long, value_name = "VERSION", requires = "jsonfile", conflicts_with = "json")]
    pub record: Option<String>,

    #[arg(short, long)]
    pub engine: Option<ArgEngine>,

    #[arg(long)]
    pub time_unit: Option<ArgTimeUnit>,

    /// Measure heap growth of the matching thread
    #[arg(short, long)]
    pub memory: bool,

    /// Pump repetitions for exploit strings without an example string
    #[arg(long, value_name = "N")]
    pub pump_repeat: Option<usize>,

    /// Print reports as a JSON array
    #[arg(long)]
    pub json: bool,

    /// Print a summary line to stderr after the run
    #[arg(long)]
    pub summary: bool,

    /// Use this config file instead of searching for rebench.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print an example rebench.toml and exit
    #[arg(long)]
    pub example_config: bool,

    /// -v: info, -vv: debug, -vvv: trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub type SubcmdResult = Result<(), CliError>;

impl GlobalArgs {
    pub async fn exec(&self) -> SubcmdResult {
        if self.example_config {
            print!("{}", Config::example_toml()?);
            return Ok(());
        }

        let cfg = config::from_file_and_args(self)?;

        match (&self.jsonfile, &self.regex, &self.input) {
            (Some(path), _, _) => {
                let version = self.record.as_deref().map(config::parse_version).transpose()?;
                fsutil::ensure_file(path)?;
                let interrupt = util::interrupt_on_ctrl_c();
                match version {
                    Some(version) => record::exec(path, version, &cfg, interrupt).await,
                    None => run::exec_batch(path, &cfg, self.print_options(), interrupt).await,
                }
            }
            (None, Some(regex), Some(input)) => {
                let interrupt = util::interrupt_on_ctrl_c();
                run::exec_single(regex, input, &cfg, self.print_options(), interrupt).await
            }
            _ => {
                GlobalArgs::command()
                    .print_help()
                    .map_err(anyhow::Error::from)?;
                Ok(())
            }
        }
    }

    fn print_options(&self) -> rebench_core::action::PrintOptions {
        rebench_core::action::PrintOptions {
            json: self.json,
            summary: self.summary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgEngine {
    Meta,
    Backtrack,
    PikeVm,
}

impl From<ArgEngine> for EngineKind {
    fn from(value: ArgEngine) -> Self {
        use ArgEngine::*;
        match value {
            Meta => EngineKind::Meta,
            Backtrack => EngineKind::Backtrack,
            PikeVm => EngineKind::PikeVm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgTimeUnit {
    Seconds,
    Millis,
}

impl From<ArgTimeUnit> for TimeUnit {
    fn from(value: ArgTimeUnit) -> Self {
        use ArgTimeUnit::*;
        match value {
            Seconds => TimeUnit::Seconds,
            Millis => TimeUnit::Millis,
        }
    }
}
