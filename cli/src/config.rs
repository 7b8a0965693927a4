use rebench_core::Config;

use crate::{cmd::GlobalArgs, error::CliError, util};

/// Loads `--config` (or the discovered `rebench.toml`) and lays the command
/// line arguments over it. The timeout is checked before anything touches
/// the filesystem.
pub fn from_file_and_args(args: &GlobalArgs) -> Result<Config, CliError> {
    let timeout_secs = args.timeout.as_deref().map(parse_timeout).transpose()?;

    let cfg = match &args.config {
        Some(path) => {
            fsutil::ensure_file(path)?;
            log::info!(
                "Using config {}",
                util::replace_homedir_to_tilde(path).to_string_lossy()
            );
            Config::from_toml_file(path.clone())?.with_env_vars(std::env::vars())?
        }
        None => Config::load(util::current_dir())?,
    };
    Ok(with_args(cfg, args, timeout_secs))
}

fn with_args(mut cfg: Config, args: &GlobalArgs, timeout_secs: Option<u64>) -> Config {
    let b = &mut cfg.bench;
    if let Some(secs) = timeout_secs {
        b.timeout_secs = secs;
    }
    if let Some(engine) = args.engine {
        b.engine = engine.into();
    }
    if let Some(unit) = args.time_unit {
        b.time_unit = unit.into();
    }
    if let Some(n) = args.pump_repeat {
        b.pump_repeat = n;
    }
    if args.memory {
        b.measure_memory = true;
    }
    cfg
}

/// Whole seconds, strictly positive.
pub fn parse_timeout(s: &str) -> Result<u64, CliError> {
    match s.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CliError::InvalidTimeout(s.to_owned())),
    }
}

pub fn parse_version(s: &str) -> Result<u32, CliError> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| CliError::InvalidVersion(s.to_owned()))
}
