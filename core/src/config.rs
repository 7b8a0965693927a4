use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::{ensure, Context as _};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::engine::EngineKind;
use crate::testing::{CaseRunner, TimeUnit};

pub const APP_NAME: &str = "rebench";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub bench: BenchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub timeout_secs: u64,
    pub time_unit: TimeUnit,
    pub measure_memory: bool,
    pub pump_repeat: usize,
    pub engine: EngineKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub label_prefix: String,
    pub pretty: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            time_unit: TimeUnit::default(),
            measure_memory: false,
            pump_repeat: CaseRunner::DEFAULT_PUMP_REPEAT,
            engine: EngineKind::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            label_prefix: "v".to_owned(),
            pretty: true,
        }
    }
}

/// `REBENCH_*` environment variables overriding `[bench]`.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    timeout_secs: Option<u64>,
    time_unit: Option<TimeUnit>,
    measure_memory: Option<bool>,
    pump_repeat: Option<usize>,
    engine: Option<EngineKind>,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "rebench.toml";
    const ENV_PREFIX: &str = "REBENCH_";

    pub fn example_toml() -> anyhow::Result<String> {
        let file = Asset::get(Self::FILENAME).context("Example config is not embedded")?;
        let s = std::str::from_utf8(file.data.as_ref()).context("Example config is not UTF-8")?;
        Ok(s.to_owned())
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Finds the config file in `cur_dir` or its ancestors, then in the
    /// user's config dir.
    pub fn find_file(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        fsutil::find_file_in_ancestors(cur_dir, Self::FILENAME).or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join(APP_NAME).join(Self::FILENAME))
                .filter(|path| path.is_file())
        })
    }

    /// Loads the config file if there is one, else the defaults, then applies
    /// `REBENCH_*` environment overrides.
    pub fn load(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let cfg = match Self::find_file(cur_dir) {
            Some(path) => {
                log::info!("Using config {}", path.to_string_lossy());
                Self::from_toml_file(path)?
            }
            None => {
                log::debug!("No {} found; using defaults", Self::FILENAME);
                Self::default()
            }
        };
        cfg.with_env_vars(std::env::vars())
    }

    pub fn with_env_vars<I>(mut self, vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let o: EnvOverrides = envy::prefixed(Self::ENV_PREFIX)
            .from_iter(vars)
            .context("Invalid REBENCH_* environment variable")?;

        let b = &mut self.bench;
        if let Some(v) = o.timeout_secs {
            b.timeout_secs = v;
        }
        if let Some(v) = o.time_unit {
            b.time_unit = v;
        }
        if let Some(v) = o.measure_memory {
            b.measure_memory = v;
        }
        if let Some(v) = o.pump_repeat {
            b.pump_repeat = v;
        }
        if let Some(v) = o.engine {
            b.engine = v;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.bench.timeout_secs > 0,
            "bench.timeout_secs must be positive (given: {})",
            self.bench.timeout_secs
        );
        Ok(())
    }
}

impl BenchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
