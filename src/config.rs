use crate::client::{UreqClient, DEFAULT_TIMEOUT, USER_AGENT};
use crate::logging::LoggingOptions;
use crate::options::SearchOptions;
use anyhow::Result;
use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const ENV_PREFIX: &str = "ADRESSE_";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,
    pub main: MainConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MainConfig {
    pub logging: LoggingOptions,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Applied to every search, under options given on the command line.
    #[serde(default)]
    pub defaults: SearchOptions,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            logging: LoggingOptions::default(),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            defaults: SearchOptions::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = PathBuf::from(&Self::default_dirs().config);
        path.push("config.yml");
        path
    }

    pub fn from_default_path() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Layers the built-in defaults, the YAML file at `config_path` (if any) and `ADRESSE_`
    /// environment variables. Nested keys use `__`, e.g. `ADRESSE_DEFAULTS__LIMIT=5`.
    pub fn load(config_path: PathBuf) -> Result<Self> {
        Self::load_with_env(config_path, ENV_PREFIX)
    }

    fn load_with_env(config_path: PathBuf, env_prefix: &str) -> Result<Self> {
        let main: MainConfig = Figment::from(Serialized::defaults(MainConfig::default()))
            .merge(Yaml::file(&config_path))
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()?;
        main.defaults.validate()?;

        Ok(Self { config_path, main })
    }

    pub fn default_dirs() -> &'static DefaultDirs {
        &DEFAULT_DIRS
    }

    pub fn write_config_file(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&self.main)?;
        fs::write(&self.config_path, yaml)?;
        info!("Wrote config to {}", self.config_path.display());
        Ok(())
    }

    pub fn http_client(&self) -> UreqClient {
        UreqClient::with_settings(
            &self.main.user_agent,
            Duration::from_secs(self.main.timeout_secs),
        )
    }
}

// Without a home directory the config lives in the working directory.
static DEFAULT_DIRS: Lazy<DefaultDirs> = Lazy::new(|| {
    match choose_app_strategy(AppStrategyArgs {
        top_level_domain: "fr".to_string(),
        author: "sublipri".to_string(),
        app_name: "Adresse".to_string(),
    }) {
        Ok(strategy) => DefaultDirs {
            config: strategy.config_dir(),
        },
        Err(_) => DefaultDirs {
            config: Path::new(".").to_path_buf(),
        },
    }
});

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultDirs {
    pub config: PathBuf,
}
