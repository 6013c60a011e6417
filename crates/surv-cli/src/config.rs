/*
[INPUT]:  YAML configuration file and SURV_* environment variables
[OUTPUT]: Parsed and validated CLI configuration
[POS]:    Configuration layer - backend, storage and wallet settings
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use surv_client::auth::{DEFAULT_ISSUE_URL, DEFAULT_REDIRECT_TIMEOUT, DEFAULT_WALLET_HOST};
use surv_client::{DEFAULT_BASE_URL, LemmaConfig};

const APP_DIR: &str = "surv";
const CONFIG_FILE: &str = "config.yaml";
const STORAGE_FILE: &str = "storage.json";
const WALLET_DIR: &str = "wallet";

/// Top-level configuration for the `surv` binary
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SurvConfig {
    /// Backend root, without the `/api/v1` prefix
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Directory holding the persisted local storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    /// Directory holding the wallet key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_dir: Option<PathBuf>,
    #[serde(default)]
    pub lemma: LemmaSettings,
}

/// Wallet and credential issuance settings. The site id is always taken
/// from the backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LemmaSettings {
    #[serde(default = "default_issue_url")]
    pub issue_url: String,
    #[serde(default = "default_wallet_host")]
    pub wallet_host: String,
    #[serde(default = "default_redirect_timeout_secs")]
    pub redirect_timeout_secs: u64,
    #[serde(default)]
    pub debug: bool,
    /// Scopes granted with locally derived PPIDs
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Unlocked wallet sessions expire after this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ttl_secs: Option<u64>,
}

impl Default for SurvConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            storage_dir: None,
            wallet_dir: None,
            lemma: LemmaSettings::default(),
        }
    }
}

impl Default for LemmaSettings {
    fn default() -> Self {
        Self {
            issue_url: default_issue_url(),
            wallet_host: default_wallet_host(),
            redirect_timeout_secs: default_redirect_timeout_secs(),
            debug: false,
            scopes: default_scopes(),
            session_ttl_secs: None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_issue_url() -> String {
    DEFAULT_ISSUE_URL.to_string()
}

fn default_wallet_host() -> String {
    DEFAULT_WALLET_HOST.to_string()
}

fn default_redirect_timeout_secs() -> u64 {
    DEFAULT_REDIRECT_TIMEOUT.as_secs()
}

fn default_scopes() -> Vec<String> {
    vec!["*".to_string()]
}

/// `<config dir>/surv/config.yaml`, read when `--config` is not given
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| anyhow!("could not determine data directory"))
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl SurvConfig {
    /// Load from `path` (required when given, otherwise the default location
    /// if it exists), then apply `SURV_*` overrides such as
    /// `SURV_API_BASE_URL` or `SURV_LEMMA__ISSUE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                let path_str = path.to_str().context("config path must be valid utf-8")?;
                builder = builder.add_source(File::new(path_str, FileFormat::Yaml).required(true));
            }
            None => {
                if let Some(default) = default_config_path().and_then(|p| p.to_str().map(str::to_string)) {
                    builder = builder.add_source(File::new(&default, FileFormat::Yaml).required(false));
                }
            }
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix("SURV")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("read configuration")?
            .try_deserialize()
            .context("parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if !is_http_url(&self.api_base_url) {
            bail!("api_base_url must be an http(s) URL, got {:?}", self.api_base_url);
        }
        if !is_http_url(&self.lemma.issue_url) {
            bail!("lemma.issue_url must be an http(s) URL, got {:?}", self.lemma.issue_url);
        }
        if self.lemma.wallet_host.trim().is_empty() {
            bail!("lemma.wallet_host cannot be empty");
        }
        if self.lemma.redirect_timeout_secs == 0 {
            bail!("lemma.redirect_timeout_secs must be positive");
        }
        if self.lemma.session_ttl_secs == Some(0) {
            bail!("lemma.session_ttl_secs must be positive");
        }
        Ok(())
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        let dir = match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => data_dir()?,
        };
        Ok(dir.join(STORAGE_FILE))
    }

    pub fn wallet_dir(&self) -> Result<PathBuf> {
        match &self.wallet_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join(WALLET_DIR)),
        }
    }

    /// Adapter settings; the site id is filled in from the backend
    pub fn lemma_defaults(&self) -> LemmaConfig {
        LemmaConfig::new("")
            .with_wallet_host(&self.lemma.wallet_host)
            .with_issue_url(&self.lemma.issue_url)
            .with_redirect_timeout(Duration::from_secs(self.lemma.redirect_timeout_secs))
            .with_debug(self.lemma.debug)
    }
}

impl LemmaSettings {
    pub fn session_ttl(&self) -> Option<Duration> {
        self.session_ttl_secs.map(Duration::from_secs)
    }
}
