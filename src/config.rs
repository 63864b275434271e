use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::UrlRewriteRule;
use crate::verify::StandardRules;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub scan: ScanSettings,
    pub store: StoreConfig,
    pub issuer: UrlRewriteRule,
    pub rules: RulesConfig,
    pub verifier: VerifierConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "credscan".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Finished sessions stay readable through the status endpoint this long
    pub session_retention_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8089,
            session_retention_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub detection_interval_ms: u64,
    pub result_page: String,
    pub caller_type: String,
    pub max_fetch_hops: usize,
    pub fetch_timeout_secs: u64,
    /// Payload script replayed instead of a camera
    pub replay_path: Option<PathBuf>,
    /// Still image shown to the software decoder instead of a camera
    pub image_path: Option<PathBuf>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            detection_interval_ms: 200,
            result_page: "DisplayHcert".to_string(),
            caller_type: String::new(),
            max_fetch_hops: 3,
            fetch_timeout_secs: 10,
            replay_path: None,
            image_path: None,
        }
    }
}

impl HttpConfig {
    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.session_retention_secs)
    }
}

impl ScanSettings {
    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON settings file; `~` is expanded
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.credscan/settings.json".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn expanded_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).as_ref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub allowed_issuers: Vec<String>,
    pub clock_skew_secs: i64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            allowed_issuers: Vec::new(),
            clock_skew_secs: 300,
        }
    }
}

impl RulesConfig {
    pub fn standard_rules(&self) -> StandardRules {
        StandardRules {
            allowed_issuers: self.allowed_issuers.clone(),
            clock_skew: chrono::Duration::seconds(self.clock_skew_secs),
        }
    }
}

/// Remote verification collaborators
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// HC1 decoding service; HC1 payloads are rejected when unset
    pub hcert_endpoint: Option<String>,
    /// JWT validation service; JWT credentials stay provisional when unset
    pub jws_endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// Publish verdicts to this server when set
    pub url: Option<String>,
}

impl Config {
    /// Load `path` (any extension the `config` crate knows, optional) overlaid
    /// with `CREDSCAN__SECTION__KEY` environment variables
    ///
    /// `CREDSCAN__RULES__ALLOWED_ISSUERS` takes a comma-separated list.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CREDSCAN")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rules.allowed_issuers"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
