//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::model::Tag;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Deadline for a whole order create/update, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Allow cross-origin requests from the rental UI
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_ms: default_request_timeout_ms(),
            cors: true,
        }
    }
}

/// Which storage backend holds the catalog and the orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Postgres,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Connection string, required for the postgres backend
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::InMemory,
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Complete configuration of the rental service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalsConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Tag name -> price multiplier
    #[serde(default = "default_adjustments")]
    pub price_adjustments: BTreeMap<String, Decimal>,

    /// Load the demo catalog and sample orders on startup
    #[serde(default)]
    pub seed_demo_data: bool,
}

impl Default for RentalsConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            price_adjustments: default_adjustments(),
            seed_demo_data: false,
        }
    }
}

impl RentalsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string(),
            },
            _ => ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            },
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// Override settings from the process environment
    ///
    /// Reads `RENTALS_BIND`, `DATABASE_URL` and `RENTALS_SEED_DEMO_DATA`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override settings from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("RENTALS_BIND") {
            self.server.bind = bind;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }

        if let Some(seed) = lookup("RENTALS_SEED_DEMO_DATA") {
            self.seed_demo_data = match seed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "RENTALS_SEED_DEMO_DATA".to_string(),
                        value: seed,
                        message: "expected true or false".to_string(),
                    });
                }
            };
        }

        Ok(())
    }

    /// Check cross-field constraints and build the price adjustments
    pub fn validate(&self) -> Result<PriceAdjustments, ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none()
        {
            return Err(ConfigError::InvalidValue {
                field: "storage.database_url".to_string(),
                value: String::new(),
                message: "required when storage.backend is postgres".to_string(),
            });
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_ms".to_string(),
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        PriceAdjustments::from_config(&self.price_adjustments)
    }
}

/// Tag -> price multiplier mapping
///
/// Built once at startup and shared read-only. Tags without an entry price at
/// a multiplier of one.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAdjustments {
    multipliers: HashMap<Tag, Decimal>,
}

impl PriceAdjustments {
    /// Empty mapping: every tag prices at its base price
    pub fn identity() -> Self {
        Self {
            multipliers: HashMap::new(),
        }
    }

    /// Set the multiplier of one tag
    pub fn with(mut self, tag: Tag, multiplier: Decimal) -> Self {
        self.multipliers.insert(tag, multiplier);
        self
    }

    /// Build from the `price_adjustments` config section
    ///
    /// Keys outside the tag set are skipped with a warning; multipliers must be
    /// strictly positive.
    pub fn from_config(raw: &BTreeMap<String, Decimal>) -> Result<Self, ConfigError> {
        let mut multipliers = HashMap::new();

        for (key, multiplier) in raw {
            let Ok(tag) = key.parse::<Tag>() else {
                tracing::warn!(tag = %key, "ignoring price adjustment for unknown tag");
                continue;
            };

            if *multiplier <= Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: format!("price_adjustments.{}", key),
                    value: multiplier.to_string(),
                    message: "multiplier must be positive".to_string(),
                });
            }

            multipliers.insert(tag, *multiplier);
        }

        Ok(Self { multipliers })
    }

    /// Multiplier for a tag, one when unmapped
    pub fn multiplier(&self, tag: Tag) -> Decimal {
        self.multipliers.get(&tag).copied().unwrap_or(Decimal::ONE)
    }
}

impl Default for PriceAdjustments {
    fn default() -> Self {
        Self::identity()
            .with(Tag::Trending, Decimal::new(135, 2))
            .with(Tag::Under, Decimal::new(5, 1))
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_adjustments() -> BTreeMap<String, Decimal> {
    BTreeMap::from([
        ("trending".to_string(), Decimal::new(135, 2)),
        ("under".to_string(), Decimal::new(5, 1)),
    ])
}
