use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Leitstand
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeitstandConfig {
    /// Snapshot persistence settings
    pub snapshot: SnapshotConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Path of the JSON snapshot file holding all collections
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit structured JSON logs instead of human-readable output
    pub json_logs: bool,
}

impl Default for LeitstandConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotConfig {
                path: ".leitstand/leitstand.json".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl LeitstandConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. Configuration file (leitstand.toml)
    /// 3. Environment variables (prefixed with LEITSTAND_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("leitstand.toml").exists() {
            builder = builder.add_source(File::with_name("leitstand"));
        }

        builder = builder.add_source(
            Environment::with_prefix("LEITSTAND")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<LeitstandConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = LeitstandConfig::load_env_file();
        LeitstandConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static LeitstandConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
