//! Configuration
//!
//! Layered loading via the `config` crate: built-in defaults, then an
//! optional TOML file, then `MIRROR_*` environment variables. The resulting
//! `MirrorConfig` is passed explicitly into the components that need it;
//! nothing reads ambient global state, so the same engine can run against
//! multiple configurations.

use crate::logging::LoggingConfig;
use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// Host of the mirror service.
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Scheme switch: https/wss when set, http/ws otherwise.
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,

    /// Local directory under which resources are materialized. Destructive
    /// operations must be refused while this is unset.
    #[serde(default)]
    pub sync_root: Option<PathBuf>,

    /// Bearer credential; acquisition and storage are the caller's concern.
    #[serde(default)]
    pub token: Option<SecretString>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_authority() -> String {
    "alo.se0.dev".to_string()
}

fn default_use_tls() -> bool {
    true
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            use_tls: default_use_tls(),
            sync_root: None,
            token: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl MirrorConfig {
    /// HTTP base, e.g. `https://alo.se0.dev`.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}", scheme, self.authority)
    }

    /// Duplex-stream base, e.g. `wss://alo.se0.dev`.
    pub fn ws_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}", scheme, self.authority)
    }

    /// Load configuration with precedence: env > file > defaults.
    ///
    /// With no explicit path, the platform config directory is consulted
    /// (`<config dir>/coursemirror/config.toml`, optional).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match explicit_path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()));
            }
            None => {
                if let Some(dirs) = directories::ProjectDirs::from("", "coursemirror", "coursemirror")
                {
                    let default_path = dirs.config_dir().join("config.toml");
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        builder
            .add_source(
                Environment::with_prefix("MIRROR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
