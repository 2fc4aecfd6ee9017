//! Consumer secret resolution.
//!
//! Resolution order:
//! 1. `MWOAUTH_CONSUMER_SECRET` environment variable
//! 2. `[consumer] secret_file` (contents trimmed, `~` expanded)
//! 3. `[consumer] secret` (plaintext, warned about at load time)

use std::path::{Path, PathBuf};

use crate::{ConfigError, ConsumerConfig, MwOAuthConfig, Result};

/// Environment variable holding the consumer secret.
pub const SECRET_ENV_VAR: &str = "MWOAUTH_CONSUMER_SECRET";

/// Result of secret resolution with provenance.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    pub value: String,
    pub source: SecretSource,
}

impl std::fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    EnvVar(String),
    SecretFile(PathBuf),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::SecretFile(path) => write!(f, "secret file {}", path.display()),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the consumer secret using the full resolution chain.
pub fn resolve_consumer_secret(config: &MwOAuthConfig) -> Result<ResolvedSecret> {
    let env_value = std::env::var(SECRET_ENV_VAR).ok();
    resolve_with_env(config.consumer.as_ref(), env_value)
}

fn resolve_with_env(
    consumer: Option<&ConsumerConfig>,
    env_value: Option<String>,
) -> Result<ResolvedSecret> {
    if let Some(value) = env_value
        && !value.is_empty()
    {
        return Ok(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(SECRET_ENV_VAR.to_string()),
        });
    }

    if let Some(path) = consumer.and_then(|c| c.secret_file.as_deref()) {
        let path = expand_tilde(path);
        let value = read_secret_file(&path)?;
        return Ok(ResolvedSecret {
            value,
            source: SecretSource::SecretFile(path),
        });
    }

    if let Some(value) = consumer.and_then(|c| c.secret.clone())
        && !value.is_empty()
    {
        return Ok(ResolvedSecret {
            value,
            source: SecretSource::ConfigFile,
        });
    }

    Err(ConfigError::MissingField {
        field: "secret".to_string(),
        context: format!("[consumer] (or set {} / secret_file)", SECRET_ENV_VAR),
    })
}

fn read_secret_file(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::SecretFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let secret = contents.trim();
    if secret.is_empty() {
        return Err(ConfigError::SecretFile {
            path: path.display().to_string(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(secret.to_string())
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
