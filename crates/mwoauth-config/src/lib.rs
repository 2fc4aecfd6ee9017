//! Configuration for the mwoauth client.
//!
//! Provides TOML-based configuration with:
//! - Consumer credentials (`[consumer]`), with the secret taken from the
//!   environment, a secret file or (discouraged) the config itself
//! - Provider endpoints (`[provider]`)
//! - HTTP client settings (`[client]`)
//! - Config file layering (user config dir + project-local `mwoauth.toml`)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, config_dir, config_path, load_config, load_config_file,
    load_config_with_options, load_explicit,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_consumer_secret};
pub use types::*;
