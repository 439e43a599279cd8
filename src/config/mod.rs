mod basic;
mod providers;

pub use basic::BasicConfig;
pub use providers::{
    AntigravityConfig, AntigravityResolvedConfig, ProviderDefaults, ProvidersConfig,
    proxy_url_string,
};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration managed by Figment.
///
/// Loaded once and handed around as an immutable snapshot; nothing in the crate reads
/// configuration from ambient global state.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Provider and upstream settings (see `providers` table in config.toml).
    #[serde(default)]
    pub providers: ProvidersConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and the given TOML file when it exists.
    pub fn figment(path: &Path) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn from_optional_toml() -> Result<Self, figment::Error> {
        Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Loads configuration from an explicit TOML file (merged over defaults).
    pub fn from_toml_file(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn antigravity(&self) -> AntigravityResolvedConfig {
        self.providers.antigravity.resolve(&self.providers.defaults)
    }

    /// Provider-wide antigravity proxy override, ignoring global defaults.
    pub fn antigravity_proxy_override(&self) -> Option<&url::Url> {
        self.providers.antigravity.proxy.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[basic]
loglevel = "debug"
auth_dir = "/var/lib/auths"

[providers.defaults]
proxy = "http://127.0.0.1:1080"

[providers.antigravity]
proxy = "socks5://127.0.0.1:9050"
"#
        )
        .unwrap();

        let cfg = Config::from_toml_file(file.path()).expect("valid config");
        assert_eq!(cfg.basic.loglevel, "debug");
        assert_eq!(cfg.basic.auth_dir, Some(PathBuf::from("/var/lib/auths")));
        assert_eq!(
            cfg.antigravity().proxy.map(|u| u.to_string()),
            Some("socks5://127.0.0.1:9050".to_string())
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::from_toml_file(Path::new("/nonexistent/pollux-auth.toml"))
            .expect("defaults only");
        assert_eq!(cfg.basic.loglevel, "info");
        assert!(cfg.basic.auth_dir.is_none());
        assert!(cfg.antigravity_proxy_override().is_none());
    }

    #[test]
    fn malformed_toml_is_an_error_not_a_panic() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[basic\nloglevel = ").unwrap();
        assert!(Config::from_toml_file(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[providers.antigravity]\nbogus = 1").unwrap();
        assert!(Config::from_toml_file(file.path()).is_err());
    }

    #[test]
    fn optional_toml_falls_back_to_defaults() {
        // The crate root carries no config.toml.
        let cfg = Config::from_optional_toml().expect("defaults only");
        assert_eq!(cfg.basic.loglevel, "info");
    }
}
