//! Device policy and capabilities for the trust handler.

use serde::{Deserialize, Serialize};
use std::path::Path;

use eaptrust_core::{Result, TrustError};

/// Configuration for a [`TofuTrustHandler`](crate::TofuTrustHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Station interface the handler manages (default: wlan0).
    #[serde(default = "default_interface")]
    pub interface_name: String,

    /// Whether the device can install a server chain collected during the
    /// handshake. Without it the handler falls back to the legacy
    /// "approve without CA" flow.
    #[serde(default = "default_true")]
    pub trust_on_first_use_supported: bool,

    /// Whether enterprise networks may connect without a CA and without TOFU.
    #[serde(default)]
    pub insecure_enterprise_allowed: bool,

    /// Help page explaining CA certificate installation. Empty = no link.
    #[serde(default)]
    pub ca_cert_help_link: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            interface_name: default_interface(),
            trust_on_first_use_supported: true,
            insecure_enterprise_allowed: false,
            ca_cert_help_link: String::new(),
        }
    }
}

impl HandlerConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| TrustError::io(path.display().to_string(), e))?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| TrustError::Config(e.to_string()))?;
        if config.interface_name.is_empty() {
            return Err(TrustError::Config("interface_name must not be empty".into()));
        }
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TrustError::Config(e.to_string()))
    }

    /// The help link, if one is configured
    #[must_use]
    pub fn help_link(&self) -> Option<&str> {
        Some(self.ca_cert_help_link.as_str()).filter(|l| !l.is_empty())
    }
}

fn default_interface() -> String {
    String::from("wlan0")
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = HandlerConfig::default();
        assert_eq!(config.interface_name, "wlan0");
        assert!(config.trust_on_first_use_supported);
        assert!(!config.insecure_enterprise_allowed);
        assert!(config.help_link().is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = HandlerConfig::from_toml("insecure_enterprise_allowed = true\n").unwrap();
        assert!(config.insecure_enterprise_allowed);
        assert!(config.trust_on_first_use_supported);
        assert_eq!(config.interface_name, "wlan0");
    }

    #[test]
    fn test_rejects_empty_interface() {
        assert!(HandlerConfig::from_toml("interface_name = \"\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            "interface_name = \"wlan1\"\ntrust_on_first_use_supported = false\nca_cert_help_link = \"https://help.example.com/ca\"\n"
        )
        .unwrap();
        tmp.flush().unwrap();

        let config = HandlerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.interface_name, "wlan1");
        assert!(!config.trust_on_first_use_supported);
        assert_eq!(config.help_link(), Some("https://help.example.com/ca"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HandlerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = HandlerConfig {
            insecure_enterprise_allowed: true,
            ..HandlerConfig::default()
        };
        let parsed = HandlerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
