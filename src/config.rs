//! Server configuration
//!
//! Settings come from three layers, highest precedence first: command line
//! flags (or their environment variables), an optional TOML file, defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use kubemeta_types::ImageSource;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// One configuration layer; unset fields fall through to the next layer
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub strict_namespace_mapping: Option<String>,
    pub image_source: Option<ImageSource>,
    pub context: Option<String>,
}

impl ConfigLayer {
    /// Read a layer from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fill unset fields of `self` from `lower`
    pub fn or(self, lower: ConfigLayer) -> Self {
        Self {
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
            strict_namespace_mapping: self
                .strict_namespace_mapping
                .or(lower.strict_namespace_mapping),
            image_source: self.image_source.or(lower.image_source),
            context: self.context.or(lower.context),
        }
    }

    /// Apply defaults to whatever is still unset
    pub fn finish(self) -> Settings {
        Settings {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            strict_namespace_mapping: self.strict_namespace_mapping,
            image_source: self.image_source.unwrap_or_default(),
            context: self.context,
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub strict_namespace_mapping: Option<String>,
    pub image_source: ImageSource,
    pub context: Option<String>,
}

impl Settings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ConfigLayer::default().finish();
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert_eq!(settings.image_source, ImageSource::Annotation);
        assert!(settings.strict_namespace_mapping.is_none());
    }

    #[test]
    fn test_toml_layer() {
        let layer = ConfigLayer::from_toml(
            r#"
            port = 9000
            strict_namespace_mapping = "dev.example.com:develop"
            image_source = "container"
            "#,
        )
        .unwrap();

        let settings = layer.finish();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.image_source, ImageSource::Container);
        assert_eq!(
            settings.strict_namespace_mapping.as_deref(),
            Some("dev.example.com:develop")
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ConfigLayer::from_toml("listen = \"0.0.0.0\"").is_err());
        assert!(ConfigLayer::from_toml("image_source = \"spec\"").is_err());
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let cli = ConfigLayer {
            port: Some(8080),
            ..Default::default()
        };
        let file = ConfigLayer {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            ..Default::default()
        };

        let settings = cli.or(file).finish();
        assert_eq!(settings.bind_address(), "127.0.0.1:8080");
    }
}
