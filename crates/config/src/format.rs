use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// On-disk document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from `path`. Files without an extension are TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    pub fn parse<T: DeserializeOwned>(self, raw: &str, path: &Path) -> Result<T> {
        match self {
            Self::Toml => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
            Self::Yaml => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
            Self::Json => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        }
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(Error::serialize),
            Self::Yaml => serde_yaml::to_string(value).map_err(Error::serialize),
            Self::Json => {
                let mut out = serde_json::to_string_pretty(value).map_err(Error::serialize)?;
                out.push('\n');
                Ok(out)
            },
        }
    }
}
