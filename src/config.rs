use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::builder::BuildOptions;
use crate::error::CatalogError;
use crate::segmentation::{SegmentationPolicy, SingletonGroups};

pub const DEFAULT_CONFIG_FILE: &str = "osc-build.json";

const SUPPORTED_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub catalog_title: Option<String>,
    #[serde(default)]
    pub catalog_description: Option<String>,
    #[serde(default)]
    pub root_href: Option<String>,
    #[serde(default)]
    pub pretty_print: Option<bool>,
    #[serde(default)]
    pub singleton_collections: Option<SingletonGroups>,
    #[serde(default)]
    pub copy_images: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub build: BuildOptions,
    pub root_href: Option<String>,
    pub pretty_print: bool,
    pub copy_images: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_SCHEMA_VERSION,
            build: BuildOptions::default(),
            root_href: None,
            pretty_print: true,
            copy_images: true,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `osc-build.json` in the working directory when no
    /// path is given. Only an explicitly named file has to exist.
    pub fn resolve(path: Option<&Utf8Path>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if !config_path.as_std_path().exists() {
            if path.is_some() {
                return Err(CatalogError::MissingConfig(config_path));
            }
            tracing::debug!(path = %config_path, "no config file, using defaults");
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %config_path, "config loaded");

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CatalogError> {
        let schema_version = config.schema_version.unwrap_or(SUPPORTED_SCHEMA_VERSION);
        if schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(CatalogError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let defaults = BuildOptions::default();
        let build = BuildOptions {
            id: config.catalog_id.unwrap_or(defaults.id),
            title: config.catalog_title.unwrap_or(defaults.title),
            description: config.catalog_description.unwrap_or(defaults.description),
            segmentation: SegmentationPolicy {
                singletons: config.singleton_collections.unwrap_or_default(),
            },
        };

        Ok(ResolvedConfig {
            schema_version,
            build,
            root_href: config.root_href.filter(|href| !href.trim().is_empty()),
            pretty_print: config.pretty_print.unwrap_or(true),
            copy_images: config.copy_images.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.build.id, "OSC-Catalog");
        assert_eq!(resolved.build.segmentation.singletons, SingletonGroups::Wrap);
        assert!(resolved.pretty_print);
        assert!(resolved.copy_images);
        assert_eq!(resolved.root_href, None);
    }
}
