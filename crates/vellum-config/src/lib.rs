use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vellum_engine::{MarkerRemoval, PlatformProfile, Schema, SchemaRule, SchemaType};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// TOML-backed host configuration: serializer defaults, schema extensions
/// on top of the engine's standard table, and the platform profile for
/// selection restore.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// "markup", "text" or "render-json".
    pub format: String,
    pub replace_spaces: bool,
    pub expand_markers: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "markup".to_string(),
            replace_spaces: false,
            expand_markers: false,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub rules: Vec<SchemaRuleConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaRuleConfig {
    pub tag: String,
    /// "block", "inline", "mark" or "card".
    pub kind: String,
    pub attributes: Vec<String>,
    pub styles: Vec<String>,
}

impl Default for SchemaRuleConfig {
    fn default() -> Self {
        Self {
            tag: String::new(),
            kind: "inline".to_string(),
            attributes: Vec::new(),
            styles: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// "remove-first" or "normalize-first".
    pub marker_removal: String,
    pub resync_selection: bool,
    pub defer_resync: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            marker_removal: "remove-first".to_string(),
            resync_selection: false,
            defer_resync: false,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/vellum");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// The engine schema: the standard table extended with the configured
    /// rules. Unknown kind strings are skipped rather than failing the
    /// whole table.
    pub fn schema(&self) -> Schema {
        let mut schema = Schema::standard();
        for rule in &self.schema.rules {
            let Some(kind) = parse_schema_type(&rule.kind) else {
                continue;
            };
            schema.add_rule(
                SchemaRule::new(rule.tag.clone(), kind)
                    .with_attributes(rule.attributes.iter().cloned())
                    .with_styles(rule.styles.iter().cloned()),
            );
        }
        schema
    }

    pub fn platform_profile(&self) -> PlatformProfile {
        let marker_removal = match self.platform.marker_removal.as_str() {
            "normalize-first" => MarkerRemoval::NormalizeThenRemove,
            _ => MarkerRemoval::RemoveThenNormalize,
        };
        PlatformProfile {
            marker_removal,
            resync_selection: self.platform.resync_selection,
            defer_resync: self.platform.defer_resync,
        }
    }
}

fn parse_schema_type(kind: &str) -> Option<SchemaType> {
    match kind {
        "block" => Some(SchemaType::Block),
        "inline" => Some(SchemaType::Inline),
        "mark" => Some(SchemaType::Mark),
        "card" => Some(SchemaType::Card),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/vellum/config.toml"));
    }

    #[test]
    fn missing_config_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from_path(dir.path().join("config.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn config_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.output.format = "text".to_string();
        config.output.replace_spaces = true;
        config.platform.marker_removal = "normalize-first".to_string();
        config.schema.rules.push(SchemaRuleConfig {
            tag: "figure".to_string(),
            kind: "block".to_string(),
            attributes: vec!["data-align".to_string()],
            styles: vec!["width".to_string()],
        });
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap().expect("file exists");
        assert_eq!(loaded.output.format, "text");
        assert!(loaded.output.replace_spaces);
        assert_eq!(loaded.schema.rules.len(), 1);
        assert_eq!(loaded.schema.rules[0].tag, "figure");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = {").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn schema_extension_classifies_new_tags() {
        let mut config = Config::default();
        config.schema.rules.push(SchemaRuleConfig {
            tag: "figure".to_string(),
            kind: "block".to_string(),
            attributes: vec![],
            styles: vec![],
        });
        config.schema.rules.push(SchemaRuleConfig {
            tag: "bogus".to_string(),
            kind: "no-such-kind".to_string(),
            attributes: vec![],
            styles: vec![],
        });

        let schema = config.schema();
        assert_eq!(schema.classify("figure", &[]), Some(SchemaType::Block));
        // Standard table still present underneath.
        assert_eq!(schema.classify("p", &[]), Some(SchemaType::Block));
        // Unknown kinds are skipped.
        assert_eq!(schema.classify("bogus", &[]), None);
    }

    #[test]
    fn platform_profile_conversion() {
        let mut config = Config::default();
        config.platform.marker_removal = "normalize-first".to_string();
        config.platform.resync_selection = true;

        let profile = config.platform_profile();
        assert_eq!(profile.marker_removal, MarkerRemoval::NormalizeThenRemove);
        assert!(profile.resync_selection);
        assert!(!profile.defer_resync);
    }
}
