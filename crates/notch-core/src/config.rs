//! YAML configuration types: a plain `serde`-derived struct with
//! `#[serde(default)]` fields, deserialized and unit-tested in the
//! same module as the type.

use std::path::PathBuf;

use serde::Deserialize;

use notch_common::path::sanitize_relative;

fn default_command_timeout() -> u64 {
    120
}

fn default_collection_timeout() -> u64 {
    1750
}

fn default_error_report_path() -> String {
    "errors.log".to_string()
}

/// One recipe entry within a named collection.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeConfig {
    pub vendor: String,
    pub ruleset: String,
    pub regexp: String,
    pub path: String,
}

/// A named collection of recipes.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    pub recipes: Vec<RecipeConfig>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub base_path: PathBuf,

    #[serde(default)]
    pub master_repo_path: Option<PathBuf>,

    #[serde(default = "default_error_report_path")]
    pub error_report_path: String,

    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,

    #[serde(default = "default_collection_timeout")]
    pub collection_timeout: u64,

    /// Caps how many devices run concurrently across all collections in
    /// one invocation — admission control standing in for the
    /// device-access client's own connection pool. `None`
    /// (the default) means unbounded.
    #[serde(default)]
    pub max_in_flight_devices: Option<usize>,

    #[serde(default)]
    pub collections: std::collections::BTreeMap<String, CollectionConfig>,
}

impl Config {
    /// Parse and validate a config document. Missing `base_path` is
    /// represented at the type level (required field); an empty
    /// `collections` map is accepted here — recipe-level validation
    /// (empty per-collection `recipes`) is the driver's job, since only
    /// it knows which named collection the CLI selected.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        let mut cfg: Self = serde_yaml::from_str(source)?;
        cfg.sanitize_paths();
        Ok(cfg)
    }

    /// Rejects `..` traversal in any recipe or error-report path,
    /// rewriting it to `"./"`.
    fn sanitize_paths(&mut self) {
        self.error_report_path = sanitize_relative(&self.error_report_path)
            .to_string_lossy()
            .into_owned();
        for collection in self.collections.values_mut() {
            for recipe in &mut collection.recipes {
                recipe.path = sanitize_relative(&recipe.path)
                    .to_string_lossy()
                    .into_owned();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let yaml = "base_path: /var/backups/rancid\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.base_path, PathBuf::from("/var/backups/rancid"));
        assert_eq!(cfg.command_timeout, 120);
        assert_eq!(cfg.collection_timeout, 1750);
        assert_eq!(cfg.error_report_path, "errors.log");
        assert!(cfg.collections.is_empty());
        assert_eq!(cfg.max_in_flight_devices, None);
    }

    #[test]
    fn parses_max_in_flight_devices_when_present() {
        let yaml = "base_path: /var/backups/rancid\nmax_in_flight_devices: 16\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.max_in_flight_devices, Some(16));
    }

    #[test]
    fn parses_full_config_with_recipes() {
        let yaml = r"
base_path: /var/backups/rancid
master_repo_path: ssh://repo.example.com/rancid
error_report_path: reports/errors.log
command_timeout: 180
collection_timeout: 900
collections:
  core:
    recipes:
      - vendor: cisco
        ruleset: cisco
        regexp: '^core-.*'
        path: cisco
";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.command_timeout, 180);
        assert_eq!(cfg.collection_timeout, 900);
        let core = &cfg.collections["core"];
        assert_eq!(core.recipes.len(), 1);
        assert_eq!(core.recipes[0].vendor, "cisco");
    }

    #[test]
    fn rejects_parent_dir_traversal_in_recipe_path() {
        let yaml = r"
base_path: /var/backups/rancid
collections:
  core:
    recipes:
      - vendor: cisco
        ruleset: cisco
        regexp: '.*'
        path: '../../etc'
";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.collections["core"].recipes[0].path, "./");
    }

    #[test]
    fn missing_base_path_fails_to_parse() {
        let yaml = "collections: {}\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}
