use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{
    DEFAULT_IMAGE_GROUP, DEFAULT_MAX_DENSE_INDEX_ENTRIES, DEFAULT_MODULE_TOKEN, MODULE_PLACEHOLDER,
    NUMBER_OF_MODULES,
};
use super::error::ConfigError;
use super::filenames::TokenNaming;

/// Structure representing the application configuration. Contains pathing and assembly information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the file of any one module (typically module 00)
    pub base_path: PathBuf,
    pub module_token: String,
    pub n_modules: usize,
    /// Group holding the image datasets, with `{module}` in place of the module number
    pub image_group: String,
    pub assemble_unusable_modules: bool,
    pub max_dense_index_entries: usize,
}

impl Default for Config {
    /// Generate a new Config object. The base path is empty/invalid
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("None"),
            module_token: String::from(DEFAULT_MODULE_TOKEN),
            n_modules: NUMBER_OF_MODULES,
            image_group: String::from(DEFAULT_IMAGE_GROUP),
            assemble_unusable_modules: false,
            max_dense_index_entries: DEFAULT_MAX_DENSE_INDEX_ENTRIES,
        }
    }
}

/// The subset of the configuration which controls how frames are indexed and assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// If false, modules flagged unusable at open are always assembled as absent
    pub assemble_unusable_modules: bool,
    pub max_dense_index_entries: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            assemble_unusable_modules: false,
            max_dense_index_entries: DEFAULT_MAX_DENSE_INDEX_ENTRIES,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields that cannot be caught by deserialization
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_modules == 0 {
            return Err(ConfigError::BadModuleCount(self.n_modules));
        }
        if !self.image_group.contains(MODULE_PLACEHOLDER) {
            return Err(ConfigError::BadImageGroup(self.image_group.clone()));
        }
        Ok(())
    }

    /// Get the image group path inside the file of a given module
    pub fn image_group_for(&self, module: usize) -> String {
        self.image_group
            .replace(MODULE_PLACEHOLDER, &module.to_string())
    }

    pub fn module_naming(&self) -> TokenNaming {
        TokenNaming::new(&self.module_token)
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            assemble_unusable_modules: self.assemble_unusable_modules,
            max_dense_index_entries: self.max_dense_index_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "base_path: /data/r0001/RAW-R0001-AGIPD00-S00000.h5\nassemble_unusable_modules: true\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.n_modules, NUMBER_OF_MODULES);
        assert_eq!(config.module_token, "AGIPD");
        assert!(config.assemble_unusable_modules);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_image_group_substitution() {
        let config = Config::default();
        assert_eq!(
            config.image_group_for(15),
            "INSTRUMENT/SPB_DET_AGIPD1M-1/DET/15CH0:xtdf/image"
        );
    }

    #[test]
    fn test_bad_image_group() {
        let config = Config {
            image_group: String::from("INSTRUMENT/image"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadImageGroup(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::read_config_file(Path::new("/definitely/not/here.yml"));
        assert!(matches!(result, Err(ConfigError::BadFilePath(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
