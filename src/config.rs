use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{GrainError, Result};
use crate::outlier_filter::FilterPolicy;
use crate::sampling::PadType;

/// Configuration for a grain measurement run
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub output_dir: String,

    /// Side length of the square crop window around each accepted grain
    #[serde(default = "default_crop_size")]
    pub crop_size: u32,

    /// Point-to-line tolerance (pixels) for boundary simplification
    #[serde(default = "default_simplify_tolerance")]
    pub simplify_tolerance: f64,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    /// Slice the crop regions out of the input image and save them
    #[serde(default)]
    pub write_samples: bool,

    /// Extra pixels added around each crop region when sampling
    #[serde(default)]
    pub sample_margin: u32,

    /// Resize and pad every sample to a square of this side
    #[serde(default)]
    pub sample_size: Option<u32>,

    /// How the border is filled when a sample is padded to `sample_size`
    #[serde(default)]
    pub sample_padding: PadType,

    /// Preprocessing and filter parameters keyed by background/material class
    pub classes: BTreeMap<String, ClassParams>,

    #[serde(default)]
    pub dataset: Vec<DatasetEntryConfig>,
}

/// Parameters for one background/material class. Every field is required.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassParams {
    /// Gaussian kernel side length (odd)
    pub blur_size: u32,
    pub blur_sigma: f32,
    /// Seed for the automatic threshold; Otsu's level takes precedence
    pub otsu_seed: u8,
    /// Low Canny threshold; the high threshold is `canny_threshold * canny_ratio`
    pub canny_threshold: f32,
    pub canny_ratio: f32,
    pub policy: FilterPolicy,
}

/// A dataset entry as written in the configuration file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatasetEntryConfig {
    pub name: String,
    pub path: PathBuf,
    pub class: String,
}

/// A dataset entry resolved against its class parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub name: String,
    pub path: PathBuf,
    pub class: String,
    pub params: ClassParams,
}

fn default_crop_size() -> u32 {
    400
}

fn default_simplify_tolerance() -> f64 {
    3.0
}

fn default_parallel() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        let mut classes = BTreeMap::new();
        classes.insert(
            "blue".to_string(),
            ClassParams {
                blur_size: 25,
                blur_sigma: 25.0,
                otsu_seed: 120,
                canny_threshold: 120.0,
                canny_ratio: 1.6,
                policy: FilterPolicy::LowerBoundOnly,
            },
        );
        classes.insert(
            "black".to_string(),
            ClassParams {
                blur_size: 3,
                blur_sigma: 3.0,
                otsu_seed: 125,
                canny_threshold: 120.0,
                canny_ratio: 1.6,
                policy: FilterPolicy::TightBand { band: 25.0 },
            },
        );

        Self {
            output_dir: "./output".to_string(),
            crop_size: default_crop_size(),
            simplify_tolerance: default_simplify_tolerance(),
            use_parallel: default_parallel(),
            write_samples: false,
            sample_margin: 0,
            sample_size: None,
            sample_padding: PadType::default(),
            classes,
            dataset: vec![
                DatasetEntryConfig {
                    name: "blue_bg".to_string(),
                    path: PathBuf::from("input/blue_bg.jpg"),
                    class: "blue".to_string(),
                },
                DatasetEntryConfig {
                    name: "black_bg".to_string(),
                    path: PathBuf::from("input/black_bg.png"),
                    class: "black".to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GrainError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            GrainError::ConfigLoad { source, .. } => GrainError::ConfigLoad {
                source,
                path: path.to_path_buf(),
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| GrainError::ConfigLoad {
            source,
            path: PathBuf::new(),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            GrainError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }

    /// Validate the run-wide settings. Classes are checked per entry by `entries()`.
    pub fn validate(&self) -> Result<()> {
        if self.crop_size == 0 {
            return Err(GrainError::Config("crop_size must be > 0".to_string()));
        }

        if self.crop_size % 2 != 0 {
            return Err(GrainError::Config(format!(
                "crop_size must be even, got {}",
                self.crop_size
            )));
        }

        if !(self.simplify_tolerance >= 0.0) {
            return Err(GrainError::Config(
                "simplify_tolerance must be >= 0.0".to_string(),
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(GrainError::Config("output_dir must not be empty".to_string()));
        }

        if self.sample_size == Some(0) {
            return Err(GrainError::Config("sample_size must be > 0".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.dataset {
            if !seen.insert(entry.name.as_str()) {
                return Err(GrainError::Config(format!(
                    "dataset entry name '{}' is used more than once",
                    entry.name
                )));
            }
        }

        Ok(())
    }

    /// Resolve one dataset entry against its class, validating the class parameters
    pub fn resolve(&self, entry: &DatasetEntryConfig) -> Result<DatasetEntry> {
        let params = self.classes.get(&entry.class).ok_or_else(|| GrainError::UnknownClass {
            entry: entry.name.clone(),
            class: entry.class.clone(),
        })?;

        params.validate().map_err(|msg| {
            GrainError::Config(format!("entry '{}', class '{}': {}", entry.name, entry.class, msg))
        })?;

        Ok(DatasetEntry {
            name: entry.name.clone(),
            path: entry.path.clone(),
            class: entry.class.clone(),
            params: params.clone(),
        })
    }

    /// Resolve every dataset entry on its own, in configuration order.
    /// A bad entry yields an error without affecting the others.
    pub fn entries(&self) -> Vec<(String, Result<DatasetEntry>)> {
        self.dataset
            .iter()
            .map(|entry| (entry.name.clone(), self.resolve(entry)))
            .collect()
    }
}

impl ClassParams {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.blur_size == 0 || self.blur_size % 2 == 0 {
            return Err(format!("blur_size must be odd and > 0, got {}", self.blur_size));
        }

        if self.blur_sigma <= 0.0 {
            return Err("blur_sigma must be > 0.0".to_string());
        }

        if self.canny_threshold <= 0.0 {
            return Err("canny_threshold must be > 0.0".to_string());
        }

        if self.canny_ratio < 1.0 {
            return Err("canny_ratio must be >= 1.0".to_string());
        }

        self.policy.validate()
    }

    /// High Canny threshold derived from the low threshold and ratio
    pub fn canny_high(&self) -> f32 {
        self.canny_threshold * self.canny_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
output_dir = "out"

[classes.black]
blur_size = 3
blur_sigma = 3.0
otsu_seed = 125
canny_threshold = 120.0
canny_ratio = 1.6
policy = { kind = "tight_band", band = 25.0 }

[classes.blue]
blur_size = 25
blur_sigma = 25.0
otsu_seed = 120
canny_threshold = 120.0
canny_ratio = 1.6
policy = { kind = "lower_bound_only" }

[[dataset]]
name = "black_bg"
path = "input/black_bg.png"
class = "black"
"#;

    #[test]
    fn parses_classes_and_defaults() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.crop_size, 400);
        assert_eq!(config.simplify_tolerance, 3.0);
        assert!(config.use_parallel);
        assert_eq!(config.classes["black"].policy, FilterPolicy::TightBand { band: 25.0 });
        assert_eq!(config.classes["blue"].policy, FilterPolicy::LowerBoundOnly);
        assert_eq!(config.classes["blue"].canny_high(), 120.0 * 1.6);
    }

    #[test]
    fn resolves_entries() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let entries = config.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "black_bg");
        let entry = entries[0].1.as_ref().unwrap();
        assert_eq!(entry.name, "black_bg");
        assert_eq!(entry.params.blur_size, 3);
    }

    #[test]
    fn unknown_class_is_config_error() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.dataset[0].class = "green".to_string();
        match config.entries().remove(0).1 {
            Err(GrainError::UnknownClass { entry, class }) => {
                assert_eq!(entry, "black_bg");
                assert_eq!(class, "green");
            }
            other => panic!("expected UnknownClass, got {:?}", other),
        }
    }

    #[test]
    fn bad_entry_does_not_hide_good_ones() {
        let mut config = Config::default();
        config.dataset[0].class = "purple".to_string();
        assert!(config.validate().is_ok());

        let entries = config.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "blue_bg");
        assert!(matches!(entries[0].1, Err(GrainError::UnknownClass { .. })));
        assert_eq!(entries[1].0, "black_bg");
        assert_eq!(entries[1].1.as_ref().unwrap().class, "black");
    }

    #[test]
    fn invalid_class_only_fails_its_entries() {
        let mut config = Config::default();
        config.classes.get_mut("blue").unwrap().blur_size = 4;
        assert!(config.validate().is_ok());

        let entries = config.entries();
        assert!(matches!(entries[0].1, Err(GrainError::Config(_))));
        assert!(entries[1].1.is_ok());
    }

    #[test]
    fn sample_settings_parse() {
        let text = format!(
            "sample_size = 224\nsample_padding = {{ kind = \"replicate\" }}\n{}",
            SAMPLE
        );
        let config = Config::from_toml_str(&text).unwrap();
        assert_eq!(config.sample_size, Some(224));
        assert_eq!(config.sample_padding, PadType::Replicate);

        let defaults = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(defaults.sample_size, None);
        assert_eq!(defaults.sample_padding, PadType::Color { color: [0, 0, 0] });
    }

    #[test]
    fn missing_policy_fails_to_load() {
        let text = SAMPLE.replace("policy = { kind = \"lower_bound_only\" }", "");
        assert!(matches!(
            Config::from_toml_str(&text),
            Err(GrainError::ConfigLoad { .. })
        ));
    }

    #[test]
    fn rejects_even_blur_kernel() {
        let mut config = Config::default();
        config.classes.get_mut("black").unwrap().blur_size = 4;
        let entry = config.dataset[1].clone();
        assert!(matches!(config.resolve(&entry), Err(GrainError::Config(_))));
    }

    #[test]
    fn rejects_zero_sample_size() {
        let mut config = Config::default();
        config.sample_size = Some(0);
        assert!(matches!(config.validate(), Err(GrainError::Config(_))));
    }

    #[test]
    fn rejects_odd_crop_size() {
        let mut config = Config::default();
        config.crop_size = 401;
        assert!(matches!(config.validate(), Err(GrainError::Config(_))));
    }

    #[test]
    fn default_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed.classes, config.classes);
        assert_eq!(parsed.dataset, config.dataset);
    }
}
