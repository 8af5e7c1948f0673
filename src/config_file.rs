use crate::caption::{GenerationParams, RemoteConfig, DEFAULT_MODEL_NAME};
use crate::cli::{
    Args, CaptionArgs, CropArgs, DEFAULT_CAPTION_INPUT, DEFAULT_CAPTION_OUTPUT, DEFAULT_CROP_INPUT,
    DEFAULT_CROP_OUTPUT, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS,
};
use crate::utils::verbose_println;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file format, one optional section per tool
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub caption: Option<CaptionConfigJson>,
    pub crop: Option<CropConfigJson>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionConfigJson {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub max_new_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub continue_on_error: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropConfigJson {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub dry_run: Option<bool>,
    pub report: Option<bool>,
}

/// Fully resolved captioner settings
#[derive(Debug, Clone)]
pub struct CaptionSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub remote: RemoteConfig,
    pub params: GenerationParams,
    pub continue_on_error: bool,
}

/// Fully resolved crop settings
#[derive(Debug, Clone, PartialEq)]
pub struct CropSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub report: bool,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

impl Args {
    /// Load the `--config` file if one was given, otherwise an empty configuration
    pub fn load_config(&self) -> Result<ConfigFile> {
        match &self.config_file {
            Some(path) => {
                let config = ConfigFile::load(path)?;
                verbose_println(
                    self.verbose,
                    &format!("Loaded configuration from: {:?}", path),
                );
                Ok(config)
            }
            None => Ok(ConfigFile::default()),
        }
    }
}

impl CaptionArgs {
    /// Merge with the config file section: command line, then file, then defaults
    pub fn resolve(&self, file: Option<&CaptionConfigJson>) -> CaptionSettings {
        let file = file.cloned().unwrap_or_default();
        let defaults = GenerationParams::default();

        let input_dir = self
            .input_dir
            .clone()
            .or_else(|| file.input_path.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPTION_INPUT));
        let output_dir = self
            .output_dir
            .clone()
            .or_else(|| file.output_path.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPTION_OUTPUT));

        let temperature = self
            .temperature
            .or(file.temperature)
            .unwrap_or(defaults.temperature);

        let params = GenerationParams {
            max_new_tokens: self
                .max_new_tokens
                .or(file.max_new_tokens)
                .unwrap_or(defaults.max_new_tokens),
            do_sample: temperature > 0.0,
            temperature,
            top_p: self.top_p.or(file.top_p).unwrap_or(defaults.top_p),
            use_cache: defaults.use_cache,
        };

        let remote = RemoteConfig {
            endpoint: self
                .endpoint
                .clone()
                .or(file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: self
                .model
                .clone()
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            api_key: self.api_key.clone().or(file.api_key),
            timeout: Duration::from_secs(
                self.timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        };

        CaptionSettings {
            input_dir,
            output_dir,
            remote,
            params,
            continue_on_error: self.continue_on_error || file.continue_on_error.unwrap_or(false),
        }
    }
}

impl CropArgs {
    /// Merge with the config file section: command line, then file, then defaults
    pub fn resolve(&self, file: Option<&CropConfigJson>) -> CropSettings {
        let file = file.cloned().unwrap_or_default();

        CropSettings {
            input_dir: self
                .input_dir
                .clone()
                .or_else(|| file.input_path.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CROP_INPUT)),
            output_dir: self
                .output_dir
                .clone()
                .or_else(|| file.output_path.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CROP_OUTPUT)),
            dry_run: self.dry_run || file.dry_run.unwrap_or(false),
            report: self.report || file.report.unwrap_or(false),
        }
    }
}
