// Configuration - pipeline settings loaded from file and environment
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retriever: RetrieverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    None,
    Fixed,
    Exponential,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_max_segment_days")]
    pub max_segment_days: u64,
    /// Unset means retry empty segments forever; zero is rejected.
    #[serde(default)]
    pub max_attempts: Option<NonZeroU32>,
    #[serde(default)]
    pub backoff: BackoffKind,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_segment_days: default_max_segment_days(),
            max_attempts: None,
            backoff: BackoffKind::None,
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    #[default]
    Command,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrieverConfig {
    #[serde(default)]
    pub kind: RetrieverKind,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            kind: RetrieverKind::Command,
            program: default_program(),
            args: Vec::new(),
            url: None,
            api_key: String::new(),
            artifact_dir: default_artifact_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_cache_columns")]
    pub columns: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            columns: default_cache_columns(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ResampleConfig {
    #[serde(default = "default_fine_interval_minutes")]
    pub fine_interval_minutes: u32,
    /// Widest interior gap, in fine steps, that interpolation may bridge.
    #[serde(default = "default_max_fill_gap")]
    pub max_fill_gap: u32,
    #[serde(default = "default_coarse_interval_hours")]
    pub coarse_interval_hours: u32,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            fine_interval_minutes: default_fine_interval_minutes(),
            max_fill_gap: default_max_fill_gap(),
            coarse_interval_hours: default_coarse_interval_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeriesConfig {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub path: PathBuf,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    pub value_column: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub trim: Option<TrimConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TrimConfig {
    pub max_step: f64,
    #[serde(default = "default_trim_window")]
    pub window: usize,
}

fn default_max_segment_days() -> u64 {
    10
}

fn default_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    16_000
}

fn default_program() -> String {
    "station-weather".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("weather-data-cache.csv")
}

fn default_cache_columns() -> Vec<String> {
    vec![
        "temp".to_string(),
        "pressure".to_string(),
        "abs_pressure".to_string(),
    ]
}

fn default_fine_interval_minutes() -> u32 {
    1
}

fn default_max_fill_gap() -> u32 {
    20
}

fn default_coarse_interval_hours() -> u32 {
    1
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_time_column() -> String {
    "timestamp".to_string()
}

fn default_scale() -> f64 {
    1.0
}

fn default_trim_window() -> usize {
    10
}

/// Load configuration from `path` (any format the `config` crate
/// recognises by extension) overlaid with `LAKE_*` environment variables,
/// e.g. `LAKE_RETRIEVER__API_KEY`.
pub fn load_app_config(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("LAKE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
