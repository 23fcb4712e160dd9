//! Configuration for the tutorial sync engine.
//!
//! Layered settings:
//! - Default values
//! - TOML configuration file (`tutorsync.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables are prefixed with `TUTORSYNC_` and use double
//! underscores to separate nested levels:
//! - `TUTORSYNC_WATCH__DEBOUNCE_MS=250` sets `watch.debounce_ms`
//! - `TUTORSYNC_FIGURES__FILENAME=figures.json` sets `figures.filename`

use std::collections::HashMap;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "tutorsync.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Watch-mode behavior.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Figures document handling.
    #[serde(default)]
    pub figures: FiguresConfig,

    /// Content metadata settings.
    #[serde(default)]
    pub content: ContentConfig,

    /// Logging levels.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// How long a path must stay quiet before it is synced, in
    /// milliseconds. Coalesces editor save bursts.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FiguresConfig {
    /// Basename of the figures document directly under the root.
    #[serde(default = "default_figures_filename")]
    pub filename: String,

    /// Directory figures assets are published into, resolved relative
    /// to the current directory when not absolute.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContentConfig {
    /// Web root prefix for per-node resource paths ("/tutorial/2/3").
    #[serde(default = "default_web_root")]
    pub web_root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level: error, warn, info, debug, trace.
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_debounce_ms() -> u64 {
    500
}
fn default_figures_filename() -> String {
    "figures.json".to_string()
}
fn default_assets_dir() -> PathBuf {
    PathBuf::from("figures")
}
fn default_web_root() -> String {
    "/tutorial".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            figures: FiguresConfig::default(),
            content: ContentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for FiguresConfig {
    fn default() -> Self {
        Self {
            filename: default_figures_filename(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            web_root: default_web_root(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Layer in environment variables with TUTORSYNC_ prefix.
            // Double underscore separates nested levels.
            .merge(
                Env::prefixed("TUTORSYNC_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.watch.debounce_ms, 500);
        assert_eq!(settings.figures.filename, "figures.json");
        assert_eq!(settings.content.web_root, "/tutorial");
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutorsync.toml");
        std::fs::write(
            &path,
            "[watch]\ndebounce_ms = 120\n\n[figures]\nfilename = \"figs.json\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.watch.debounce_ms, 120);
        assert_eq!(settings.figures.filename, "figs.json");
        // Untouched sections keep defaults.
        assert_eq!(settings.content.web_root, "/tutorial");
    }
}
