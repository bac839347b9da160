use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "folio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Seconds each page stays on screen during a slideshow
    #[serde(default = "default_slideshow_interval")]
    pub slideshow_interval_secs: u64,

    #[serde(default)]
    pub auto_start_slideshow: bool,

    /// Minimum horizontal travel, in pixels, for a drag to count as a swipe
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold_px: f32,

    #[serde(default = "default_render_workers")]
    pub render_workers: usize,

    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,

    #[serde(default = "default_prefetch_radius")]
    pub prefetch_radius: usize,

    /// Upper bound for viewport tier × pixel ratio
    #[serde(default = "default_max_render_scale")]
    pub max_render_scale: f32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_slideshow_interval() -> u64 {
    5
}

fn default_swipe_threshold() -> f32 {
    50.0
}

fn default_render_workers() -> usize {
    2
}

fn default_render_timeout() -> u64 {
    30
}

fn default_prefetch_radius() -> usize {
    1
}

fn default_max_render_scale() -> f32 {
    6.0
}

fn default_jpeg_quality() -> u8 {
    95
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            slideshow_interval_secs: default_slideshow_interval(),
            auto_start_slideshow: false,
            swipe_threshold_px: default_swipe_threshold(),
            render_workers: default_render_workers(),
            render_timeout_secs: default_render_timeout(),
            prefetch_radius: default_prefetch_radius(),
            max_render_scale: default_max_render_scale(),
            jpeg_quality: default_jpeg_quality(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Parsed log level, falling back to `Info` for unknown names
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the user config directory, creating the file with
/// defaults when it does not exist yet
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Load settings from an explicit file. Parse errors keep the current settings.
pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let body = match serde_yaml::to_string(settings) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialise settings: {e}");
            return;
        }
    };

    match fs::write(path, format!("{SETTINGS_HEADER}{body}")) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r"# folio viewer settings
# slideshow_interval_secs: seconds per page while the slideshow runs
# max_render_scale: cap on viewport tier x device pixel ratio
# log_level: off | error | warn | info | debug | trace
";

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn update_settings(update: impl FnOnce(&mut Settings)) {
    if let Ok(mut settings) = SETTINGS.write() {
        update(&mut settings);
    }
}
