use serde::{Deserialize, Serialize};

/// Thumbnail rendering configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Bounding box width in pixels
    #[serde(default = "default_thumbnail_width")]
    pub max_width: u32,

    /// Bounding box height in pixels
    #[serde(default = "default_thumbnail_height")]
    pub max_height: u32,

    /// Lower clamp for the page-to-box scale factor, so tiny pages
    /// still rasterize at a legible size
    #[serde(default = "default_min_scale")]
    pub min_scale: f32,

    /// Rasterization happens at this multiple of the fitted scale,
    /// with a final downscale into the box
    #[serde(default = "default_oversample")]
    pub oversample: f32,
}

const fn default_thumbnail_width() -> u32 {
    180
}

const fn default_thumbnail_height() -> u32 {
    240
}

const fn default_min_scale() -> f32 {
    0.2
}

const fn default_oversample() -> f32 {
    2.0
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: default_thumbnail_width(),
            max_height: default_thumbnail_height(),
            min_scale: default_min_scale(),
            oversample: default_oversample(),
        }
    }
}

/// Image-to-page conversion configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Assumed resolution when sizing an image page, in pixels per inch
    #[serde(default = "default_dpi")]
    pub dpi: f32,
}

const fn default_dpi() -> f32 {
    300.0
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self { dpi: default_dpi() }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum rendered thumbnails held in memory
    #[serde(default = "default_thumbnail_capacity")]
    pub thumbnail_capacity: u64,

    /// Maximum opened PDF sources held in memory
    #[serde(default = "default_reader_capacity")]
    pub reader_capacity: u64,
}

const fn default_thumbnail_capacity() -> u64 {
    256
}

const fn default_reader_capacity() -> u64 {
    32
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            thumbnail_capacity: default_thumbnail_capacity(),
            reader_capacity: default_reader_capacity(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Thumbnail rendering parameters
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,

    /// Image-to-page conversion parameters
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Cache capacities
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })
    }

    /// Load from default locations (~/.config/pdf-binder/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-binder").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}
