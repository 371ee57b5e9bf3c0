use crate::constants::*;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditorOptions {
    pub drop_zones: DropZoneThresholds,
    pub assembly: AssemblyOptions,
    pub render: RenderOptions,
}

/// Fractions of a page's width that decide where a drop lands.
///
/// Pointer positions between `leading` and `trailing` form a dead zone
/// in which the previous drop target is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DropZoneThresholds {
    /// Below this fraction: insert before the hovered page
    pub leading: f32,
    /// Above this fraction: insert after the hovered page
    pub trailing: f32,
    /// How far into the first page the "insert at start" zone reaches
    pub first_extension: f32,
    /// Where in the last page the "insert at end" zone begins
    pub last_extension: f32,
}

impl Default for DropZoneThresholds {
    fn default() -> Self {
        Self {
            leading: LEADING_EDGE_FRACTION,
            trailing: TRAILING_EDGE_FRACTION,
            first_extension: FIRST_PAGE_EXTENSION,
            last_extension: LAST_PAGE_EXTENSION,
        }
    }
}

/// Output document settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssemblyOptions {
    /// Load encrypted sources without requiring a password
    pub ignore_encryption: bool,
    /// First component of suggested output file names
    pub filename_prefix: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            ignore_encryption: true,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

/// Rasterization scales
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderOptions {
    pub thumbnail_scale: f32,
    pub preview_scale: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            thumbnail_scale: THUMBNAIL_SCALE,
            preview_scale: PREVIEW_SCALE,
        }
    }
}

impl EditorOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ArrangeError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ArrangeError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        let zones = &self.drop_zones;
        let fractions = [
            ("leading", zones.leading),
            ("trailing", zones.trailing),
            ("first_extension", zones.first_extension),
            ("last_extension", zones.last_extension),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ArrangeError::Config(format!(
                    "Drop zone {name} must be between 0 and 1, got {value}"
                )));
            }
        }

        if zones.leading >= zones.trailing {
            return Err(ArrangeError::Config(
                "Drop zone leading edge must be smaller than trailing edge".to_string(),
            ));
        }

        if self.render.thumbnail_scale <= 0.0 || self.render.preview_scale <= 0.0 {
            return Err(ArrangeError::Config(
                "Render scales must be positive".to_string(),
            ));
        }

        if self.assembly.filename_prefix.trim().is_empty() {
            return Err(ArrangeError::Config(
                "Output filename prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
