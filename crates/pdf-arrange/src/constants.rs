//! Shared constants for page arrangement
//!
//! Centralizes the drop-zone thresholds, naming rules and PDF defaults
//! used across the crate.

// =============================================================================
// Drop Zones
// =============================================================================

/// Pointer within this leading fraction of a page inserts before it
pub const LEADING_EDGE_FRACTION: f32 = 0.2;

/// Pointer past this fraction of a page inserts after it
pub const TRAILING_EDGE_FRACTION: f32 = 0.8;

/// The "before first page" zone extends this far into the first page
pub const FIRST_PAGE_EXTENSION: f32 = 0.3;

/// The "after last page" zone starts this far into the last page
pub const LAST_PAGE_EXTENSION: f32 = 0.7;

// =============================================================================
// Naming
// =============================================================================

/// Longest file name shown in a slot header before it is shortened
pub const MAX_DISPLAY_NAME_CHARS: usize = 30;

/// Prefix of assembled output file names
pub const DEFAULT_FILENAME_PREFIX: &str = "edited";

// =============================================================================
// Rendering
// =============================================================================

/// Scale used for slot thumbnails
pub const THUMBNAIL_SCALE: f32 = 0.5;

/// Scale used for enlarged previews
pub const PREVIEW_SCALE: f32 = 2.0;

// =============================================================================
// PDF Defaults
// =============================================================================

/// PDF version written to assembled documents
pub const OUTPUT_PDF_VERSION: &str = "1.7";

/// Default page dimensions in points (US Letter) when a page has no MediaBox
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (612.0, 792.0);
