/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// REPORT CONSTANTS
// =============================================================================

/// Maximum size of an attached report image in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Content types accepted for report images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// Object-store folder for report images
pub const REPORT_IMAGE_FOLDER: &str = "reports";

/// Default heatmap grid precision (decimal places, ~1.1km cells)
pub const DEFAULT_HEATMAP_PRECISION: u32 = 2;

/// Finest heatmap grid precision allowed (~11m cells)
pub const MAX_HEATMAP_PRECISION: u32 = 4;
