/// Distance below which two points are the same point (mm).
pub const POINT_EPSILON: f64 = 1e-9;

/// Grid cell size for the reference color index (mm).
pub const COLOR_INDEX_CELL_SIZE: f64 = 5.0;

/// Gaussian kernel cutoff, in standard deviations.
pub const SMOOTH_KERNEL_SIGMAS: f64 = 4.0;

/// Luminance weights for R, G, B in thousandths (ITU-R BT.601: 0.299, 0.587, 0.114).
pub const LUMA_WEIGHTS: [u32; 3] = [299, 587, 114];

/// Size of a CSS pixel (mm). SVG user units default to this.
pub const MM_PER_PX: f64 = 25.4 / 96.0;

/// Maximum chord deviation when flattening reference curves (SVG user units).
pub const FLATTEN_TOLERANCE: f32 = 0.05;

/// Pressure sampled for paint that could not be parsed.
pub const FALLBACK_PRESSURE: f64 = 0.5;

/// Program name written in the G-code header.
pub const PROGRAM_NAME: &str = "brushpath";
