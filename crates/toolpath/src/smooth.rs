//! Gaussian smoothing of Z along a stroke
//!
//! Weights use the arc-length distance between points, so uneven sample
//! spacing does not skew the kernel. Only points of the same stroke
//! contribute and the weights are renormalized near the ends.

use crate::constants::SMOOTH_KERNEL_SIGMAS;
use crate::error::Result;
use crate::types::PressurePoint;

/// Smooths Z values with a Gaussian of standard deviation `radius` (mm)
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    radius: f64,
}

impl Smoother {
    /// Create a smoother. A radius of 0 leaves strokes untouched.
    pub fn new(radius: f64) -> Result<Self> {
        brushpath_config::non_negative("z_smooth_distance", radius)?;
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_identity(&self) -> bool {
        self.radius <= 0.0
    }

    /// Smooth a stroke's Z values in place
    pub fn smooth(&self, points: &mut [PressurePoint]) {
        if self.is_identity() || points.len() < 2 {
            return;
        }
        let values: Vec<f64> = points.iter().map(|p| p.z).collect();
        let distances: Vec<f64> = points.iter().map(|p| p.distance).collect();
        let smoothed = gaussian_smooth(&values, &distances, self.radius);
        for (point, z) in points.iter_mut().zip(smoothed) {
            point.z = z;
        }
    }
}

/// Gaussian-weighted average of `values` at each position
///
/// `distances` must be non-decreasing and as long as `values`; `sigma` must
/// be positive. The kernel is cut off at [`SMOOTH_KERNEL_SIGMAS`] standard
/// deviations and the window is tracked with two pointers.
pub fn gaussian_smooth(values: &[f64], distances: &[f64], sigma: f64) -> Vec<f64> {
    debug_assert_eq!(values.len(), distances.len());
    let count = values.len().min(distances.len());
    let cutoff = SMOOTH_KERNEL_SIGMAS * sigma;

    let mut smoothed = Vec::with_capacity(count);
    let mut low = 0;
    let mut high = 0;
    for i in 0..count {
        let center = distances[i];
        while distances[low] < center - cutoff {
            low += 1;
        }
        while high < count && distances[high] <= center + cutoff {
            high += 1;
        }

        let mut weighted = 0.0;
        let mut total = 0.0;
        for j in low..high {
            // Scale before squaring so tiny sigmas cannot overflow to inf * 0
            let u = (distances[j] - center) / sigma;
            let weight = (-0.5 * u * u).exp();
            weighted += weight * values[j];
            total += weight;
        }
        // The center point itself always carries weight 1
        smoothed.push(weighted / total);
    }
    smoothed
}
