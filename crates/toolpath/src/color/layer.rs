use glam::DVec2;

use crate::error::{Result, ToolpathError};
use crate::types::ColorSample;

use super::ColorSampler;

/// Sampler backed only by layer colors.
///
/// Used for position and layer-color runs; spatial queries fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerColorSampler;

impl ColorSampler for LayerColorSampler {
    fn spatial_color(&self, _point: DVec2) -> Result<ColorSample> {
        Err(ToolpathError::ReferenceUnavailable(
            "no reference document loaded".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Layer, Rgb};

    #[test]
    fn test_layer_color_luminance() {
        let sampler = LayerColorSampler;
        let gray = Layer::new(0).with_color(Rgb::new(128, 128, 128));
        let sample = sampler.layer_color(&gray);
        assert!((sample.value() - (1.0 - 128.0 / 255.0)).abs() < 1e-9);

        // Unset color presses like black
        assert_eq!(sampler.layer_color(&Layer::new(1)).value(), 1.0);
    }

    #[test]
    fn test_spatial_query_unavailable() {
        let result = LayerColorSampler.spatial_color(DVec2::ZERO);
        assert!(matches!(result, Err(ToolpathError::ReferenceUnavailable(_))));
    }
}
