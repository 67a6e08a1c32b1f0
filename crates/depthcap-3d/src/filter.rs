use depthcap_image::Image;

use crate::pointcloud::PointCloud;
use crate::projection::ProjectionError;

/// Drops the points whose raw range sample equals the camera's invalid-data value.
///
/// Visionary cameras flag pixels without a measurement with a fixed range value,
/// `0` on current devices. Projection keeps those pixels; apply this filter to the
/// organized cloud afterwards to remove them.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InvalidDepthFilter {
    /// Raw range value marking an invalid pixel.
    pub invalid_value: f64,
}

impl Default for InvalidDepthFilter {
    fn default() -> Self {
        Self { invalid_value: 0.0 }
    }
}

impl InvalidDepthFilter {
    /// Create a filter for the given invalid-data value.
    pub fn new(invalid_value: f64) -> Self {
        Self { invalid_value }
    }

    /// Whether a raw range sample carries a measurement.
    #[inline]
    pub fn is_valid(&self, depth: f64) -> bool {
        depth != self.invalid_value
    }

    /// Remove the invalid pixels from a cloud projected from `depth`.
    ///
    /// # Errors
    ///
    /// Fails when the cloud is not organized with the size of `depth`.
    pub fn apply(
        &self,
        depth: &Image<f64, 1>,
        cloud: &PointCloud,
    ) -> Result<PointCloud, ProjectionError> {
        match cloud.size() {
            Some(size) if size == depth.size() => {}
            Some(size) => return Err(ProjectionError::SizeMismatch(size, depth.size())),
            None => {
                return Err(ProjectionError::SizeMismatch(
                    [cloud.len(), 1].into(),
                    depth.size(),
                ))
            }
        }
        let samples = depth.as_slice();
        let filtered = cloud.retain_indices(|i| self.is_valid(samples[i]));
        log::debug!(
            "invalid depth filter kept {} of {} points",
            filtered.len(),
            cloud.len()
        );
        Ok(filtered)
    }
}
