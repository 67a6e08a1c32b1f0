use depthcap_image::{Image, ImageSize};
use glam::DVec3;

use crate::projection::ProjectionError;

/// A point cloud with points and optional per-point colors.
///
/// Clouds built from grids are organized: they remember the grid size, and point
/// `r * width + c` belongs to pixel `(r, c)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points.
    colors: Option<Vec<[u8; 3]>>,
    // The grid the points were projected from.
    size: Option<ImageSize>,
}

impl PointCloud {
    /// Create a new unorganized point cloud from points and colors (optional).
    pub fn new(
        points: Vec<[f64; 3]>,
        colors: Option<Vec<[u8; 3]>>,
    ) -> Result<Self, ProjectionError> {
        if let Some(colors) = &colors {
            if colors.len() != points.len() {
                return Err(ProjectionError::ColorCountMismatch(
                    colors.len(),
                    points.len(),
                ));
            }
        }
        Ok(Self {
            points,
            colors,
            size: None,
        })
    }

    /// Create an organized point cloud from a point grid and a co-indexed color grid.
    pub fn from_grids(
        points: &Image<f64, 3>,
        colors: Option<&Image<u8, 3>>,
    ) -> Result<Self, ProjectionError> {
        let colors = match colors {
            Some(colors) if colors.size() != points.size() => {
                return Err(ProjectionError::SizeMismatch(colors.size(), points.size()));
            }
            Some(colors) => Some(
                colors
                    .as_slice()
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect(),
            ),
            None => None,
        };
        Ok(Self {
            points: points
                .as_slice()
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            colors,
            size: Some(points.size()),
        })
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    /// The grid size of an organized cloud.
    pub fn size(&self) -> Option<ImageSize> {
        self.size
    }

    /// Keep the points for which `keep(index)` holds.
    ///
    /// The result is no longer organized.
    pub fn retain_indices(&self, keep: impl Fn(usize) -> bool) -> Self {
        let indices = (0..self.len()).filter(|&i| keep(i)).collect::<Vec<_>>();
        Self {
            points: indices.iter().map(|&i| self.points[i]).collect(),
            colors: self
                .colors
                .as_ref()
                .map(|colors| indices.iter().map(|&i| colors[i]).collect()),
            size: None,
        }
    }

    /// Get the minimum bound of the point cloud.
    pub fn get_min_bound(&self) -> DVec3 {
        self.fold_bound(DVec3::min)
    }

    /// Get the maximum bound of the point cloud.
    pub fn get_max_bound(&self) -> DVec3 {
        self.fold_bound(DVec3::max)
    }

    fn fold_bound(&self, f: impl Fn(DVec3, DVec3) -> DVec3) -> DVec3 {
        let mut points = self.points.iter().map(|p| DVec3::from_array(*p));
        match points.next() {
            Some(first) => points.fold(first, f),
            None => DVec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointcloud() -> Result<(), ProjectionError> {
        let pointcloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, -2.0, 0.5]],
            Some(vec![[255, 0, 0], [0, 255, 0]]),
        )?;

        assert_eq!(pointcloud.len(), 2);
        assert_eq!(pointcloud.size(), None);
        assert_eq!(pointcloud.colors().map(<[_]>::len), Some(2));
        assert_eq!(pointcloud.get_min_bound(), DVec3::new(0.0, -2.0, 0.0));
        assert_eq!(pointcloud.get_max_bound(), DVec3::new(1.0, 0.0, 0.5));

        let err = PointCloud::new(vec![[0.0; 3]], Some(vec![]));
        assert_eq!(err, Err(ProjectionError::ColorCountMismatch(0, 1)));
        Ok(())
    }

    #[test]
    fn test_from_grids() -> Result<(), ProjectionError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let points = Image::<f64, 3>::from_fn(size, |r, c, ch| (r * 100 + c * 10 + ch) as f64);
        let colors = Image::<u8, 3>::from_fn(size, |r, c, _| (r * 3 + c) as u8);
        let cloud = PointCloud::from_grids(&points, Some(&colors))?;

        assert_eq!(cloud.size(), Some(size));
        assert_eq!(cloud.len(), 6);
        // pixel (1, 2)
        assert_eq!(cloud.points()[5], [120.0, 121.0, 122.0]);
        assert_eq!(cloud.colors().map(|c| c[5]), Some([5, 5, 5]));

        let odd = cloud.retain_indices(|i| i % 2 == 1);
        assert_eq!(odd.len(), 3);
        assert_eq!(odd.size(), None);
        assert_eq!(odd.colors().map(|c| c[2]), Some([5, 5, 5]));
        Ok(())
    }

    #[test]
    fn test_from_grids_size_mismatch() {
        let points = Image::<f64, 3>::from_size_val([2, 2].into(), 0.0);
        let colors = Image::<u8, 3>::from_size_val([2, 1].into(), 0);
        assert!(matches!(
            PointCloud::from_grids(&points, Some(&colors)),
            Err(ProjectionError::SizeMismatch(_, _))
        ));
    }

    #[test]
    fn test_empty_bounds() -> Result<(), ProjectionError> {
        let cloud = PointCloud::new(vec![], None)?;
        assert!(cloud.is_empty());
        assert_eq!(cloud.get_min_bound(), DVec3::ZERO);
        Ok(())
    }
}
