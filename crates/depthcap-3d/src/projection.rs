use depthcap_image::{Image, ImageSize};
use glam::{DMat4, DVec3};

use crate::intrinsics::Intrinsics;

/// An error type for the projection module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Two grids that must be co-indexed have different sizes.
    #[error("Grid size mismatch: {0} vs {1}")]
    SizeMismatch(ImageSize, ImageSize),

    /// The number of colors does not match the number of points.
    #[error("Got {0} colors for {1} points")]
    ColorCountMismatch(usize, usize),
}

/// Column and row index grids of the given size.
///
/// Entry `(r, c)` of the first grid holds `c`, of the second grid `r`.
pub fn pixel_grid(size: ImageSize) -> (Image<f64, 1>, Image<f64, 1>) {
    let col = Image::from_fn(size, |_, c, _| c as f64);
    let row = Image::from_fn(size, |r, _, _| r as f64);
    (col, row)
}

/// Project a depth grid to a grid of 3D points.
///
/// For every pixel the normalized image coordinates are
/// `xp = (col - princ_pt_u) / foc_len` and `yp = (row - princ_pt_v) / (foc_len * aspect_r)`,
/// the metric range is `z = depth * scale_c + offset_c` and the point is
/// `(xp * z, yp * z, z)`.
///
/// When a `transform` is given, each point is multiplied as `(x, y, z, 1)` and the
/// first three components are kept. No pixels are discarded.
///
/// # Arguments
///
/// * `col` - The column index grid.
/// * `row` - The row index grid.
/// * `depth` - The raw range grid.
/// * `k` - The intrinsics of the range component.
/// * `transform` - Optional homogeneous transform, e.g. a camera-to-world pose.
///
/// # Returns
///
/// A grid of the same size as `depth` holding `x, y, z` per pixel.
///
/// # Example
///
/// ```
/// use depthcap_3d::intrinsics::Intrinsics;
/// use depthcap_3d::projection::{depth_to_points, pixel_grid};
/// use depthcap_image::{Image, ImageSize};
///
/// let size = ImageSize { width: 4, height: 3 };
/// let (col, row) = pixel_grid(size);
/// let depth = Image::<f64, 1>::from_size_val(size, 500.0);
/// let points = depth_to_points(&col, &row, &depth, &Intrinsics::default(), None).unwrap();
/// assert_eq!(points.size(), size);
/// assert_eq!(points.as_slice()[2], 500.0);
/// ```
pub fn depth_to_points(
    col: &Image<f64, 1>,
    row: &Image<f64, 1>,
    depth: &Image<f64, 1>,
    k: &Intrinsics,
    transform: Option<&DMat4>,
) -> Result<Image<f64, 3>, ProjectionError> {
    for grid in [col, row] {
        if grid.size() != depth.size() {
            return Err(ProjectionError::SizeMismatch(grid.size(), depth.size()));
        }
    }

    let fy = k.foc_len * k.aspect_r;
    let mut points = Image::from_size_val(depth.size(), 0.0);

    points
        .as_slice_mut()
        .chunks_exact_mut(3)
        .zip(col.as_slice().iter().zip(row.as_slice()))
        .zip(depth.as_slice())
        .for_each(|((point, (&u, &v)), &d)| {
            let xp = (u - k.princ_pt_u) / k.foc_len;
            let yp = (v - k.princ_pt_v) / fy;
            let z = d * k.scale_c + k.offset_c;
            let mut p = DVec3::new(xp * z, yp * z, z);
            if let Some(m) = transform {
                p = (*m * p.extend(1.0)).truncate();
            }
            point.copy_from_slice(&p.to_array());
        });

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single(u: f64, v: f64, d: f64) -> [Image<f64, 1>; 3] {
        let size = ImageSize {
            width: 1,
            height: 1,
        };
        [
            Image::from_size_val(size, u),
            Image::from_size_val(size, v),
            Image::from_size_val(size, d),
        ]
    }

    #[test]
    fn test_single_pixel() -> Result<(), ProjectionError> {
        let [col, row, depth] = single(517.0, 290.0, 1000.0);
        let points = depth_to_points(&col, &row, &depth, &Intrinsics::default(), None)?;
        let p = points.as_slice();
        assert_relative_eq!(p[0], (517.0 - 516.90) / 216.31 * 1000.0, epsilon = 1e-9);
        assert_relative_eq!(p[0], 0.4623, epsilon = 1e-4);
        assert_relative_eq!(p[1], (290.0 - 290.54) / 216.31 * 1000.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], -2.496, epsilon = 1e-3);
        assert_relative_eq!(p[2], 1000.0);
        Ok(())
    }

    #[test]
    fn test_zero_depth() -> Result<(), ProjectionError> {
        let size = ImageSize {
            width: 5,
            height: 4,
        };
        let k = Intrinsics {
            princ_pt_u: 2.0,
            princ_pt_v: 1.0,
            foc_len: 3.0,
            ..Default::default()
        };
        let (col, row) = pixel_grid(size);
        let depth = Image::from_size_val(size, 0.0);
        let points = depth_to_points(&col, &row, &depth, &k, None)?;
        assert!(points.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn test_principal_point_maps_to_axis() -> Result<(), ProjectionError> {
        let size = ImageSize {
            width: 5,
            height: 4,
        };
        let k = Intrinsics {
            princ_pt_u: 2.0,
            princ_pt_v: 1.0,
            foc_len: 3.0,
            aspect_r: 2.0,
            scale_c: 0.5,
            offset_c: 10.0,
        };
        let (col, row) = pixel_grid(size);
        let depth = Image::from_fn(size, |r, c, _| (r * 7 + c) as f64);
        let points = depth_to_points(&col, &row, &depth, &k, None)?;
        for r in 0..size.height {
            for c in 0..size.width {
                let z = depth.as_slice()[r * size.width + c] * 0.5 + 10.0;
                assert_eq!(points.get([r, c, 2]), Some(&z));
                if c == 2 {
                    assert_eq!(points.get([r, c, 0]), Some(&0.0));
                }
                if r == 1 {
                    assert_eq!(points.get([r, c, 1]), Some(&0.0));
                }
            }
        }
        let y = points.get([3, 0, 1]).copied().unwrap_or_default();
        assert_relative_eq!(y, (3.0 - 1.0) / 6.0 * (21.0 * 0.5 + 10.0));
        Ok(())
    }

    #[test]
    fn test_identity_transform() -> Result<(), ProjectionError> {
        let size = ImageSize {
            width: 6,
            height: 3,
        };
        let (col, row) = pixel_grid(size);
        let depth = Image::from_fn(size, |r, c, _| 100.0 + (r * size.width + c) as f64);
        let k = Intrinsics::default();
        let plain = depth_to_points(&col, &row, &depth, &k, None)?;
        let moved = depth_to_points(&col, &row, &depth, &k, Some(&DMat4::IDENTITY))?;
        assert_eq!(plain.size(), moved.size());
        for (a, b) in plain.as_slice().iter().zip(moved.as_slice()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_translation() -> Result<(), ProjectionError> {
        let [col, row, depth] = single(516.90, 290.54, 250.0);
        let m = DMat4::from_translation(DVec3::new(1.0, -2.0, 3.0));
        let points = depth_to_points(&col, &row, &depth, &Intrinsics::default(), Some(&m))?;
        let p = points.as_slice();
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], -2.0, epsilon = 1e-9);
        assert_relative_eq!(p[2], 253.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_size_mismatch() {
        let (col, row) = pixel_grid(ImageSize {
            width: 2,
            height: 2,
        });
        let depth = Image::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            1.0,
        );
        let err = depth_to_points(&col, &row, &depth, &Intrinsics::default(), None);
        assert!(matches!(err, Err(ProjectionError::SizeMismatch(_, _))));
    }
}
