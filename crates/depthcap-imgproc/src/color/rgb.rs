use crate::parallel;
use depthcap_image::{Image, ImageError};

/// Convert a BGR image to RGB by reversing the channel order.
///
/// # Arguments
///
/// * `src` - The input BGR image.
/// * `dst` - The output RGB image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use depthcap_image::{Image, ImageSize};
/// use depthcap_imgproc::color::rgb_from_bgr;
///
/// let src = Image::<u8, 3>::new(ImageSize { width: 2, height: 1 }, vec![
///     0, 1, 2, // (0, 0)
///     3, 4, 5, // (0, 1)
/// ]).unwrap();
///
/// let mut dst = Image::<u8, 3>::from_size_val(src.size(), 0);
///
/// rgb_from_bgr(&src, &mut dst).unwrap();
/// assert_eq!(dst.as_slice(), &[2, 1, 0, 5, 4, 3]);
/// ```
pub fn rgb_from_bgr<T>(src: &Image<T, 3>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    // flip only the red and blue channels, keep the green channel as is
    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = src_pixel[2];
        dst_pixel[1] = src_pixel[1];
        dst_pixel[2] = src_pixel[0];
    });

    Ok(())
}
