use crate::parallel;
use depthcap_image::{Image, ImageError};

// channel positions of red, green and blue in the destination pixel
const RGB_ORDER: [usize; 3] = [0, 1, 2];
const BGR_ORDER: [usize; 3] = [2, 1, 0];

/// Demosaic an RGGB Bayer image into an RGB image with edge-aware interpolation.
///
/// The mosaic is expected to start with a red sample at `(0, 0)`:
///
/// ```text
/// R G R G ...
/// G B G B ...
/// ```
///
/// Missing green samples are interpolated along the direction (horizontal or
/// vertical) with the smaller gradient, missing red/blue samples at blue/red sites
/// along the diagonal with the smaller gradient. This follows the behavior of the
/// OpenCV `COLOR_BayerRG2RGB_EA` conversion family. Borders are mirrored so that
/// the color parity of the neighbors is preserved.
///
/// # Arguments
///
/// * `src` - The single channel Bayer mosaic.
/// * `dst` - The output RGB image with the same size.
///
/// # Example
///
/// ```
/// use depthcap_image::{Image, ImageSize};
/// use depthcap_imgproc::color::rgb_from_bayer_rggb;
///
/// let size = ImageSize { width: 4, height: 4 };
/// let src = Image::<u8, 1>::from_fn(size, |r, c, _| match (r % 2, c % 2) {
///     (0, 0) => 200,
///     (1, 1) => 50,
///     _ => 100,
/// });
/// let mut dst = Image::<u8, 3>::from_size_val(size, 0);
/// rgb_from_bayer_rggb(&src, &mut dst).unwrap();
/// assert_eq!(&dst.as_slice()[..3], &[200, 100, 50]);
/// ```
pub fn rgb_from_bayer_rggb(src: &Image<u8, 1>, dst: &mut Image<u8, 3>) -> Result<(), ImageError> {
    demosaic_rggb(src, dst, RGB_ORDER)
}

/// Demosaic an RGGB Bayer image into a BGR image with edge-aware interpolation.
///
/// Same algorithm as [`rgb_from_bayer_rggb`], only the output channel order differs.
pub fn bgr_from_bayer_rggb(src: &Image<u8, 1>, dst: &mut Image<u8, 3>) -> Result<(), ImageError> {
    demosaic_rggb(src, dst, BGR_ORDER)
}

#[derive(Clone, Copy, PartialEq)]
enum Site {
    Red,
    GreenOnRed,
    GreenOnBlue,
    Blue,
}

#[inline]
fn site(r: usize, c: usize) -> Site {
    match (r % 2, c % 2) {
        (0, 0) => Site::Red,
        (0, _) => Site::GreenOnRed,
        (_, 0) => Site::GreenOnBlue,
        _ => Site::Blue,
    }
}

// mirror without repeating the border sample, keeps the bayer parity
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let last = n as isize - 1;
    let mut i = i.abs();
    if i > last {
        i = 2 * last - i;
    }
    i.clamp(0, last) as usize
}

struct Mosaic<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl Mosaic<'_> {
    #[inline]
    fn at(&self, r: usize, c: usize, dr: isize, dc: isize) -> i32 {
        let rr = reflect(r as isize + dr, self.height);
        let cc = reflect(c as isize + dc, self.width);
        self.data[rr * self.width + cc] as i32
    }

    #[inline]
    fn avg2(&self, r: usize, c: usize, a: (isize, isize), b: (isize, isize)) -> i32 {
        (self.at(r, c, a.0, a.1) + self.at(r, c, b.0, b.1) + 1) / 2
    }

    #[inline]
    fn cross(&self, r: usize, c: usize) -> i32 {
        (self.at(r, c, 0, -1) + self.at(r, c, 0, 1) + self.at(r, c, -1, 0) + self.at(r, c, 1, 0) + 2)
            / 4
    }

    // green at a red or blue site
    fn green_at(&self, r: usize, c: usize) -> i32 {
        let center = 2 * self.at(r, c, 0, 0);
        let grad_h = (self.at(r, c, 0, -1) - self.at(r, c, 0, 1)).abs()
            + (center - self.at(r, c, 0, -2) - self.at(r, c, 0, 2)).abs();
        let grad_v = (self.at(r, c, -1, 0) - self.at(r, c, 1, 0)).abs()
            + (center - self.at(r, c, -2, 0) - self.at(r, c, 2, 0)).abs();

        if grad_h < grad_v {
            self.avg2(r, c, (0, -1), (0, 1))
        } else if grad_v < grad_h {
            self.avg2(r, c, (-1, 0), (1, 0))
        } else {
            self.cross(r, c)
        }
    }

    // red at a blue site or blue at a red site
    fn diagonal_at(&self, r: usize, c: usize) -> i32 {
        let grad_main = (self.at(r, c, -1, -1) - self.at(r, c, 1, 1)).abs();
        let grad_anti = (self.at(r, c, -1, 1) - self.at(r, c, 1, -1)).abs();

        if grad_main < grad_anti {
            self.avg2(r, c, (-1, -1), (1, 1))
        } else if grad_anti < grad_main {
            self.avg2(r, c, (-1, 1), (1, -1))
        } else {
            (self.at(r, c, -1, -1)
                + self.at(r, c, 1, 1)
                + self.at(r, c, -1, 1)
                + self.at(r, c, 1, -1)
                + 2)
                / 4
        }
    }

    fn rgb_at(&self, r: usize, c: usize) -> [i32; 3] {
        match site(r, c) {
            Site::Red => [self.at(r, c, 0, 0), self.green_at(r, c), self.diagonal_at(r, c)],
            Site::Blue => [self.diagonal_at(r, c), self.green_at(r, c), self.at(r, c, 0, 0)],
            Site::GreenOnRed => [
                self.avg2(r, c, (0, -1), (0, 1)),
                self.at(r, c, 0, 0),
                self.avg2(r, c, (-1, 0), (1, 0)),
            ],
            Site::GreenOnBlue => [
                self.avg2(r, c, (-1, 0), (1, 0)),
                self.at(r, c, 0, 0),
                self.avg2(r, c, (0, -1), (0, 1)),
            ],
        }
    }
}

fn demosaic_rggb(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 3>,
    order: [usize; 3],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let mosaic = Mosaic {
        data: src.as_slice(),
        width: src.cols(),
        height: src.rows(),
    };

    parallel::par_rows_mut(dst, |r, row| {
        for (c, pixel) in row.chunks_exact_mut(3).enumerate() {
            let rgb = mosaic.rgb_at(r, c);
            for (channel, value) in rgb.iter().enumerate() {
                pixel[order[channel]] = (*value).clamp(0, 255) as u8;
            }
        }
    });

    Ok(())
}
