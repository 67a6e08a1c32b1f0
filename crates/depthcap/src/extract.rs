use depthcap_3d::intrinsics::Intrinsics;
use depthcap_3d::projection::pixel_grid;
use depthcap_image::{Image, ImageSize};
use depthcap_imgproc::color::{rgb_from_bayer_rggb, rgb_from_bgr};
use depthcap_io::frame::formats;
use depthcap_io::{ComponentMap, Frame, SampleBuffer, Value};

use crate::error::ExtractError;

/// A range component reshaped for projection.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthGrid {
    /// Column index of every pixel.
    pub col: Image<f64, 1>,
    /// Row index of every pixel.
    pub row: Image<f64, 1>,
    /// Raw range samples.
    pub depth: Image<f64, 1>,
}

/// Find the first component carrying the `format` tag.
pub fn find_component<'a>(
    maps: &'a [ComponentMap],
    format: &str,
) -> Result<&'a ComponentMap, ExtractError> {
    maps.iter()
        .find(|m| m.data_format() == Some(format))
        .ok_or_else(|| ExtractError::NotFound(format.to_string()))
}

/// Reshape a range component into a depth grid with its pixel index grids.
///
/// The grid size is the `width` x `height` of the component, whatever the
/// number of delivered rows.
pub fn extract_depth(map: &ComponentMap) -> Result<DepthGrid, ExtractError> {
    let (size, data) = component_layout(map, 1)?;
    let format = map.data_format().unwrap_or_default();
    let samples = data
        .to_f64_prefix(size.area())
        .ok_or_else(|| short_data(format, data.len(), size.area()))?;
    let depth = Image::new(size, samples)?;
    let (col, row) = pixel_grid(size);
    Ok(DepthGrid { col, row, depth })
}

/// Reshape a BGR component into an RGB image.
///
/// The returned image owns its pixels.
pub fn extract_color(map: &ComponentMap) -> Result<Image<u8, 3>, ExtractError> {
    let (size, bytes) = component_bytes(map, 3)?;
    let bgr = Image::<u8, 3>::new(size, bytes.to_vec())?;
    let mut rgb = Image::from_size_val(size, 0u8);
    rgb_from_bgr(&bgr, &mut rgb)?;
    Ok(rgb)
}

/// Demosaic an RGGB Bayer component into an RGB image.
pub fn extract_bayer(map: &ComponentMap) -> Result<Image<u8, 3>, ExtractError> {
    let (size, bytes) = component_bytes(map, 1)?;
    let bayer = Image::<u8, 1>::new(size, bytes.to_vec())?;
    let mut rgb = Image::from_size_val(size, 0u8);
    rgb_from_bayer_rggb(&bayer, &mut rgb)?;
    Ok(rgb)
}

/// Read the intrinsics from the chunk metadata of a frame.
///
/// Unless all calibration fields are present the default intrinsics are returned and
/// a warning is logged.
pub fn extract_intrinsics(frame: &Frame) -> Intrinsics {
    Intrinsics::from_lookup_or_default(|key| frame.get(key).and_then(Value::as_f64))
}

/// Find and reshape the range component of a frame.
pub fn frame_depth(frame: &Frame) -> Result<DepthGrid, ExtractError> {
    extract_depth(find_component(frame.maps(), formats::COORD3D_C16)?)
}

/// Find and convert the color component of a frame.
pub fn frame_color(frame: &Frame) -> Result<Image<u8, 3>, ExtractError> {
    extract_color(find_component(frame.maps(), formats::BGR8)?)
}

fn component_layout(
    map: &ComponentMap,
    channels: usize,
) -> Result<(ImageSize, &SampleBuffer), ExtractError> {
    let format = map.data_format().unwrap_or_default();
    let missing = |field| ExtractError::MissingField {
        format: format.to_string(),
        field,
    };
    let width = map.width().ok_or_else(|| missing("width"))?;
    let height = map.height().ok_or_else(|| missing("height"))?;
    let data = map.data().ok_or_else(|| missing("data"))?;
    let size = ImageSize { width, height };
    let required = size.area() * channels;
    if data.len() < required {
        return Err(short_data(format, data.len(), required));
    }
    Ok((size, data))
}

fn component_bytes(
    map: &ComponentMap,
    channels: usize,
) -> Result<(ImageSize, &[u8]), ExtractError> {
    let (size, data) = component_layout(map, channels)?;
    let bytes = data.as_u8().ok_or_else(|| ExtractError::SampleType {
        format: map.data_format().unwrap_or_default().to_string(),
        item_size: data.item_size(),
    })?;
    Ok((size, &bytes[..size.area() * channels]))
}

fn short_data(format: &str, available: usize, required: usize) -> ExtractError {
    ExtractError::ShortData {
        format: format.to_string(),
        available,
        required,
    }
}
