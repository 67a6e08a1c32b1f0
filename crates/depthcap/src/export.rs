use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use depthcap_3d::filter::InvalidDepthFilter;
use depthcap_3d::io::ply::write_ply_binary;
use depthcap_3d::pointcloud::PointCloud;
use depthcap_3d::projection::depth_to_points;
use depthcap_io::frame::formats;
use depthcap_io::imu::ImuParser;
use depthcap_io::{ComponentCount, Frame, FrameReader, ReaderConfig};
use glam::DMat4;
use rayon::prelude::*;

use crate::error::ExportError;
use crate::extract::{extract_intrinsics, frame_color, frame_depth};

/// Header line of the inertial CSV table.
pub const IMU_CSV_HEADER: &str = "accX accY accZ angX angY angZ";

/// Frame selection and filtering of an export run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    /// Number of component maps read per frame.
    pub components: ComponentCount,
    /// Number of frames skipped at the beginning of the recording.
    pub skip: usize,
    /// Number of frames converted, `0` converts all remaining frames.
    pub convert: usize,
    /// Raw range value of invalid pixels; when set those pixels are dropped.
    pub invalid_depth: Option<f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            components: ComponentCount::Recorded,
            skip: 0,
            convert: 0,
            invalid_depth: None,
        }
    }
}

impl ExportConfig {
    fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            components: self.components,
        }
    }

    fn filter(&self) -> Option<InvalidDepthFilter> {
        self.invalid_depth.map(InvalidDepthFilter::new)
    }
}

/// Outcome of a point-cloud export.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Files written, ordered by frame index.
    pub written: Vec<PathBuf>,
    /// Frames that could not be converted, with their index.
    pub failed: Vec<(usize, ExportError)>,
}

/// Convert one frame to a colored point cloud.
///
/// The frame needs a `Coord3D_C16` and a `BGR8` component of equal size. The
/// intrinsics come from the chunk metadata of the frame, see
/// [`extract_intrinsics`].
pub fn frame_to_pointcloud(
    frame: &Frame,
    transform: Option<&DMat4>,
    filter: Option<&InvalidDepthFilter>,
) -> Result<PointCloud, ExportError> {
    let grid = frame_depth(frame)?;
    let rgb = frame_color(frame)?;
    let k = extract_intrinsics(frame);
    let points = depth_to_points(&grid.col, &grid.row, &grid.depth, &k, transform)?;
    let cloud = PointCloud::from_grids(&points, Some(&rgb))?;
    match filter {
        Some(filter) => Ok(filter.apply(&grid.depth, &cloud)?),
        None => Ok(cloud),
    }
}

/// Output path of frame `index` of `recording`: `<out_dir>/<stem>_<index>.ply`.
pub fn ply_path(recording: &Path, out_dir: &Path, index: usize) -> PathBuf {
    let stem = recording
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    out_dir.join(format!("{stem}_{index}.ply"))
}

/// Convert the frames of a recording to PLY files.
///
/// Frames are selected with [`FrameReader::read_frames`] and converted in parallel.
/// The files are numbered from `0` in selection order. A frame that cannot be
/// converted is reported in the summary and does not stop the others.
pub fn export_ply(
    recording: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    transform: Option<&DMat4>,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    let recording = recording.as_ref();
    let out_dir = out_dir.as_ref();

    let mut reader = FrameReader::open_with_config(recording, config.reader_config())?;
    let frames = reader.read_frames(config.skip, config.convert)?;
    let filter = config.filter();

    let results = frames
        .par_iter()
        .enumerate()
        .map(|(index, frame)| {
            let path = ply_path(recording, out_dir, index);
            frame_to_pointcloud(frame, transform, filter.as_ref())
                .and_then(|cloud| Ok(write_ply_binary(&path, &cloud)?))
                .map(|_| path)
                .map_err(|err| (index, err))
        })
        .collect::<Vec<_>>();

    let mut summary = ExportSummary::default();
    for result in results {
        match result {
            Ok(path) => summary.written.push(path),
            Err((index, err)) => {
                log::warn!("frame {index} of {} not exported: {err}", recording.display());
                summary.failed.push((index, err));
            }
        }
    }
    log::info!(
        "{}: {} point clouds written, {} frames failed",
        recording.display(),
        summary.written.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Write the inertial samples of every `Mono8` component of a recording as a
/// space-delimited table.
///
/// Returns the number of rows written below the header.
pub fn export_imu_csv(
    recording: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: ReaderConfig,
) -> Result<usize, ExportError> {
    let mut reader = FrameReader::open_with_config(recording, config)?;
    let mut writer = BufWriter::new(File::create(output)?);
    writeln!(writer, "{IMU_CSV_HEADER}")?;

    let mut rows = 0;
    for frame in reader.frames() {
        let frame = frame?;
        for map in frame.maps() {
            if map.data_format() != Some(formats::MONO8) {
                continue;
            }
            let Some(data) = map.data() else {
                continue;
            };
            let bytes = data.to_le_bytes();
            for sample in ImuParser::new(&bytes) {
                let sample = sample?;
                let [ax, ay, az] = sample.acceleration;
                let [gx, gy, gz] = sample.angular_velocity;
                writeln!(writer, "{ax} {ay} {az} {gx} {gy} {gz}")?;
                rows += 1;
            }
        }
    }
    writer.flush()?;
    Ok(rows)
}
