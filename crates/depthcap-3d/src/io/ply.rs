use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use bincode::config::Config;

use crate::pointcloud::PointCloud;
use crate::projection::ProjectionError;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read or write the PLY file
    #[error("Failed to manipulate PLY file. {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a vertex
    #[error("Failed to serialize PLY vertex. {0}")]
    Serialize(#[from] bincode::error::EncodeError),

    /// Failed to deserialize a vertex
    #[error("Failed to deserialize PLY vertex. {0}")]
    Deserialize(#[from] bincode::error::DecodeError),

    /// The header describes a layout this module does not handle
    #[error("Unsupported PLY layout: {0}")]
    UnsupportedLayout(String),

    /// The decoded vertices do not form a valid point cloud
    #[error(transparent)]
    PointCloud(#[from] ProjectionError),
}

#[derive(Debug, bincode::Encode, bincode::Decode)]
struct XyzVertex {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, bincode::Encode, bincode::Decode)]
struct XyzRgbVertex {
    x: f32,
    y: f32,
    z: f32,
    red: u8,
    green: u8,
    blue: u8,
}

fn vertex_config() -> impl Config {
    bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

/// Write a point cloud as binary little-endian PLY.
///
/// Each vertex holds `float x, y, z` and, when the cloud has colors,
/// `uchar red, green, blue`.
pub fn write_ply_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<(), PlyError> {
    let path = path.as_ref();
    log::info!("Writing {}", path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    write_ply_binary_to(&mut writer, cloud)?;
    writer.flush()?;
    Ok(())
}

/// Write a point cloud as binary little-endian PLY to any output.
pub fn write_ply_binary_to<W: Write>(writer: &mut W, cloud: &PointCloud) -> Result<(), PlyError> {
    let mut header = format!(
        "ply\nformat binary_little_endian 1.0\nelement vertex {}\n",
        cloud.len()
    );
    for c in ["x", "y", "z"] {
        header.push_str(&format!("property float {c}\n"));
    }
    if cloud.colors().is_some() {
        for c in ["red", "green", "blue"] {
            header.push_str(&format!("property uchar {c}\n"));
        }
    }
    header.push_str("end_header\n");
    writer.write_all(header.as_bytes())?;

    let config = vertex_config();
    match cloud.colors() {
        Some(colors) => {
            for (p, c) in cloud.points().iter().zip(colors) {
                let vertex = XyzRgbVertex {
                    x: p[0] as f32,
                    y: p[1] as f32,
                    z: p[2] as f32,
                    red: c[0],
                    green: c[1],
                    blue: c[2],
                };
                bincode::encode_into_std_write(vertex, writer, config)?;
            }
        }
        None => {
            for p in cloud.points() {
                let vertex = XyzVertex {
                    x: p[0] as f32,
                    y: p[1] as f32,
                    z: p[2] as f32,
                };
                bincode::encode_into_std_write(vertex, writer, config)?;
            }
        }
    }
    Ok(())
}

struct PlyHeader {
    vertex_count: usize,
    properties: Vec<(String, String)>,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    let mut vertex_count = None;
    let mut is_ply = false;
    let mut is_binary_little_endian = false;
    let mut properties = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::UnsupportedLayout("missing end_header".to_string()));
        }
        let trimmed = line.trim();
        if trimmed == "ply" {
            is_ply = true;
        } else if trimmed == "end_header" {
            break;
        } else if trimmed.starts_with("format binary_little_endian") {
            is_binary_little_endian = true;
        } else if let Some(count) = trimmed.strip_prefix("element vertex") {
            vertex_count = count.trim().parse().ok();
        } else if let Some(property) = trimmed.strip_prefix("property") {
            let mut parts = property.split_whitespace();
            if let (Some(ty), Some(name)) = (parts.next(), parts.next()) {
                properties.push((ty.to_string(), name.to_string()));
            }
        }
    }

    if !is_ply || !is_binary_little_endian {
        return Err(PlyError::UnsupportedLayout(
            "expected binary_little_endian PLY".to_string(),
        ));
    }
    let vertex_count = vertex_count
        .ok_or_else(|| PlyError::UnsupportedLayout("missing vertex count".to_string()))?;
    Ok(PlyHeader {
        vertex_count,
        properties,
    })
}

/// Read a binary PLY file written by [`write_ply_binary`].
pub fn read_ply_binary(path: impl AsRef<Path>) -> Result<PointCloud, PlyError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_ply_binary_from(&mut reader)
}

/// Read a binary PLY point cloud from any input.
pub fn read_ply_binary_from<R: BufRead>(reader: &mut R) -> Result<PointCloud, PlyError> {
    let header = parse_header(reader)?;
    let layout = header
        .properties
        .iter()
        .map(|(ty, name)| format!("{ty} {name}"))
        .collect::<Vec<_>>()
        .join(", ");
    let config = vertex_config();

    let mut points = Vec::with_capacity(header.vertex_count);
    match layout.as_str() {
        "float x, float y, float z" => {
            for _ in 0..header.vertex_count {
                let v: XyzVertex = bincode::decode_from_std_read(reader, config)?;
                points.push([v.x as f64, v.y as f64, v.z as f64]);
            }
            Ok(PointCloud::new(points, None)?)
        }
        "float x, float y, float z, uchar red, uchar green, uchar blue" => {
            let mut colors = Vec::with_capacity(header.vertex_count);
            for _ in 0..header.vertex_count {
                let v: XyzRgbVertex = bincode::decode_from_std_read(reader, config)?;
                points.push([v.x as f64, v.y as f64, v.z as f64]);
                colors.push([v.red, v.green, v.blue]);
            }
            Ok(PointCloud::new(points, Some(colors))?)
        }
        _ => Err(PlyError::UnsupportedLayout(layout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthcap_image::{Image, ImageSize};

    #[test]
    fn test_header_and_size() -> Result<(), Box<dyn std::error::Error>> {
        let cloud = PointCloud::new(
            vec![[1.0, 2.0, 3.0], [-1.5, 0.25, 1000.0]],
            Some(vec![[255, 128, 0], [1, 2, 3]]),
        )?;
        let mut buf = Vec::new();
        write_ply_binary_to(&mut buf, &cloud)?;

        let header = "ply\nformat binary_little_endian 1.0\nelement vertex 2\n\
            property float x\nproperty float y\nproperty float z\n\
            property uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n";
        assert!(buf.starts_with(header.as_bytes()));
        assert_eq!(buf.len(), header.len() + 2 * 15);

        // first vertex, x as little-endian f32
        let x = &buf[header.len()..header.len() + 4];
        assert_eq!(x, &1.0f32.to_le_bytes());
        assert_eq!(&buf[header.len() + 12..header.len() + 15], &[255, 128, 0]);
        Ok(())
    }

    #[test]
    fn test_write_read_file() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let points = Image::<f64, 3>::from_fn(size, |r, c, ch| (r * 4 + c * 2 + ch) as f64);
        let cloud = PointCloud::from_grids(&points, None)?;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cloud.ply");
        write_ply_binary(&path, &cloud)?;
        let read = read_ply_binary(&path)?;

        assert_eq!(read.len(), 4);
        assert!(read.colors().is_none());
        assert_eq!(read.points(), cloud.points());
        Ok(())
    }

    #[test]
    fn test_rejects_ascii() {
        let text = "ply\nformat ascii 1.0\nelement vertex 0\nend_header\n";
        let mut reader = std::io::BufReader::new(text.as_bytes());
        assert!(matches!(
            read_ply_binary_from(&mut reader),
            Err(PlyError::UnsupportedLayout(_))
        ));
    }
}
