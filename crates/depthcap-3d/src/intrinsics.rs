/// Calibration of a range component.
///
/// Raw range samples `d` map to metric distance as `d * scale_c + offset_c`. The
/// projection center and focal length are given in pixels; `aspect_r` scales the
/// vertical focal length.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Intrinsics {
    /// Range scale.
    pub scale_c: f64,
    /// Range offset.
    pub offset_c: f64,
    /// Principal point, horizontal.
    pub princ_pt_u: f64,
    /// Principal point, vertical.
    pub princ_pt_v: f64,
    /// Focal length in pixels.
    pub foc_len: f64,
    /// Ratio of the vertical to the horizontal focal length.
    pub aspect_r: f64,
}

impl Default for Intrinsics {
    /// Fallback calibration used when a frame carries no chunk metadata.
    fn default() -> Self {
        Self {
            scale_c: 1.0,
            offset_c: 0.0,
            princ_pt_u: 516.90,
            princ_pt_v: 290.54,
            foc_len: 216.31,
            aspect_r: 1.0,
        }
    }
}

/// Metadata keys that must all be present to read the intrinsics of a frame.
pub const REQUIRED_KEYS: [&str; 6] = [
    "FocalLength",
    "AspectRatio",
    "PrincipalPointU",
    "PrincipalPointV",
    "CoordinateScaleC",
    "CoordinateOffsetC",
];

impl Intrinsics {
    /// Build the intrinsics from frame metadata.
    ///
    /// Returns `None` unless every key of [`REQUIRED_KEYS`] resolves to a number. The
    /// values are copied without conversion.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<f64>) -> Option<Self> {
        Some(Self {
            foc_len: lookup("FocalLength")?,
            aspect_r: lookup("AspectRatio")?,
            princ_pt_u: lookup("PrincipalPointU")?,
            princ_pt_v: lookup("PrincipalPointV")?,
            scale_c: lookup("CoordinateScaleC")?,
            offset_c: lookup("CoordinateOffsetC")?,
        })
    }

    /// Like [`Intrinsics::from_lookup`], falling back to [`Intrinsics::default`] with a
    /// warning.
    pub fn from_lookup_or_default(lookup: impl Fn(&str) -> Option<f64>) -> Self {
        Self::from_lookup(lookup).unwrap_or_else(|| {
            log::warn!("Using default parameters for camera intrinsics");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_all_keys_present() {
        let values: HashMap<&str, f64> = REQUIRED_KEYS
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, i as f64 + 1.0))
            .collect();
        let k = Intrinsics::from_lookup(|key| values.get(key).copied()).unwrap();
        assert_eq!(k.foc_len, 1.0);
        assert_eq!(k.aspect_r, 2.0);
        assert_eq!(k.princ_pt_u, 3.0);
        assert_eq!(k.princ_pt_v, 4.0);
        assert_eq!(k.scale_c, 5.0);
        assert_eq!(k.offset_c, 6.0);
    }

    #[test]
    fn test_no_partial_fill() {
        // everything but the range offset
        let k = Intrinsics::from_lookup_or_default(|key| {
            (key != "CoordinateOffsetC").then_some(42.0)
        });
        assert_eq!(k, Intrinsics::default());
    }

    #[test]
    fn test_serde() -> Result<(), serde_json::Error> {
        let k = Intrinsics::default();
        let json = serde_json::to_string(&k)?;
        assert_eq!(serde_json::from_str::<Intrinsics>(&json)?, k);
        Ok(())
    }
}
