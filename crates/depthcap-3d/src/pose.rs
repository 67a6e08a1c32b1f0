use glam::{DMat3, DMat4, DVec3};

/// Rigid camera-to-world transform built from a position and Euler angles.
///
/// The orientation holds the rotations around the X, Y and Z axes in degrees,
/// composed as `Rx * Ry * Rz`. The position (millimeters) is the translation column.
///
/// The matrix is only recomputed by [`Pose::refresh`]; setters leave it untouched.
///
/// # Example
///
/// ```
/// use depthcap_3d::pose::Pose;
///
/// let mut pose = Pose::new();
/// pose.set_position([0.0, 0.0, 100.0]);
/// pose.refresh();
/// let m = pose.transform_matrix();
/// assert_eq!(m.w_axis.z, 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    position: DVec3,
    orientation: DVec3,
    transform: DMat4,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DVec3::ZERO,
            transform: DMat4::IDENTITY,
        }
    }
}

impl Pose {
    /// Identity pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pose and compute its matrix.
    pub fn from_parts(position: [f64; 3], orientation_deg: [f64; 3]) -> Self {
        let mut pose = Self::new();
        pose.set_position(position);
        pose.set_orientation(orientation_deg);
        pose.refresh();
        pose
    }

    /// Translation along X, Y, Z.
    pub fn position(&self) -> [f64; 3] {
        self.position.to_array()
    }

    /// Set the translation along X, Y, Z.
    pub fn set_position(&mut self, position: [f64; 3]) {
        self.position = DVec3::from_array(position);
    }

    /// Rotation around X, Y, Z in degrees.
    pub fn orientation(&self) -> [f64; 3] {
        self.orientation.to_array()
    }

    /// Set the rotation around X, Y, Z in degrees.
    pub fn set_orientation(&mut self, orientation_deg: [f64; 3]) {
        self.orientation = DVec3::from_array(orientation_deg);
    }

    /// Recompute the matrix from the current position and orientation.
    pub fn refresh(&mut self) {
        let rotation = DMat3::from_rotation_x(self.orientation.x.to_radians())
            * DMat3::from_rotation_y(self.orientation.y.to_radians())
            * DMat3::from_rotation_z(self.orientation.z.to_radians());
        let mut transform = DMat4::from_mat3(rotation);
        transform.w_axis = self.position.extend(1.0);
        self.transform = transform;
    }

    /// The homogeneous matrix as of the last [`Pose::refresh`].
    pub fn transform_matrix(&self) -> DMat4 {
        self.transform
    }
}
