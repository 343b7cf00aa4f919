//! Camera, projection, and the view frustum used for culling.
//!
//! - [`Camera`] is a free-look camera defined by position, yaw and pitch
//! - [`Projection`] holds the perspective parameters and tracks resizes
//! - [`Frustum`] is extracted from the combined view-projection matrix and
//!   answers sphere visibility queries for the render pipeline

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, Vector4};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Free-look camera. Yaw and pitch define the view direction; the view
/// matrix is rebuilt from them each frame.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();

        Matrix4::look_to_rh(
            self.position,
            Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize(),
            Vector3::unit_y(),
        )
    }
}

/// Perspective projection parameters, kept separate from the camera so a
/// surface resize only touches the aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// One frustum plane in the form `ax + by + cz + d = 0`, with the normal
/// pointing into the frustum.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f32>,
    d: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let normal = Vector3::new(row.x, row.y, row.z);
        let inv_len = 1.0 / normal.magnitude();
        Self {
            normal: normal * inv_len,
            d: row.w * inv_len,
        }
    }

    fn signed_distance(&self, point: Vector3<f32>) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// View frustum as six planes, extracted from a view-projection matrix.
///
/// Visibility tests are conservative: a sphere touching any plane counts as
/// visible. False positives only cost a draw, false negatives would pop
/// geometry.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from `view_proj` (Gribb/Hartmann). `Matrix4` is stored
    /// column-major, so matrix row `r` is `(m.x[r], m.y[r], m.z[r], m.w[r])`.
    pub fn from_view_proj(m: &Matrix4<f32>) -> Self {
        let row = |r: usize| Vector4::new(m.x[r], m.y[r], m.z[r], m.w[r]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_row(r3 + r0), // left
                Plane::from_row(r3 - r0), // right
                Plane::from_row(r3 + r1), // bottom
                Plane::from_row(r3 - r1), // top
                // Depth runs 0..1 in clip space, so the near plane is row 2
                // alone rather than `r3 + r2`.
                Plane::from_row(r2),      // near
                Plane::from_row(r3 - r2), // far
            ],
        }
    }

    pub fn from_camera(camera: &Camera, projection: &Projection) -> Self {
        Self::from_view_proj(&(projection.calc_matrix() * camera.calc_matrix()))
    }

    /// Whether a sphere intersects the frustum at all.
    pub fn contains_sphere(&self, center: Vector3<f32>, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(center) >= -radius)
    }
}
