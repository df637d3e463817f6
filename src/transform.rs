use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::point3d::{Point3D, cross, dot3, normalize};

/// Column-major 4x4 matrix, `m[column][row]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };

    pub fn translate(offset: Point3D) -> Mat4 {
        let mut out = Mat4::IDENTITY;
        out.m[3][0] = offset.x;
        out.m[3][1] = offset.y;
        out.m[3][2] = offset.z;
        out
    }

    pub fn scale(factors: Point3D) -> Mat4 {
        let mut out = Mat4::IDENTITY;
        out.m[0][0] = factors.x;
        out.m[1][1] = factors.y;
        out.m[2][2] = factors.z;
        out
    }

    /// Right-handed rotation of `angle` radians about `axis`. The axis is normalized here.
    pub fn rotate(angle: f32, axis: Point3D) -> Mat4 {
        let a = normalize(axis);
        let (s, c) = angle.sin_cos();
        let t = a * (1.0 - c);

        let mut out = Mat4::IDENTITY;
        out.m[0][0] = c + t.x * a.x;
        out.m[0][1] = t.x * a.y + s * a.z;
        out.m[0][2] = t.x * a.z - s * a.y;

        out.m[1][0] = t.y * a.x - s * a.z;
        out.m[1][1] = c + t.y * a.y;
        out.m[1][2] = t.y * a.z + s * a.x;

        out.m[2][0] = t.z * a.x + s * a.y;
        out.m[2][1] = t.z * a.y - s * a.x;
        out.m[2][2] = c + t.z * a.z;
        out
    }

    /// Right-handed perspective projection with clip-space z in [-w, w].
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half = (fovy * 0.5).tan();
        let mut out = Mat4::ZERO;
        out.m[0][0] = 1.0 / (aspect * tan_half);
        out.m[1][1] = 1.0 / tan_half;
        out.m[2][2] = -(far + near) / (far - near);
        out.m[2][3] = -1.0;
        out.m[3][2] = -(2.0 * far * near) / (far - near);
        out
    }

    /// Right-handed view matrix looking from `eye` towards `center`.
    pub fn look_at(eye: Point3D, center: Point3D, up: Point3D) -> Mat4 {
        let f = normalize(center - eye);
        let s = normalize(cross(f, up));
        let u = cross(s, f);

        let mut out = Mat4::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][0] = s.y;
        out.m[2][0] = s.z;
        out.m[0][1] = u.x;
        out.m[1][1] = u.y;
        out.m[2][1] = u.z;
        out.m[0][2] = -f.x;
        out.m[1][2] = -f.y;
        out.m[2][2] = -f.z;
        out.m[3][0] = -dot3(s, eye);
        out.m[3][1] = -dot3(u, eye);
        out.m[3][2] = dot3(f, eye);
        out
    }

    /// Multiplies `(p, 1)` by the matrix and returns the homogeneous result.
    pub fn transform_point(&self, p: Point3D) -> [f32; 4] {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|col| self.m[col][row] * v[col]).sum();
        }
        out
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = Mat4::ZERO;
        for col in 0..4 {
            for row in 0..4 {
                out.m[col][row] = (0..4).map(|k| self.m[k][row] * rhs.m[col][k]).sum();
            }
        }
        out
    }
}

/// Per-instance placement of a model. Mutated between frames by the caller only.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point3D,
    /// Spin axis; its length is the angular velocity in degrees per frame.
    pub rotation: Point3D,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Point3D::ZERO, rotation: Point3D::ZERO, scale: 1.0 }
    }
}

impl Transform {
    /// `T(position) * S(s, -s, s) * R(frame_count * |rotation|, rotation)`.
    ///
    /// The y axis is mirrored so that model "up" maps to decreasing pixel rows.
    pub fn model_matrix(&self, frame_count: u64) -> Mat4 {
        let s = self.scale;
        let m = Mat4::translate(self.position) * Mat4::scale(Point3D::new(s, -s, s));
        let speed = self.rotation.length();
        if speed == 0.0 {
            return m;
        }
        let angle = (frame_count as f32 * speed).to_radians();
        m * Mat4::rotate(angle, self.rotation)
    }
}
