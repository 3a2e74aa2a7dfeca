use std::ops::Mul;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Errors from building projection matrices.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error(
        "degenerate frustum: left={left} right={right} bottom={bottom} top={top} near={near} far={far}"
    )]
    DegenerateFrustum {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    #[error("degenerate orthographic volume: width, height and depth must be non-zero")]
    DegenerateOrtho,
}

/// A 4x4 transform stored as `m[row][col]`.
///
/// Points are row vectors (`v * M`). The array layout is exactly the 16 floats
/// handed to the backend's matrix uniform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Matrix4x4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4x4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// The multiplicative identity.
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    /// Matrix product `a * b`: applying the result is applying `a`, then `b`.
    pub fn multiply(a: &Self, b: &Self) -> Self {
        let mut out = [[0.0_f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a.m[i][0] * b.m[0][j]
                    + a.m[i][1] * b.m[1][j]
                    + a.m[i][2] * b.m[2][j]
                    + a.m[i][3] * b.m[3][j];
            }
        }
        Self { m: out }
    }

    /// Translate in place: `row3 += tx*row0 + ty*row1 + tz*row2`.
    pub fn translate(&mut self, tx: f32, ty: f32, tz: f32) -> &mut Self {
        for col in 0..4 {
            self.m[3][col] += self.m[0][col] * tx + self.m[1][col] * ty + self.m[2][col] * tz;
        }
        self
    }

    /// Scale rows 0..2 in place.
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> &mut Self {
        for (row, s) in self.m.iter_mut().zip([sx, sy, sz]) {
            for cell in row.iter_mut() {
                *cell *= s;
            }
        }
        self
    }

    /// Rotate in place by `angle_degrees` about `(ax, ay, az)`.
    ///
    /// The axis is normalized first. A zero-length axis leaves the matrix
    /// untouched. Successive calls compose: the most recent rotation is the
    /// one applied to object coordinates first.
    pub fn rotate(&mut self, angle_degrees: f32, ax: f32, ay: f32, az: f32) -> &mut Self {
        let mag = (ax * ax + ay * ay + az * az).sqrt();
        if mag <= 0.0 {
            return self;
        }
        let (x, y, z) = (ax / mag, ay / mag, az / mag);
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let omc = 1.0 - cos;

        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, yz, zx) = (x * y, y * z, z * x);
        let (xs, ys, zs) = (x * sin, y * sin, z * sin);

        let rot = Self::from_rows([
            [omc * xx + cos, omc * xy - zs, omc * zx + ys, 0.0],
            [omc * xy + zs, omc * yy + cos, omc * yz - xs, 0.0],
            [omc * zx - ys, omc * yz + xs, omc * zz + cos, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        *self = Self::multiply(&rot, self);
        self
    }

    /// Apply a perspective frustum in place.
    ///
    /// Eye-space points at depth `-near` land on NDC depth -1 and points at
    /// `-far` on +1; the last column copies `-z` into `w` for the divide.
    pub fn frustum(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self, MathError> {
        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;
        if near <= 0.0 || far <= 0.0 || dx <= 0.0 || dy <= 0.0 || dz <= 0.0 {
            return Err(MathError::DegenerateFrustum {
                left,
                right,
                bottom,
                top,
                near,
                far,
            });
        }

        let frust = Self::from_rows([
            [2.0 * near / dx, 0.0, 0.0, 0.0],
            [0.0, 2.0 * near / dy, 0.0, 0.0],
            [(right + left) / dx, (top + bottom) / dy, -(near + far) / dz, -1.0],
            [0.0, 0.0, -2.0 * near * far / dz, 0.0],
        ]);
        *self = Self::multiply(&frust, self);
        Ok(self)
    }

    /// Symmetric frustum from a vertical field of view in degrees.
    pub fn perspective(
        &mut self,
        fovy_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self, MathError> {
        let h = (fovy_degrees / 2.0).to_radians().tan() * near;
        let w = h * aspect;
        self.frustum(-w, w, -h, h, near, far)
    }

    /// Apply an orthographic projection in place.
    pub fn ortho(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<&mut Self, MathError> {
        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;
        if dx == 0.0 || dy == 0.0 || dz == 0.0 {
            return Err(MathError::DegenerateOrtho);
        }

        let ortho = Self::from_rows([
            [2.0 / dx, 0.0, 0.0, 0.0],
            [0.0, 2.0 / dy, 0.0, 0.0],
            [0.0, 0.0, -2.0 / dz, 0.0],
            [-(right + left) / dx, -(top + bottom) / dy, -(near + far) / dz, 1.0],
        ]);
        *self = Self::multiply(&ortho, self);
        Ok(self)
    }

    /// Transform a homogeneous row vector: `v * M`.
    pub fn transform_point(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0_f32; 4];
        for (j, o) in out.iter_mut().enumerate() {
            *o = v[0] * self.m[0][j] + v[1] * self.m[1][j] + v[2] * self.m[2][j] + v[3] * self.m[3][j];
        }
        out
    }

    /// The 16 floats in upload order.
    pub fn as_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.m)
    }

    /// Column-vector view of the same transform.
    ///
    /// Each stored row becomes a glam column, so `to_glam() * v` equals
    /// `transform_point(v)`.
    pub fn to_glam(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.m)
    }

    pub fn from_glam(mat: Mat4) -> Self {
        Self {
            m: mat.to_cols_array_2d(),
        }
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.as_slice()
            .iter()
            .zip(other.as_slice())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Mul for Matrix4x4 {
    type Output = Matrix4x4;

    fn mul(self, rhs: Matrix4x4) -> Matrix4x4 {
        Matrix4x4::multiply(&self, &rhs)
    }
}
