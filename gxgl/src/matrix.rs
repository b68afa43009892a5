//! Matrix and vector helpers shared by the compilers.
//!
//! Matrices are stored row-major with column vectors, which is the layout the GX
//! matrix registers use. GL hands matrices over column-major; see
//! [Matrixf::from_gl].

#![allow(missing_docs)]

use core::fmt;
use std::ops;

use serde::{Deserialize, Serialize};

use crate::error::GlError;

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrixf(pub [[f32; 4]; 4]);

impl Default for Matrixf {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrixf {
    pub fn identity() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn zero() -> Self {
        Self([[0.0; 4]; 4])
    }

    /// Converts a column-major GL matrix.
    pub fn from_gl(m: &[f32; 16]) -> Self {
        let columns: &[[f32; 4]; 4] = bytemuck::cast_ref(m);
        Self(*columns).transpose()
    }

    /// Returns the matrix in GL's column-major order.
    pub fn to_gl(&self) -> [f32; 16] {
        bytemuck::cast(self.transpose().0)
    }

    /// Equivalent of `glFrustum`.
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut mtx = Self::zero();
        mtx.0[0][0] = 2.0 * near / (right - left);
        mtx.0[0][2] = (right + left) / (right - left);
        mtx.0[1][1] = 2.0 * near / (top - bottom);
        mtx.0[1][2] = (top + bottom) / (top - bottom);
        mtx.0[2][2] = -(far + near) / (far - near);
        mtx.0[2][3] = -2.0 * far * near / (far - near);
        mtx.0[3][2] = -1.0;
        mtx
    }

    /// Equivalent of `glOrtho`.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut mtx = Self::identity();
        mtx.0[0][0] = 2.0 / (right - left);
        mtx.0[0][3] = -(right + left) / (right - left);
        mtx.0[1][1] = 2.0 / (top - bottom);
        mtx.0[1][3] = -(top + bottom) / (top - bottom);
        mtx.0[2][2] = -2.0 / (far - near);
        mtx.0[2][3] = -(far + near) / (far - near);
        mtx
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut mtx = Self::identity();
        mtx.0[0][0] = x;
        mtx.0[1][1] = y;
        mtx.0[2][2] = z;
        mtx
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        let mut mtx = Self::identity();
        mtx.0[0][3] = x;
        mtx.0[1][3] = y;
        mtx.0[2][3] = z;
        mtx
    }

    pub fn transpose(&self) -> Self {
        let mut r = Self::zero();
        for i in 0..4 {
            for j in 0..4 {
                r.0[i][j] = self.0[j][i];
            }
        }
        r
    }

    /// Inverse of the upper 3x4 part, treating the bottom row as `[0, 0, 0, 1]`.
    ///
    /// Returns None if the linear part is singular.
    pub fn invert_affine(&self) -> Option<Matrixf> {
        let m = &self.0;
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        let det = m[0][0] * cofactor(1, 2, 1, 2) - m[0][1] * cofactor(1, 2, 0, 2)
            + m[0][2] * cofactor(1, 2, 0, 1);
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let mut inv = Matrixf::identity();
        inv.0[0][0] = cofactor(1, 2, 1, 2) * inv_det;
        inv.0[0][1] = -cofactor(0, 2, 1, 2) * inv_det;
        inv.0[0][2] = cofactor(0, 1, 1, 2) * inv_det;
        inv.0[1][0] = -cofactor(1, 2, 0, 2) * inv_det;
        inv.0[1][1] = cofactor(0, 2, 0, 2) * inv_det;
        inv.0[1][2] = -cofactor(0, 1, 0, 2) * inv_det;
        inv.0[2][0] = cofactor(1, 2, 0, 1) * inv_det;
        inv.0[2][1] = -cofactor(0, 2, 0, 1) * inv_det;
        inv.0[2][2] = cofactor(0, 1, 0, 1) * inv_det;

        let translate = [m[0][3], m[1][3], m[2][3], 0.0];
        let new_translate = scalar_mul(&inv * translate, -1.0);
        inv.0[0][3] = new_translate[0];
        inv.0[1][3] = new_translate[1];
        inv.0[2][3] = new_translate[2];
        Some(inv)
    }

    /// The matrix that transforms normals: the inverse transpose of the linear part.
    pub fn normal_matrix(&self) -> Matrixf {
        let mut linear = *self;
        for row in 0..3 {
            linear.0[row][3] = 0.0;
        }
        let mut normal = linear
            .invert_affine()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);
        normal.0[3] = [0.0, 0.0, 0.0, 1.0];
        for row in 0..3 {
            normal.0[row][3] = 0.0;
        }
        normal
    }

    /// The top two rows, as loaded into a 2x4 texture matrix.
    pub fn rows_2x4(&self) -> [[f32; 4]; 2] {
        [self.0[0], self.0[1]]
    }

    /// The top three rows, as loaded into a 3x4 matrix register.
    pub fn rows_3x4(&self) -> [[f32; 4]; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}

impl fmt::Debug for Matrixf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows = f.debug_tuple("Matrixf");
        for row in &self.0 {
            rows.field(row);
        }
        rows.finish()
    }
}

fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a.iter().zip(&b).map(|(x, y)| x * y).sum()
}

impl ops::Mul<&Matrixf> for &Matrixf {
    type Output = Matrixf;

    /// Row `i` of the product is `self` row `i` applied to each column of `rhs`.
    fn mul(self, rhs: &Matrixf) -> Self::Output {
        let columns = rhs.transpose().0;
        Matrixf(self.0.map(|row| columns.map(|column| dot4(row, column))))
    }
}

impl ops::Mul<[f32; 4]> for &Matrixf {
    type Output = [f32; 4];

    fn mul(self, rhs: [f32; 4]) -> Self::Output {
        self.0.map(|row| dot4(row, rhs))
    }
}

pub fn normalize3(v: [f32; 3]) -> [f32; 3] {
    let mag = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if mag == 0.0 {
        v
    } else {
        [v[0] / mag, v[1] / mag, v[2] / mag]
    }
}

pub fn scalar_mul(v: [f32; 4], s: f32) -> [f32; 4] {
    [v[0] * s, v[1] * s, v[2] * s, v[3] * s]
}

/// A matrix stack with a fixed maximum depth.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    pub stack: Vec<Matrixf>,
    pub cur: Matrixf,
    pub max_depth: usize,
}

impl MatrixStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            cur: Matrixf::identity(),
            max_depth,
        }
    }

    pub fn load(&mut self, m: Matrixf) {
        self.cur = m;
    }

    pub fn mul(&mut self, m: &Matrixf) {
        self.cur = &self.cur * m;
    }

    pub fn push(&mut self) -> Result<(), GlError> {
        // The current matrix counts towards the depth.
        if self.stack.len() + 1 >= self.max_depth {
            return Err(GlError::StackOverflow);
        }
        self.stack.push(self.cur);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), GlError> {
        self.cur = self.stack.pop().ok_or(GlError::StackUnderflow)?;
        Ok(())
    }
}
