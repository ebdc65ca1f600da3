// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the `Mat4` world transform carried inside draw records.

use std::ops::Mul;

/// A 4x4 column-major matrix, used as the world transform of a draw call.
///
/// The command stream never interprets the matrix: it is copied into a record
/// byte-for-byte and handed back to the [`RenderDriver`](crate::RenderDriver)
/// unchanged at replay time. The `#[repr(C)]` layout and the `Pod` derive are
/// what allow that copy.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [[0.0; 4]; 4],
    };

    /// The size of the matrix in bytes once encoded into a record.
    pub const BYTE_SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a matrix from 16 floats in column-major order.
    #[inline]
    pub fn from_cols_array(m: &[f32; 16]) -> Self {
        Self {
            cols: [
                [m[0], m[1], m[2], m[3]],
                [m[4], m[5], m[6], m[7]],
                [m[8], m[9], m[10], m[11]],
                [m[12], m[13], m[14], m[15]],
            ],
        }
    }

    /// Returns the 16 elements of the matrix in column-major order.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }

    /// Creates a translation matrix.
    ///
    /// # Arguments
    ///
    /// * `v`: The translation to apply, as `[x, y, z]`.
    #[inline]
    pub fn from_translation(v: [f32; 3]) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [v[0], v[1], v[2], 1.0];
        m
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: [f32; 3]) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = scale[0];
        m.cols[1][1] = scale[1];
        m.cols[2][2] = scale[2];
        m
    }

    /// Creates a matrix for a rotation around the Z-axis.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle of rotation in radians.
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Returns a row of the matrix.
    #[inline]
    pub fn row(&self, index: usize) -> [f32; 4] {
        [
            self.cols[0][index],
            self.cols[1][index],
            self.cols[2][index],
            self.cols[3][index],
        ]
    }

    /// Compares two matrices element-wise within `epsilon`.
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(a, b)| super::approx_eq_eps(*a, *b, epsilon))
    }
}

impl Default for Mat4 {
    /// Returns the identity matrix.
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat4`. Matrix multiplication is not commutative.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result = Mat4::ZERO;
        for (c_idx, target_col) in result.cols.iter_mut().enumerate() {
            let col = rhs.cols[c_idx];
            for (r_idx, cell) in target_col.iter_mut().enumerate() {
                let row = self.row(r_idx);
                *cell = row[0] * col[0] + row[1] * col[1] + row[2] * col[2] + row[3] * col[3];
            }
        }
        result
    }
}
