//! Per-frame 2x2 linear map embedded in a 4x4 homogeneous matrix.

/// Row-major 4x4 matrix acting on row vectors: a point `v` maps to `v * M`.
/// With `[[a, b], [c, d]]` in the top-left block, `(x, y)` becomes
/// `(a*x + c*y, b*x + d*y)`, so `cos/sin/-sin/cos` turns counter-clockwise.
/// Only that block ever differs from the identity for frames built with
/// [`build_matrix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    rows: [[f32; 4]; 4],
}

impl FrameTransform {
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.rows
    }

    /// The `[[a, b], [c, d]]` block.
    pub fn linear(&self) -> [[f32; 2]; 2] {
        [
            [self.rows[0][0], self.rows[0][1]],
            [self.rows[1][0], self.rows[1][1]],
        ]
    }

    /// Maps the homogeneous row vector `(x, y, 0, 1)` and drops `z`/`w`.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let r = &self.rows;
        (
            x * r[0][0] + y * r[1][0] + r[3][0],
            x * r[0][1] + y * r[1][1] + r[3][1],
        )
    }

    /// `self * rhs`: applying the result equals applying `self` then `rhs`.
    pub fn multiply(&self, rhs: &FrameTransform) -> FrameTransform {
        let mut rows = [[0.0f32; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        FrameTransform { rows }
    }

    /// Layout for a GLSL `mat4` uniform used as `u_transform * v`. GLSL
    /// reads each row as a column, which is exactly the transpose needed to
    /// turn the row-vector product into a column-vector one.
    pub fn to_gpu_layout(&self) -> [[f32; 4]; 4] {
        self.rows
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Builds the frame matrix whose top-left block is `[[a, b], [c, d]]`.
pub fn build_matrix(a: f32, b: f32, c: f32, d: f32) -> FrameTransform {
    FrameTransform::from_rows([
        [a, b, 0.0, 0.0],
        [c, d, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Orthographic scale mapping `view_extent` world units onto the shorter
/// half-axis of a `width`x`height` surface, keeping grid cells square.
pub fn view_projection(view_extent: f32, width: u32, height: u32) -> FrameTransform {
    let extent = if view_extent > 0.0 { view_extent } else { 1.0 };
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    let (sx, sy) = if width >= height {
        (height / width / extent, 1.0 / extent)
    } else {
        (1.0 / extent, width / height / extent)
    };
    build_matrix(sx, 0.0, 0.0, sy)
}
