use bytemuck::{Pod, Zeroable};

use crate::transform::FrameTransform;
use crate::types::Rgb;

/// Mirrors the std140 `LineParams` block: a `mat4` followed by a `vec4`
/// colour (alpha unused).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct LineUniforms {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl LineUniforms {
    pub fn new(transform: &FrameTransform, color: Rgb) -> Self {
        Self {
            transform: transform.to_gpu_layout(),
            color: [color[0], color[1], color[2], 1.0],
        }
    }

    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::build_matrix;

    #[test]
    fn matches_std140_block_size() {
        assert_eq!(LineUniforms::SIZE, 80);
    }

    /// `u_transform * vec4(x, y, 0, 1)` with `transform[column][row]`.
    fn shade(uniforms: &LineUniforms, x: f32, y: f32) -> (f32, f32) {
        let m = &uniforms.transform;
        (
            m[0][0] * x + m[1][0] * y + m[3][0],
            m[0][1] * x + m[1][1] * y + m[3][1],
        )
    }

    #[test]
    fn transform_rows_are_uploaded_unchanged() {
        let uniforms = LineUniforms::new(&build_matrix(1.0, 2.0, 3.0, 4.0), [0.5, 0.25, 1.0]);
        assert_eq!(uniforms.transform[0][1], 2.0);
        assert_eq!(uniforms.transform[1][0], 3.0);
        assert_eq!(uniforms.color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 80);
    }

    #[test]
    fn shader_sees_the_same_map_as_apply() {
        let matrix = build_matrix(1.0, 2.0, 3.0, 4.0);
        let uniforms = LineUniforms::new(&matrix, [1.0; 3]);
        assert_eq!(shade(&uniforms, 1.0, 1.0), matrix.apply(1.0, 1.0));
        assert_eq!(shade(&uniforms, 1.0, 0.0), (1.0, 2.0));
    }

    #[test]
    fn default_rotation_turns_counter_clockwise_on_the_gpu() {
        let t = 0.3f32;
        let matrix = build_matrix(t.cos(), t.sin(), -t.sin(), t.cos());
        let (x, y) = shade(&LineUniforms::new(&matrix, [1.0; 3]), 1.0, 0.0);
        assert!((x - t.cos()).abs() < 1e-6);
        assert!(y > 0.29, "rotated to y={y}");
    }
}
