//! Static line geometry uploaded once at start-up.

use bytemuck::{Pod, Zeroable};

/// One line segment in model space. The layout doubles as two consecutive
/// `vec2` vertices, so a slice of segments can be uploaded as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl LineSegment {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn start(&self) -> (f32, f32) {
        (self.x1, self.y1)
    }

    pub fn end(&self) -> (f32, f32) {
        (self.x2, self.y2)
    }

    pub fn length(&self) -> f32 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }
}

/// Size and spread of the two arrowhead wings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    /// Wing length in model units.
    pub length: f32,
    /// Angle between each wing and the shaft, in degrees.
    pub angle_degrees: f32,
}

impl Default for ArrowHead {
    fn default() -> Self {
        Self {
            length: 0.3,
            angle_degrees: 20.0,
        }
    }
}

/// Builds a square grid of unit-spaced lines covering `[-half_extent, half_extent]`
/// on both axes: one vertical and one horizontal line per integer.
pub fn build_grid(half_extent: u32) -> Vec<LineSegment> {
    let n = half_extent as i64;
    let extent = half_extent as f32;
    let mut lines = Vec::with_capacity(2 * (2 * half_extent as usize + 1));
    for i in -n..=n {
        let i = i as f32;
        lines.push(LineSegment::new(i, -extent, i, extent));
        lines.push(LineSegment::new(-extent, i, extent, i));
    }
    lines
}

/// Builds the shaft from the origin to `(x, y)` plus the default arrowhead.
pub fn build_vector(x: f32, y: f32) -> [LineSegment; 3] {
    build_vector_with_head(x, y, ArrowHead::default())
}

/// Builds the shaft plus two wings pointing back from the tip.
///
/// The zero vector has no direction; `atan2(0, 0) == 0` so its wings fold
/// back along the negative x axis.
pub fn build_vector_with_head(x: f32, y: f32, head: ArrowHead) -> [LineSegment; 3] {
    let angle = y.atan2(x);
    let spread = head.angle_degrees.to_radians();
    let left = angle + std::f32::consts::PI - spread;
    let right = angle + std::f32::consts::PI + spread;

    [
        LineSegment::new(0.0, 0.0, x, y),
        LineSegment::new(
            x,
            y,
            x + head.length * left.cos(),
            y + head.length * left.sin(),
        ),
        LineSegment::new(
            x,
            y,
            x + head.length * right.cos(),
            y + head.length * right.sin(),
        ),
    ]
}

/// Number of vertices a `LineList` draw of `segments` consumes.
pub fn vertex_count(segments: &[LineSegment]) -> u32 {
    (segments.len() * 2) as u32
}
