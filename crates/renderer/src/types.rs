use crate::geometry::ArrowHead;

/// Linear RGB colour handed straight to the fragment stage.
pub type Rgb = [f32; 3];

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Fixed colours used by every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Rgb,
    pub grid: Rgb,
    pub arrow: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [0.1, 0.1, 0.1],
            grid: [0.5, 0.5, 0.5],
            arrow: [1.0, 0.2, 0.2],
        }
    }
}

/// Immutable configuration passed to the render thread at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    pub antialiasing: Antialiasing,
    /// Grid lines are emitted for every integer in `[-extent, extent]`.
    pub grid_half_extent: u32,
    /// Untransformed sample vector drawn with an arrowhead.
    pub sample_vector: (f32, f32),
    pub arrow_head: ArrowHead,
    /// World units visible from the centre to the shorter window edge.
    /// `1.0` reproduces raw clip-space drawing.
    pub view_extent: f32,
    pub palette: Palette,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 800),
            title: "Matrix Sandbox".to_string(),
            antialiasing: Antialiasing::default(),
            grid_half_extent: 10,
            sample_vector: (3.0, 1.0),
            arrow_head: ArrowHead::default(),
            view_extent: 4.0,
            palette: Palette::default(),
        }
    }
}
