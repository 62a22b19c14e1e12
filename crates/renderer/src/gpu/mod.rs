//! GPU side of the renderer.
//!
//! - `context` owns the wgpu instance, device and surface, and rebuilds the
//!   swapchain on resize.
//! - `pipeline` builds the single line-list pipeline from the GLSL stages in
//!   `compile`.
//! - `mesh` holds the static grid and arrow vertex buffers, each with its own
//!   uniform block.
//! - `uniforms` mirrors the std140 block the shaders read.
//! - `state` executes a `FramePlan`: one clear, then each draw in order.

mod context;
mod mesh;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
