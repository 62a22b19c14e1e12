//! Renderer for the linear-transform sandbox.
//!
//! A window thread draws a fixed grid and one sample vector under a 2x2
//! matrix whose entries are expressions of elapsed time. The control side
//! edits those expressions, scales and toggles through
//! [`SharedControlState`]; the render thread only reads it.
//!
//! ```text
//!   control task ──writes──▶ SharedControlState ◀──reads── RenderLoop (frame.rs)
//!        ▲                                                   │ FramePlan
//!        │ WindowSignal                                      ▼
//!   WindowRuntime (window.rs) ◀──── winit event loop ──▶ GpuState (gpu/)
//! ```
//!
//! Everything above the `gpu` module is testable without a display.

mod compile;
pub mod control;
pub mod frame;
pub mod geometry;
mod gpu;
pub mod transform;
mod types;
mod window;

pub use control::{ControlSettings, ControlSnapshot, MatrixEntry, SharedControlState, SCALE_RANGE};
pub use frame::{
    DrawCall, EntryEvaluator, FormulaEvaluator, FramePlan, Geometry, Iteration, LoopPhase,
    RenderLoop, PAUSE_POLL_INTERVAL,
};
pub use geometry::{ArrowHead, LineSegment};
pub use transform::{build_matrix, view_projection, FrameTransform};
pub use types::{Antialiasing, Palette, RendererConfig, Rgb};
pub use window::{Shortcut, WindowRuntime, WindowSignal};
