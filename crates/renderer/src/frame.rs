//! GPU-free half of the render loop.
//!
//! [`RenderLoop`] decides, once per iteration, whether to idle, close, or
//! draw; when drawing it samples the shared control state, evaluates the four
//! expressions, and produces a [`FramePlan`] that the GPU side executes as-is.
//!
//! ```text
//!   Initializing ──start()──▶ Running ──close requested──▶ Closing ──finish()──▶ Terminated
//!                              │  ▲
//!                     paused?  ▼  │  (re-polled every iteration)
//!                             Idle(10ms)
//! ```

use std::time::Duration;

use formula::CachedFormula;

use crate::control::{MatrixEntry, SharedControlState};
use crate::transform::{build_matrix, FrameTransform};
use crate::types::{Palette, Rgb};

/// How long an iteration sleeps while the animation is paused.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Turns one matrix entry's expression into a number for time `t`.
///
/// Implementations must never fail: bad input yields a fallback value.
pub trait EntryEvaluator {
    fn evaluate(&mut self, entry: MatrixEntry, source: &str, t: f64) -> f64;
}

/// Production evaluator: sandboxed formulas, re-parsed only when edited.
#[derive(Debug)]
pub struct FormulaEvaluator {
    cache: [CachedFormula; 4],
}

impl FormulaEvaluator {
    pub fn new() -> Self {
        Self {
            cache: MatrixEntry::ALL.map(|entry| CachedFormula::new(entry.label())),
        }
    }
}

impl Default for FormulaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryEvaluator for FormulaEvaluator {
    fn evaluate(&mut self, entry: MatrixEntry, source: &str, t: f64) -> f64 {
        self.cache[entry.index()].evaluate(source, t)
    }
}

/// Static geometry uploaded at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Grid,
    Arrow,
}

/// One line-list draw under the frame transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub geometry: Geometry,
    pub color: Rgb,
}

/// Everything the GPU needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    /// Elapsed seconds the expressions were evaluated at.
    pub t: f64,
    /// Scaled entry values in `a, b, c, d` order.
    pub entries: [f64; 4],
    pub transform: FrameTransform,
    pub clear_color: Rgb,
    /// Draws in submission order; grid before arrow.
    pub draws: Vec<DrawCall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Initializing,
    Running,
    Closing,
    Terminated,
}

/// Outcome of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Iteration {
    /// Draw and present this plan.
    Render(FramePlan),
    /// Nothing to draw; wait this long before polling again.
    Idle(Duration),
    /// Stop iterating and release resources.
    Close,
}

pub struct RenderLoop<E> {
    evaluator: E,
    palette: Palette,
    phase: LoopPhase,
    frames: u64,
    last_plan: Option<FramePlan>,
}

impl<E: EntryEvaluator> RenderLoop<E> {
    pub fn new(evaluator: E, palette: Palette) -> Self {
        Self {
            evaluator,
            palette,
            phase: LoopPhase::Initializing,
            frames: 0,
            last_plan: None,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Frames planned since start-up.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Most recent plan, kept so a paused window can be repainted unchanged.
    pub fn last_plan(&self) -> Option<&FramePlan> {
        self.last_plan.as_ref()
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Marks set-up as complete.
    pub fn start(&mut self) {
        if self.phase == LoopPhase::Initializing {
            tracing::info!("render loop running");
            self.phase = LoopPhase::Running;
        }
    }

    /// Runs one iteration. `close_requested` is the window system's close
    /// signal as polled at the top of this iteration.
    pub fn iterate(&mut self, state: &SharedControlState, close_requested: bool) -> Iteration {
        match self.phase {
            LoopPhase::Initializing => Iteration::Idle(PAUSE_POLL_INTERVAL),
            LoopPhase::Closing | LoopPhase::Terminated => Iteration::Close,
            LoopPhase::Running => {
                if close_requested {
                    tracing::info!(frames = self.frames, "close requested; leaving render loop");
                    self.phase = LoopPhase::Closing;
                    return Iteration::Close;
                }
                if state.paused() {
                    return Iteration::Idle(PAUSE_POLL_INTERVAL);
                }
                Iteration::Render(self.plan_frame(state))
            }
        }
    }

    /// Marks resources as released.
    pub fn finish(&mut self) {
        if self.phase != LoopPhase::Terminated {
            self.phase = LoopPhase::Terminated;
            tracing::info!(frames = self.frames, "render loop terminated");
        }
    }

    fn plan_frame(&mut self, state: &SharedControlState) -> FramePlan {
        let t = state.elapsed_seconds();
        let entries = MatrixEntry::ALL.map(|entry| {
            let source = state.expression(entry);
            self.evaluator.evaluate(entry, &source, t) * state.scale(entry)
        });
        let [a, b, c, d] = entries.map(|value| value as f32);

        let mut draws = Vec::with_capacity(2);
        if state.show_grid() {
            draws.push(DrawCall {
                geometry: Geometry::Grid,
                color: self.palette.grid,
            });
        }
        if state.show_arrow() {
            draws.push(DrawCall {
                geometry: Geometry::Arrow,
                color: self.palette.arrow,
            });
        }

        let plan = FramePlan {
            t,
            entries,
            transform: build_matrix(a, b, c, d),
            clear_color: self.palette.background,
            draws,
        };
        self.frames += 1;
        self.last_plan = Some(plan.clone());
        plan
    }
}
