use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::control::SharedControlState;
use crate::frame::{FormulaEvaluator, FramePlan, Iteration, RenderLoop};
use crate::gpu::GpuState;
use crate::types::RendererConfig;

/// Window keys that map onto control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    TogglePause,
    ToggleGrid,
    ToggleArrow,
    ResetTime,
}

impl Shortcut {
    /// Maps a single typed character; case-insensitive.
    pub fn from_character(value: &str) -> Option<Self> {
        let mut chars = value.chars();
        let ch = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        match ch.to_ascii_lowercase() {
            ' ' => Some(Self::TogglePause),
            'g' => Some(Self::ToggleGrid),
            'v' => Some(Self::ToggleArrow),
            'r' => Some(Self::ResetTime),
            _ => None,
        }
    }
}

/// Notifications from the render thread to whoever owns the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    /// A shortcut key was pressed; the receiver decides what it changes.
    Key(Shortcut),
    /// The render loop has terminated and GPU resources are released.
    Closed,
}

#[derive(Debug, Clone)]
enum WindowCommand {
    Shutdown,
}

enum KeyAction {
    Forward(Shortcut),
    Close,
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match &event.logical_key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Close),
        Key::Named(NamedKey::Space) => Some(KeyAction::Forward(Shortcut::TogglePause)),
        Key::Character(value) => Shortcut::from_character(value.as_str()).map(KeyAction::Forward),
        _ => None,
    }
}

/// Handle to the window thread. The thread owns the window, the GPU state
/// and the render loop; it only reads the shared control state.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    signals: Receiver<WindowSignal>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    /// Spawns the window thread and blocks until its GPU set-up finishes.
    /// Set-up failures are returned here rather than left in the thread.
    pub fn spawn(config: RendererConfig, state: Arc<SharedControlState>) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (signal_tx, signal_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("lintrans-window".into())
            .spawn(move || run_window_thread(config, state, ready_tx, signal_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = match ready_rx.recv() {
            Ok(Ok(proxy)) => proxy,
            Ok(Err(err)) => {
                let _ = handle.join();
                return Err(err);
            }
            Err(_) => {
                return Err(match handle.join() {
                    Ok(Err(err)) => err.context("window thread failed to initialise"),
                    Ok(Ok(())) => anyhow!("window thread exited before signalling readiness"),
                    Err(panic) => anyhow!("window thread panicked: {panic:?}"),
                });
            }
        };

        Ok(Self {
            proxy,
            signals: signal_rx,
            join_handle: Some(handle),
        })
    }

    /// Shortcut and lifecycle notifications; suitable for `select!`.
    pub fn signals(&self) -> &Receiver<WindowSignal> {
        &self.signals
    }

    /// Asks the render loop to close and waits for the thread to finish.
    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

/// Field order matters: the surface in `gpu` must drop before `window`.
struct WindowState {
    gpu: GpuState,
    window: Arc<Window>,
    render_loop: RenderLoop<FormulaEvaluator>,
    pending: Option<FramePlan>,
    close_requested: bool,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let gpu = GpuState::new(window.as_ref(), window.inner_size(), config)?;
        Ok(Self {
            gpu,
            window,
            render_loop: RenderLoop::new(FormulaEvaluator::new(), config.palette),
            pending: None,
            close_requested: false,
        })
    }

    /// Draws the freshly planned frame, or repaints the last one (resize or
    /// expose while paused). Returns `false` when the loop must stop.
    fn redraw(&mut self) -> bool {
        let plan = match self.pending.take() {
            Some(plan) => plan,
            None => match self.render_loop.last_plan() {
                Some(plan) => plan.clone(),
                None => return true,
            },
        };
        match self.gpu.render(&plan) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; closing window");
                false
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                true
            }
            Err(other) => {
                warn!("surface error: {other:?}; retrying next frame");
                true
            }
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    control: Arc<SharedControlState>,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>>>,
    signal_tx: Sender<WindowSignal>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }

    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let _ = ready_tx.send(Err(anyhow!("failed to create event loop: {err}")));
            return Ok(());
        }
    };
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = match WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let _ = ready_tx.send(Err(anyhow!("failed to create window: {err}")));
            return Ok(());
        }
    };

    let mut state = match WindowState::new(window, &config) {
        Ok(state) => state,
        Err(err) => {
            let _ = ready_tx.send(Err(err.context("failed to initialise window renderer")));
            return Ok(());
        }
    };

    state.render_loop.start();
    let _ = ready_tx.send(Ok(proxy));

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(WindowCommand::Shutdown) => state.close_requested = true,
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                state.close_requested = true;
            }
            WindowEvent::KeyboardInput { event, .. } => match key_action(&event) {
                Some(KeyAction::Close) => state.close_requested = true,
                Some(KeyAction::Forward(shortcut)) => {
                    let _ = signal_tx.send(WindowSignal::Key(shortcut));
                }
                None => {}
            },
            WindowEvent::Resized(new_size) => {
                state.gpu.resize(new_size);
                state.window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let _ = inner_size_writer.request_inner_size(state.gpu.size());
            }
            WindowEvent::RedrawRequested => {
                if !state.redraw() {
                    state.close_requested = true;
                }
            }
            _ => {}
        },
        Event::AboutToWait => match state.render_loop.iterate(&control, state.close_requested) {
            Iteration::Render(plan) => {
                tracing::trace!(t = plan.t, entries = ?plan.entries, "frame planned");
                state.pending = Some(plan);
                state.window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            }
            Iteration::Idle(interval) => {
                elwt.set_control_flow(ControlFlow::WaitUntil(Instant::now() + interval));
            }
            Iteration::Close => {
                state.render_loop.finish();
                elwt.exit();
            }
        },
        Event::LoopExiting => {
            info!(frames = state.render_loop.frames(), "window closed");
            let _ = signal_tx.send(WindowSignal::Closed);
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_letters_are_case_insensitive() {
        assert_eq!(Shortcut::from_character("g"), Some(Shortcut::ToggleGrid));
        assert_eq!(Shortcut::from_character("G"), Some(Shortcut::ToggleGrid));
        assert_eq!(Shortcut::from_character("V"), Some(Shortcut::ToggleArrow));
        assert_eq!(Shortcut::from_character("r"), Some(Shortcut::ResetTime));
    }

    #[test]
    fn space_character_toggles_pause() {
        assert_eq!(Shortcut::from_character(" "), Some(Shortcut::TogglePause));
    }

    #[test]
    fn other_characters_are_ignored() {
        assert_eq!(Shortcut::from_character("x"), None);
        assert_eq!(Shortcut::from_character("gg"), None);
        assert_eq!(Shortcut::from_character(""), None);
    }
}
