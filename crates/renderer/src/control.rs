//! Parameters shared between the control task and the render thread.
//!
//! Every field is synchronised on its own: scales and toggles are atomics,
//! each expression sits behind its own small lock, and the time origin is an
//! atomic offset from a fixed anchor. Readers may observe a mix of old and new
//! fields for one frame; nothing here promises cross-field consistency.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Range the control surface allows for each scale factor.
pub const SCALE_RANGE: (f64, f64) = (-2.0, 2.0);

/// One of the four matrix slots `[[a, b], [c, d]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixEntry {
    A,
    B,
    C,
    D,
}

impl MatrixEntry {
    pub const ALL: [MatrixEntry; 4] = [
        MatrixEntry::A,
        MatrixEntry::B,
        MatrixEntry::C,
        MatrixEntry::D,
    ];

    pub fn index(self) -> usize {
        match self {
            MatrixEntry::A => 0,
            MatrixEntry::B => 1,
            MatrixEntry::C => 2,
            MatrixEntry::D => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatrixEntry::A => "a",
            MatrixEntry::B => "b",
            MatrixEntry::C => "c",
            MatrixEntry::D => "d",
        }
    }
}

impl fmt::Display for MatrixEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MatrixEntry {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(MatrixEntry::A),
            "b" => Ok(MatrixEntry::B),
            "c" => Ok(MatrixEntry::C),
            "d" => Ok(MatrixEntry::D),
            other => Err(format!("unknown matrix entry '{other}'; expected a, b, c, or d")),
        }
    }
}

/// Initial values for a fresh [`SharedControlState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub expressions: [String; 4],
    pub scales: [f64; 4],
    pub paused: bool,
    pub show_grid: bool,
    pub show_arrow: bool,
}

impl Default for ControlSettings {
    /// A steady counter-clockwise rotation.
    fn default() -> Self {
        Self {
            expressions: [
                "cos(t)".to_string(),
                "sin(t)".to_string(),
                "-sin(t)".to_string(),
                "cos(t)".to_string(),
            ],
            scales: [1.0; 4],
            paused: false,
            show_grid: true,
            show_arrow: true,
        }
    }
}

/// Point-in-time copy of every field, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSnapshot {
    pub settings: ControlSettings,
    pub elapsed: Duration,
}

#[derive(Debug)]
struct ExpressionCell {
    source: RwLock<Arc<str>>,
}

impl ExpressionCell {
    fn new(source: &str) -> Self {
        Self {
            source: RwLock::new(Arc::from(source)),
        }
    }

    fn get(&self) -> Arc<str> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, source: &str) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(source);
    }
}

/// `f64` stored as its bit pattern.
#[derive(Debug)]
struct ScaleCell(AtomicU64);

impl ScaleCell {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(clamp_scale(value).to_bits()))
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, value: f64) -> f64 {
        let clamped = clamp_scale(value);
        self.0.store(clamped.to_bits(), Ordering::Relaxed);
        clamped
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(SCALE_RANGE.0, SCALE_RANGE.1)
    }
}

/// Elapsed time is measured from `anchor + offset`; reset moves the offset.
#[derive(Debug)]
struct TimeOrigin {
    anchor: Instant,
    offset_nanos: AtomicU64,
}

impl TimeOrigin {
    fn new() -> Self {
        Self {
            anchor: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    fn since_anchor(&self) -> u64 {
        u64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn reset(&self) {
        self.offset_nanos
            .fetch_max(self.since_anchor(), Ordering::AcqRel);
    }

    fn elapsed(&self) -> Duration {
        let offset = self.offset_nanos.load(Ordering::Acquire);
        Duration::from_nanos(self.since_anchor().saturating_sub(offset))
    }
}

/// Thread-shared control parameters; wrap in an `Arc` to hand out.
#[derive(Debug)]
pub struct SharedControlState {
    expressions: [ExpressionCell; 4],
    scales: [ScaleCell; 4],
    paused: AtomicBool,
    show_grid: AtomicBool,
    show_arrow: AtomicBool,
    origin: TimeOrigin,
}

impl SharedControlState {
    pub fn new(settings: &ControlSettings) -> Self {
        Self {
            expressions: std::array::from_fn(|i| ExpressionCell::new(&settings.expressions[i])),
            scales: std::array::from_fn(|i| ScaleCell::new(settings.scales[i])),
            paused: AtomicBool::new(settings.paused),
            show_grid: AtomicBool::new(settings.show_grid),
            show_arrow: AtomicBool::new(settings.show_arrow),
            origin: TimeOrigin::new(),
        }
    }

    pub fn shared(settings: &ControlSettings) -> Arc<Self> {
        Arc::new(Self::new(settings))
    }

    pub fn expression(&self, entry: MatrixEntry) -> Arc<str> {
        self.expressions[entry.index()].get()
    }

    pub fn set_expression(&self, entry: MatrixEntry, source: &str) {
        self.expressions[entry.index()].set(source);
    }

    pub fn scale(&self, entry: MatrixEntry) -> f64 {
        self.scales[entry.index()].get()
    }

    /// Stores `value` clamped to [`SCALE_RANGE`] and returns what was stored.
    pub fn set_scale(&self, entry: MatrixEntry, value: f64) -> f64 {
        self.scales[entry.index()].set(value)
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// Flips the flag and returns the new value.
    pub fn toggle_paused(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid.load(Ordering::Relaxed)
    }

    pub fn set_show_grid(&self, visible: bool) {
        self.show_grid.store(visible, Ordering::Relaxed);
    }

    pub fn toggle_show_grid(&self) -> bool {
        !self.show_grid.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn show_arrow(&self) -> bool {
        self.show_arrow.load(Ordering::Relaxed)
    }

    pub fn set_show_arrow(&self, visible: bool) {
        self.show_arrow.store(visible, Ordering::Relaxed);
    }

    pub fn toggle_show_arrow(&self) -> bool {
        !self.show_arrow.fetch_xor(true, Ordering::Relaxed)
    }

    /// Moves the time origin to now.
    pub fn reset_time_origin(&self) {
        self.origin.reset();
    }

    /// `now - time_origin`; never negative.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            settings: ControlSettings {
                expressions: MatrixEntry::ALL.map(|entry| self.expression(entry).to_string()),
                scales: MatrixEntry::ALL.map(|entry| self.scale(entry)),
                paused: self.paused(),
                show_grid: self.show_grid(),
                show_arrow: self.show_arrow(),
            },
            elapsed: self.elapsed(),
        }
    }
}

impl Default for SharedControlState {
    fn default() -> Self {
        Self::new(&ControlSettings::default())
    }
}
