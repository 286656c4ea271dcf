//! The working values are the audio thread's ready-to-use copies of each parameter. They are
//! written by state tree listeners on whichever thread delivered the change, and read by the audio
//! callback without taking any lock.
//!
//! Each field is an independent atomic scalar. Nothing guarantees that two fields changed
//! "together" are observed together; the audio path snapshots all four once per callback and at
//! worst uses one stale field for a single buffer.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::parameters::Param;
use crate::waveform::Waveform;

/// A working value converted out of the host's float representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WorkingValue {
    Waveform(Waveform),
    NoteNumber(u8),
    Level(f32),
    Loud(bool),
}

/// How one parameter's plain value is projected into its working value.
struct Projection {
    param: Param,
    project: fn(f32) -> WorkingValue,
    /// Inverse of `project`, used when working values are imported from a document.
    plain: fn(WorkingValue) -> Option<f32>,
}

/// Level is stored by the host as 0-10 but applied as a 0-1 multiplier.
pub const LEVEL_SCALE: f32 = 0.1;

/// Dispatch table, indexed by `Param::index`.
static PROJECTIONS: [Projection; Param::COUNT] = [
    Projection {
        param: Param::Waveform,
        project: |plain| WorkingValue::Waveform(Waveform::from_index((plain + 0.5) as i32)),
        plain: |value| match value {
            WorkingValue::Waveform(waveform) => Some(waveform.index() as f32),
            _ => None,
        },
    },
    Projection {
        param: Param::MidiNoteNumber,
        project: |plain| WorkingValue::NoteNumber(plain.max(0.).min(127.) as u8),
        plain: |value| match value {
            WorkingValue::NoteNumber(note) => Some(note as f32),
            _ => None,
        },
    },
    Projection {
        param: Param::Level,
        project: |plain| WorkingValue::Level(plain * LEVEL_SCALE),
        plain: |value| match value {
            WorkingValue::Level(level) => Some(level / LEVEL_SCALE),
            _ => None,
        },
    },
    Projection {
        param: Param::Loud,
        project: |plain| WorkingValue::Loud(plain >= 0.5),
        plain: |value| match value {
            WorkingValue::Loud(loud) => Some(if loud { 1. } else { 0. }),
            _ => None,
        },
    },
];

impl WorkingValue {
    /// Converts a plain state tree value for `param` into its working representation.
    pub fn project(param: Param, plain: f32) -> Self {
        let projection = &PROJECTIONS[param.index()];
        debug_assert_eq!(projection.param, param);
        (projection.project)(plain)
    }

    /// The plain state tree value that projects back to this working value, if it belongs to
    /// `param`.
    pub fn to_plain(self, param: Param) -> Option<f32> {
        (PROJECTIONS[param.index()].plain)(self)
    }
}

/// A consistent-enough copy of all working values, taken once per audio callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkingSnapshot {
    pub waveform: Waveform,
    pub note_number: u8,
    pub level: f32,
    pub loud: bool,
}

impl Default for WorkingSnapshot {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            note_number: 60,
            level: 0.5,
            loud: false,
        }
    }
}

pub struct WorkingValues {
    waveform: AtomicU8,
    note_number: AtomicU8,
    /// Bit pattern of an `f32`.
    level: AtomicU32,
    loud: AtomicBool,
}

impl Default for WorkingValues {
    fn default() -> Self {
        let defaults = WorkingSnapshot::default();
        Self {
            waveform: AtomicU8::new(defaults.waveform.index() as u8),
            note_number: AtomicU8::new(defaults.note_number),
            level: AtomicU32::new(defaults.level.to_bits()),
            loud: AtomicBool::new(defaults.loud),
        }
    }
}

impl WorkingValues {
    pub fn store(&self, value: WorkingValue) {
        match value {
            WorkingValue::Waveform(waveform) => self
                .waveform
                .store(waveform.index() as u8, Ordering::Relaxed),
            WorkingValue::NoteNumber(note) => self.note_number.store(note, Ordering::Relaxed),
            WorkingValue::Level(level) => self.level.store(level.to_bits(), Ordering::Relaxed),
            WorkingValue::Loud(loud) => self.loud.store(loud, Ordering::Relaxed),
        }
    }

    /// Listener entry point: projects a plain state tree value and stores it.
    pub fn apply(&self, param: Param, plain: f32) {
        self.store(WorkingValue::project(param, plain));
    }

    pub fn get(&self, param: Param) -> WorkingValue {
        match param {
            Param::Waveform => WorkingValue::Waveform(self.waveform()),
            Param::MidiNoteNumber => {
                WorkingValue::NoteNumber(self.note_number.load(Ordering::Relaxed))
            }
            Param::Level => WorkingValue::Level(f32::from_bits(self.level.load(Ordering::Relaxed))),
            Param::Loud => WorkingValue::Loud(self.loud.load(Ordering::Relaxed)),
        }
    }

    fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed) as i32)
    }

    pub fn snapshot(&self) -> WorkingSnapshot {
        WorkingSnapshot {
            waveform: self.waveform(),
            note_number: self.note_number.load(Ordering::Relaxed),
            level: f32::from_bits(self.level.load(Ordering::Relaxed)),
            loud: self.loud.load(Ordering::Relaxed),
        }
    }
}
