//! Static description of every host-visible parameter.
//!
//! The host only ever sees normalized floats between 0 and 1. The state tree stores "plain" values
//! within each parameter's own range (for example, 0 to 127 for the note number), and this module
//! holds the ranges and text conversions needed to move between the two.

use crate::waveform::Waveform;

/// The four logical parameters, in host index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Param {
    Waveform,
    MidiNoteNumber,
    Level,
    Loud,
}

impl Param {
    pub const COUNT: usize = 4;

    pub const ALL: [Param; Self::COUNT] = [
        Param::Waveform,
        Param::MidiNoteNumber,
        Param::Level,
        Param::Loud,
    ];

    /// Maps a VST parameter index to a parameter.
    pub fn from_index(index: i32) -> Option<Self> {
        if index < 0 {
            return None;
        }
        Self::ALL.get(index as usize).copied()
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|param| param.id() == id)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ParamSpec {
        let spec = &SPECS[self.index()];
        debug_assert_eq!(spec.param, self);
        spec
    }

    /// Stable symbolic identifier used for automation and serialization.
    pub fn id(self) -> &'static str {
        self.spec().id
    }
}

/// A linear range with an optional step size. A step of zero means continuous.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub start: f32,
    pub end: f32,
    pub step: f32,
}

impl ParamRange {
    pub const fn new(start: f32, end: f32, step: f32) -> Self {
        Self { start, end, step }
    }

    /// Snaps a plain value to the nearest legal value within this range.
    pub fn snap(&self, plain: f32) -> f32 {
        let snapped = if self.step > 0. {
            self.start + self.step * ((plain - self.start) / self.step).round()
        } else {
            plain
        };
        snapped.max(self.start).min(self.end)
    }

    pub fn normalize(&self, plain: f32) -> f32 {
        ((self.snap(plain) - self.start) / (self.end - self.start))
            .max(0.)
            .min(1.)
    }

    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.max(0.).min(1.);
        self.snap(self.start + normalized * (self.end - self.start))
    }
}

/// Everything the host needs to know about one parameter.
pub struct ParamSpec {
    pub param: Param,
    pub id: &'static str,
    pub name: &'static str,
    pub label: &'static str,
    pub range: ParamRange,
    /// Default plain value.
    pub default: f32,
    pub to_text: fn(f32) -> String,
    pub from_text: fn(&str) -> f32,
}

static SPECS: [ParamSpec; Param::COUNT] = [
    ParamSpec {
        param: Param::Waveform,
        id: "waveform",
        name: "Waveform",
        label: "",
        range: ParamRange::new(0., (Waveform::CHOICES - 1) as f32, 1.),
        default: 0.,
        to_text: Waveform::float_to_text,
        from_text: Waveform::text_to_float,
    },
    ParamSpec {
        param: Param::MidiNoteNumber,
        id: "midiNoteNumber",
        name: "Midi Note Number",
        label: "",
        range: ParamRange::new(0., 127., 1.),
        default: 60.,
        to_text: note_text,
        from_text: text_to_note,
    },
    ParamSpec {
        // Shown to the user as 0-10, applied to audio as a 0-1 multiplier.
        param: Param::Level,
        id: "level",
        name: "Level",
        label: "/10",
        range: ParamRange::new(0., 10., 0.),
        default: 5.,
        to_text: |value| format!("{}", value),
        from_text: parse_leading_float,
    },
    ParamSpec {
        param: Param::Loud,
        id: "loud",
        name: "Loud",
        label: "",
        range: ParamRange::new(0., 1., 1.),
        default: 0.,
        to_text: |value| if value < 0.5 { "no" } else { "yes" }.to_string(),
        from_text: |text| if text.trim() == "yes" { 1. } else { 0. },
    },
];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave number given to MIDI note 60.
const MIDDLE_C_OCTAVE: i32 = 4;

/// Names a MIDI note with sharps and octave number, e.g. 60 is "C4".
pub fn note_name(note: i32) -> String {
    let note = note.max(0).min(127);
    format!(
        "{}{}",
        NOTE_NAMES[(note % 12) as usize],
        note / 12 + MIDDLE_C_OCTAVE - 5
    )
}

/// Frequency in Hz of a MIDI note in twelve-tone equal temperament, A4 = 440 Hz.
pub fn note_to_hz(note: i32) -> f64 {
    440. * 2f64.powf((note as f64 - 69.) / 12.)
}

fn note_text(value: f32) -> String {
    note_name(value as i32)
}

/// Accepts either a plain number or a note name like "C#4" or "Eb-1". Anything else is 0.
fn text_to_note(text: &str) -> f32 {
    let text = text.trim();
    parse_note_name(text)
        .map(|note| note as f32)
        .unwrap_or_else(|| parse_leading_float(text))
}

fn parse_note_name(text: &str) -> Option<i32> {
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let pitch_class = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (accidental, octave) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };
    let octave: i32 = octave.parse().ok()?;
    // Octaves far outside the MIDI range are still parsed; the caller snaps the result.
    octave
        .checked_add(5 - MIDDLE_C_OCTAVE)?
        .checked_mul(12)?
        .checked_add(pitch_class + accidental)
}

/// Parses the longest numeric prefix of `text`, returning 0 if there is none.
fn parse_leading_float(text: &str) -> f32 {
    let text = text.trim();
    (1..=text.len())
        .rev()
        .filter(|end| text.is_char_boundary(*end))
        .find_map(|end| text[..end].parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.)
}
