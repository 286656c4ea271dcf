//! The oscillator's waveform shape is a choice out of a small, fixed, ordered list. The index into
//! that list is the authoritative value; the name is only used for display and serialization.

/// Canonical names of each waveform, in index order.
pub const NAMES: [&str; Waveform::CHOICES] = ["Sine", "Triangle", "Square", "Sawtooth"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Sine
    }
}

impl Waveform {
    /// Number of selectable waveforms.
    pub const CHOICES: usize = 4;

    const ALL: [Waveform; Self::CHOICES] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::Sawtooth,
    ];

    /// Returns the waveform at `index`, clamping out-of-range values to the nearest valid one.
    pub fn from_index(index: i32) -> Self {
        let clamped = index.max(0).min(Self::CHOICES as i32 - 1);
        Self::ALL[clamped as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// Exact name lookup, without any fallback.
    pub fn lookup(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|i| Self::ALL[i])
    }

    /// Looks up a waveform by name. Unknown names are an internal error: debug builds panic, and
    /// release builds fall back to `Sine`.
    #[allow(dead_code)]
    pub fn from_name(name: &str) -> Self {
        match Self::lookup(name) {
            Some(waveform) => waveform,
            None => {
                debug_assert!(false, "invalid waveform name {:?}", name);
                Waveform::default()
            }
        }
    }

    /// Clamping setter, used where an existing selector is updated in place.
    #[allow(dead_code)]
    pub fn set_index(&mut self, index: i32) {
        *self = Self::from_index(index);
    }

    /// Host text to parameter value. Text the host sends back is user-typed, so unknown names map
    /// to index 0 rather than tripping the internal assertion in `from_name`.
    pub fn text_to_float(text: &str) -> f32 {
        Self::lookup(text.trim()).unwrap_or_default().index() as f32
    }

    /// Parameter value to host text. Rounds by adding 0.5 and truncating, which is how hosts
    /// render intermediate automation values.
    pub fn float_to_text(value: f32) -> String {
        Self::from_index((value + 0.5) as i32).name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_index_round_trip() {
        for i in 0..Waveform::CHOICES as i32 {
            let name = Waveform::from_index(i).name();
            assert_eq!(Waveform::from_name(name).name(), name);
            assert_eq!(Waveform::from_name(name).index(), i as usize);
        }
    }

    #[test]
    fn out_of_range_indices_clamp() {
        assert_eq!(Waveform::from_index(-5), Waveform::Sine);
        assert_eq!(Waveform::from_index(99), Waveform::Sawtooth);

        let mut waveform = Waveform::Square;
        waveform.set_index(-1);
        assert_eq!(waveform, Waveform::Sine);
        waveform.set_index(4);
        assert_eq!(waveform, Waveform::Sawtooth);
    }

    #[test]
    fn text_float_round_trip() {
        for name in NAMES.iter() {
            assert_eq!(Waveform::float_to_text(Waveform::text_to_float(name)), *name);
        }
    }

    #[test]
    fn float_to_text_rounds_half_up() {
        assert_eq!(Waveform::float_to_text(0.49), "Sine");
        assert_eq!(Waveform::float_to_text(0.5), "Triangle");
        assert_eq!(Waveform::float_to_text(2.6), "Sawtooth");
        assert_eq!(Waveform::float_to_text(7.0), "Sawtooth");
    }

    #[test]
    fn unknown_text_maps_to_first_waveform() {
        assert_eq!(Waveform::text_to_float("Noise"), 0.0);
        assert_eq!(Waveform::lookup("sine"), None);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid waveform name")]
    fn from_name_asserts_on_unknown_name() {
        Waveform::from_name("Pulse");
    }
}
