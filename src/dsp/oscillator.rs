use std::f64::consts::PI;

use crate::waveform::Waveform;

/// A naive (non-band-limited) single oscillator.
///
/// Phase runs from 0 to 1 over one period. Frequency is normalized, in cycles per sample. Neither
/// setter validates its input, and nothing here allocates, so it is safe to reconfigure from the
/// audio thread at any time.
#[derive(Clone, Debug, Default)]
pub(crate) struct Oscillator {
    waveform: Waveform,
    phase: f64,
    frequency: f64,
}

impl Oscillator {
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn set_frequency(&mut self, normalized: f64) {
        self.frequency = normalized;
    }

    #[cfg(test)]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Returns the waveform's value at the current phase, then advances the phase. Must be called
    /// exactly once per output sample.
    pub fn get_sample(&mut self) -> f32 {
        let phase = self.phase;
        let sample = match self.waveform {
            Waveform::Sine => (2. * PI * phase).sin(),
            Waveform::Triangle => 4. * (0.5 - (phase - 0.5).abs()) - 1.,
            Waveform::Square => {
                if phase < 0.5 {
                    1.
                } else {
                    -1.
                }
            }
            Waveform::Sawtooth => 2. * phase - 1.,
        };

        self.phase += self.frequency;
        self.phase -= self.phase.floor();
        // Tiny negative phases round up to exactly 1 above, and a non-finite frequency leaves NaN.
        if !(self.phase >= 0. && self.phase < 1.) {
            self.phase = 0.;
        }

        sample as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillator(waveform: Waveform, frequency: f64) -> Oscillator {
        let mut osc = Oscillator::default();
        osc.set_waveform(waveform);
        osc.set_frequency(frequency);
        osc
    }

    #[test]
    fn square_is_exactly_plus_or_minus_one() {
        for frequency in [0.001, 0.01, 0.1, 0.37].iter() {
            let mut osc = oscillator(Waveform::Square, *frequency);
            for _ in 0..1000 {
                let phase = osc.phase();
                let expected = if phase < 0.5 { 1. } else { -1. };
                assert_eq!(osc.get_sample(), expected);
            }
        }
    }

    #[test]
    fn sawtooth_ramps_over_one_period() {
        let mut osc = oscillator(Waveform::Sawtooth, 0.25);
        let samples: Vec<f32> = (0..5).map(|_| osc.get_sample()).collect();
        assert_eq!(samples, vec![-1., -0.5, 0., 0.5, -1.]);
    }

    #[test]
    fn triangle_peaks_mid_period() {
        let mut osc = oscillator(Waveform::Triangle, 0.25);
        let samples: Vec<f32> = (0..4).map(|_| osc.get_sample()).collect();
        assert_eq!(samples, vec![-1., 0., 1., 0.]);
    }

    #[test]
    fn sine_follows_phase() {
        let mut osc = oscillator(Waveform::Sine, 0.25);
        let samples: Vec<f32> = (0..4).map(|_| osc.get_sample()).collect();
        let expected = [0., 1., 0., -1.];
        for (sample, expected) in samples.iter().zip(expected.iter()) {
            assert!((sample - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn phase_wraps_for_any_frequency() {
        let mut osc = oscillator(Waveform::Sine, -0.3);
        for _ in 0..100 {
            osc.get_sample();
            assert!(osc.phase() >= 0. && osc.phase() < 1.);
        }
        osc.set_frequency(2.7);
        for _ in 0..100 {
            osc.get_sample();
            assert!(osc.phase() >= 0. && osc.phase() < 1.);
        }
    }

    #[test]
    fn recovers_from_non_finite_frequency() {
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN].iter() {
            let mut osc = oscillator(Waveform::Sawtooth, *bad);
            osc.get_sample();
            assert_eq!(osc.phase(), 0.);

            osc.set_frequency(0.25);
            let samples: Vec<f32> = (0..4).map(|_| osc.get_sample()).collect();
            assert_eq!(samples, vec![-1., -0.5, 0., 0.5]);
        }
    }
}
