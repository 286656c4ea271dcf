//! The plugin's digital signal processing is fully implemented within this module.
//!
//! Parameter values are never received through locks during audio processing. Instead, the audio
//! thread holds a handle to the parameter store's atomic working values and takes one snapshot of
//! them per callback. The oscillator is reconfigured from that snapshot, so live changes to the
//! note number or waveform are picked up at the next buffer without any separate notification.

use std::sync::Arc;

use vst::buffer::{AudioBuffer, Outputs};

use crate::parameters::note_to_hz;
use crate::working_values::{WorkingSnapshot, WorkingValues};

mod oscillator;
use oscillator::Oscillator;

/// Sample rate assumed until the host reports one.
const DEFAULT_SAMPLE_RATE: f64 = 44100.;
const DEFAULT_BLOCK_SIZE: usize = 512;

/// Gain applied on top of the level when the "loud" toggle is on.
const LOUD_BOOST: f32 = 2.;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EngineStage {
    /// No sample rate has been reported yet; output is silent.
    Unprepared,
    Prepared,
    Processing,
}

/// Only mono or stereo output is supported, and the input layout must match the output layout.
pub(crate) fn is_layout_supported(inputs: usize, outputs: usize) -> bool {
    (outputs == 1 || outputs == 2) && inputs == outputs
}

/// Anything audio can be written into, one sample at a time.
pub(crate) trait OutputChannels {
    fn write(&mut self, channel: usize, frame: usize, value: f32);
}

impl OutputChannels for Outputs<'_, f32> {
    fn write(&mut self, channel: usize, frame: usize, value: f32) {
        self[channel][frame] = value;
    }
}

impl OutputChannels for [Vec<f32>] {
    fn write(&mut self, channel: usize, frame: usize, value: f32) {
        self[channel][frame] = value;
    }
}

/// Handles all audio processing algorithms for the plugin.
pub(super) struct PluginDsp {
    oscillator: Oscillator,
    working: Arc<WorkingValues>,

    sample_rate: f64,
    max_block_size: usize,
    stage: EngineStage,
}

impl PluginDsp {
    pub fn new(working: Arc<WorkingValues>) -> Self {
        Self {
            oscillator: Oscillator::default(),
            working,
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: DEFAULT_BLOCK_SIZE,
            stage: EngineStage::Unprepared,
        }
    }

    #[cfg(test)]
    pub fn stage(&self) -> EngineStage {
        self.stage
    }

    /// Called whenever the sample rate or block size changes. May be called repeatedly while the
    /// plugin is not processing.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.stage = EngineStage::Prepared;
        let snapshot = self.working.snapshot();
        self.configure(&snapshot);
        log::info!(
            "prepared at {} Hz, up to {} samples per block",
            sample_rate,
            max_block_size
        );
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.prepare(sample_rate, self.max_block_size);
    }

    pub fn set_block_size(&mut self, max_block_size: usize) {
        self.prepare(self.sample_rate, max_block_size);
    }

    /// The host has stopped calling `process` for now.
    pub fn suspend(&mut self) {
        if self.stage == EngineStage::Processing {
            self.stage = EngineStage::Prepared;
        }
    }

    fn configure(&mut self, snapshot: &WorkingSnapshot) {
        self.oscillator.set_waveform(snapshot.waveform);
        self.oscillator
            .set_frequency(note_to_hz(snapshot.note_number as i32) / self.sample_rate);
    }

    /// Writes the next block of audio into the host's output buffer.
    pub fn process(&mut self, buffer: &mut AudioBuffer<f32>) {
        let num_samples = buffer.samples();
        let num_inputs = buffer.input_count();
        let num_outputs = buffer.output_count();

        let (_, mut outputs) = buffer.split();
        self.render(&mut outputs, num_inputs, num_outputs, num_samples);
    }

    /// Renders `num_samples` frames, writing the same mono signal to every output channel.
    pub fn render<O: OutputChannels + ?Sized>(
        &mut self,
        outputs: &mut O,
        num_inputs: usize,
        num_outputs: usize,
        num_samples: usize,
    ) {
        if self.stage == EngineStage::Unprepared || !is_layout_supported(num_inputs, num_outputs) {
            for channel in 0..num_outputs {
                for frame in 0..num_samples {
                    outputs.write(channel, frame, 0.);
                }
            }
            return;
        }
        self.stage = EngineStage::Processing;

        let snapshot = self.working.snapshot();
        self.configure(&snapshot);

        let mut gain = snapshot.level;
        if snapshot.loud {
            gain *= LOUD_BOOST;
        }

        for frame in 0..num_samples {
            let sample = self.oscillator.get_sample() * gain;
            for channel in 0..num_outputs {
                outputs.write(channel, frame, sample);
            }
        }
    }
}
