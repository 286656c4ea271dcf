//! simple-synth is a minimal VST2 instrument: a single oscillator with four automatable
//! parameters (waveform, MIDI note number, level and a loudness boost), an undoable parameter
//! state, and a small control panel.
//!
//! The interesting parts are the real-time path and the parameter synchronization model. Every
//! parameter change, whether it comes from host automation, the control panel, undo/redo or a
//! restored preset, is written to the state tree. Listeners project each change into atomic
//! working values, which the audio thread reads without locking.

use std::sync::Arc;

use vst::{
    api::{Events, Supported},
    buffer::AudioBuffer,
    editor::Editor,
    plugin::{CanDo, Category, HostCallback, Info, Plugin, PluginParameters},
};

mod dsp;
use dsp::PluginDsp;

mod editor;
use editor::PluginEditor;

mod parameters;
use parameters::Param;

mod plugin_state;
use plugin_state::PluginState;

mod state_tree;
mod waveform;
mod working_values;

/// Top level wrapper that exposes a full `vst::Plugin` implementation.
struct SimpleSynthVst {
    /// The `PluginDsp` handles all of the plugin's audio processing, and is only accessed from the
    /// audio processing thread.
    dsp: PluginDsp,

    /// The `PluginState` holds the long-term state of the plugin and distributes parameter updates
    /// as they occur to other parts of the plugin. It is shared on both the audio processing thread
    /// and the UI thread, and updated using thread-safe interior mutability.
    state_handle: Arc<PluginState>,

    /// The `PluginEditor` implements the plugin's control panel. It's temporarily stored here until
    /// being moved to the UI thread by the first `get_editor` method call.
    editor_placeholder: Option<PluginEditor>,
}

impl SimpleSynthVst {
    /// Initializes the VST plugin, along with an optional `HostCallback` handle.
    fn new_maybe_host(maybe_host: Option<HostCallback>) -> Self {
        // Another plugin instance in the same process may already have installed a logger.
        let _ = env_logger::try_init();

        let state_handle = Arc::new(PluginState::new(maybe_host));

        let editor_placeholder = Some(PluginEditor::new(Arc::clone(&state_handle)));

        let dsp = PluginDsp::new(state_handle.working_values());

        log::info!("simple-synth instance created");

        Self {
            dsp,
            state_handle,
            editor_placeholder,
        }
    }
}

/// `vst::plugin_main` requires a `Default` implementation.
impl Default for SimpleSynthVst {
    fn default() -> Self {
        Self::new_maybe_host(None)
    }
}

/// Main `vst` plugin implementation.
impl Plugin for SimpleSynthVst {
    fn new(host: HostCallback) -> Self {
        Self::new_maybe_host(Some(host))
    }

    fn get_info(&self) -> Info {
        /// Use a hash of a string describing this plugin to avoid unique ID conflicts.
        const UNIQUE_ID_SEED: &str = "simple-synth Single Oscillator VST2 Instrument";
        static UNIQUE_ID: once_cell::sync::Lazy<i32> = once_cell::sync::Lazy::new(|| {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};

            let mut s = DefaultHasher::new();
            UNIQUE_ID_SEED.hash(&mut s);
            s.finish() as i32
        });

        Info {
            name: "simple-synth".to_string(),
            vendor: "simple-synth".to_string(),
            unique_id: *UNIQUE_ID,
            category: Category::Synth,
            inputs: 2,
            outputs: 2,
            midi_inputs: 1,
            parameters: Param::COUNT as i32,
            initial_delay: 0,
            preset_chunks: true,
            ..Info::default()
        }
    }

    fn set_sample_rate(&mut self, rate: f32) {
        self.dsp.set_sample_rate(rate as f64);
    }

    fn set_block_size(&mut self, size: i64) {
        self.dsp.set_block_size(size.max(0) as usize);
    }

    fn suspend(&mut self) {
        self.dsp.suspend();
    }

    fn process(&mut self, buffer: &mut AudioBuffer<f32>) {
        self.dsp.process(buffer);
    }

    /// The note number is a parameter, not something played; incoming MIDI is accepted and
    /// ignored.
    fn process_events(&mut self, _events: &Events) {}

    fn can_do(&self, can_do: CanDo) -> Supported {
        match can_do {
            CanDo::ReceiveEvents | CanDo::ReceiveMidiEvent => Supported::Yes,
            _ => Supported::Maybe,
        }
    }

    fn get_parameter_object(&mut self) -> Arc<dyn PluginParameters> {
        Arc::clone(&self.state_handle) as Arc<dyn PluginParameters>
    }

    fn get_editor(&mut self) -> Option<Box<dyn Editor>> {
        self.editor_placeholder
            .take()
            .map(|editor| Box::new(editor) as Box<dyn Editor>)
    }
}

vst::plugin_main!(SimpleSynthVst);
