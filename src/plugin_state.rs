//! The parameter store keeps the state tree as the single "source of truth" for the long-term state
//! of the plugin. As used by the VST API, it is accessible by both the audio processing thread and
//! the UI thread, and updated using thread-safe interior mutability.
//!
//! Changes only ever flow one way out of the tree: listeners registered here project each new value
//! into the audio thread's atomic working values, and forward it to whichever UI controls are
//! currently attached. Nothing writes to the working values directly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vst::{
    host::Host,
    plugin::{HostCallback, PluginParameters},
};

use crate::parameters::Param;
use crate::state_tree::{Document, StateTree};
use crate::waveform::Waveform;
use crate::working_values::{WorkingValue, WorkingValues};

/// Root tag of the persisted state document.
pub const SCHEMA_ID: &str = "SimpleSynth";

/// Describes a change in the state tree that an attached control should display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StateUpdate {
    SetParameter(Param, f32),
}

/// Receiving end of a live binding between a UI control and a parameter. Updates may arrive on any
/// thread.
pub trait Control: Send {
    fn update(&mut self, plain: f32);
}

/// A live binding of one control to one parameter. Creating it pushes the parameter's current value
/// to the control; dropping it unbinds the control.
pub struct Attachment {
    param: Param,
    control: Box<dyn Control>,
}

impl Attachment {
    fn new(param: Param, current: f32, mut control: Box<dyn Control>) -> Self {
        control.update(current);
        Self { param, control }
    }

    fn forward(&mut self, plain: f32) {
        self.control.update(plain);
    }
}

#[derive(Default)]
struct Attachments {
    slots: [Option<Attachment>; Param::COUNT],
}

fn lock_attachments(attachments: &Mutex<Attachments>) -> MutexGuard<'_, Attachments> {
    attachments.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PluginState {
    /// Absent when running without a host, e.g. in tests.
    host: Option<HostCallback>,
    tree: StateTree,
    working: Arc<WorkingValues>,
    attachments: Arc<Mutex<Attachments>>,
}

impl PluginState {
    pub fn new(host: Option<HostCallback>) -> Self {
        let state = Self {
            host,
            tree: StateTree::new(SCHEMA_ID),
            working: Arc::new(WorkingValues::default()),
            attachments: Arc::new(Mutex::new(Attachments::default())),
        };
        state.register_parameters();
        state
    }

    /// Declares every parameter to the state tree and subscribes the working value and control
    /// listeners. The undo log is cleared afterwards so that the user's first edit is the first
    /// undoable step.
    fn register_parameters(&self) {
        for param in Param::ALL.iter().copied() {
            self.tree.create_parameter(param);

            let working = Arc::clone(&self.working);
            self.tree
                .add_listener(param, Box::new(move |param, plain| working.apply(param, plain)));

            let attachments = Arc::clone(&self.attachments);
            self.tree.add_listener(
                param,
                Box::new(move |param, plain| {
                    if let Some(attachment) = &mut lock_attachments(&attachments).slots[param.index()]
                    {
                        attachment.forward(plain);
                    }
                }),
            );

            self.working.apply(param, self.tree.value(param));
        }
        self.tree.clear_undo_history();
        log::debug!("registered {} parameters", Param::COUNT);
    }

    /// Handle to the working values, for the audio thread.
    pub fn working_values(&self) -> Arc<WorkingValues> {
        Arc::clone(&self.working)
    }

    /// Binds the four panel controls. Existing bindings are dropped first.
    pub fn attach_controls(
        &self,
        waveform: Box<dyn Control>,
        note_number: Box<dyn Control>,
        level: Box<dyn Control>,
        loud: Box<dyn Control>,
    ) {
        self.detach_controls();

        // Read the tree before taking the attachments lock; tree listeners take them in the
        // opposite order.
        let current = Param::ALL.map(|param| self.tree.value(param));
        let controls = [waveform, note_number, level, loud];

        let mut attachments = lock_attachments(&self.attachments);
        for ((slot, control), param) in attachments
            .slots
            .iter_mut()
            .zip(IntoIterator::into_iter(controls))
            .zip(Param::ALL.iter().copied())
        {
            *slot = Some(Attachment::new(param, current[param.index()], control));
        }
    }

    /// Unbinds all controls. Safe to call when nothing is attached.
    pub fn detach_controls(&self) {
        let detached: Vec<Attachment> = lock_attachments(&self.attachments)
            .slots
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        if !detached.is_empty() {
            log::debug!(
                "detached controls for {:?}",
                detached.iter().map(|a| a.param).collect::<Vec<_>>()
            );
        }
    }

    #[cfg(test)]
    pub fn has_attached_controls(&self) -> bool {
        lock_attachments(&self.attachments)
            .slots
            .iter()
            .any(Option::is_some)
    }

    /// Writes the current working values into `document`, keyed by display name.
    // Part of the parameter document contract for hosting code; the VST wrapper uses the persisted
    // blob instead.
    #[allow(dead_code)]
    pub fn export_state(&self, document: &mut Document) {
        for param in Param::ALL.iter().copied() {
            let name = param.spec().name;
            match self.working.get(param) {
                WorkingValue::Waveform(waveform) => document.set_attribute(name, waveform.name()),
                WorkingValue::NoteNumber(note) => document.set_attribute(name, note),
                WorkingValue::Level(level) => document.set_attribute(name, level),
                WorkingValue::Loud(loud) => document.set_attribute(name, if loud { 1 } else { 0 }),
            }
        }
    }

    /// Reads working values written by `export_state` and sets each one through the state tree, so
    /// listeners fire and the edits are undoable. Missing attributes read as zero values.
    #[allow(dead_code)]
    pub fn import_state(&self, document: &Document) {
        for param in Param::ALL.iter().copied() {
            let name = param.spec().name;
            let value = match param {
                Param::Waveform => WorkingValue::Waveform(
                    document
                        .attribute(name)
                        .and_then(Waveform::lookup)
                        .unwrap_or_default(),
                ),
                Param::MidiNoteNumber => {
                    WorkingValue::NoteNumber(document.int_attribute(name).max(0).min(127) as u8)
                }
                Param::Level => WorkingValue::Level(document.float_attribute(name)),
                Param::Loud => WorkingValue::Loud(document.bool_attribute(name)),
            };
            if let Some(plain) = value.to_plain(param) {
                self.tree.set_value(param, plain);
            }
        }
    }

    /// Serializes the whole state tree for the host.
    pub fn export_persisted_state(&self) -> Vec<u8> {
        self.tree.to_document().to_bytes()
    }

    /// Restores a blob produced by `export_persisted_state`. Anything unreadable, or written by a
    /// different plugin, is ignored and leaves the current state untouched.
    pub fn import_persisted_state(&self, data: &[u8]) -> bool {
        let result =
            Document::from_bytes(data).and_then(|document| self.tree.replace_from_document(&document));
        match result {
            Ok(()) => {
                log::info!("restored persisted state");
                true
            }
            Err(e) => {
                log::warn!("ignoring persisted state: {}", e);
                false
            }
        }
    }

    fn notify_host(&self, param: Param) {
        if let Some(host) = &self.host {
            let normalized = param.spec().range.normalize(self.tree.value(param));
            host.automate(param.index() as i32, normalized);
        }
    }
}

/// The DAW directly accesses the plugin state through the VST API to read and automate parameters,
/// and to save and restore the plugin's state.
impl PluginParameters for PluginState {
    fn set_parameter(&self, index: i32, value: f32) {
        if let Some(param) = Param::from_index(index) {
            self.tree
                .set_value(param, param.spec().range.denormalize(value));
        }
    }

    fn get_parameter(&self, index: i32) -> f32 {
        match Param::from_index(index) {
            Some(param) => param.spec().range.normalize(self.tree.value(param)),
            None => 0.,
        }
    }

    fn get_parameter_label(&self, index: i32) -> String {
        Param::from_index(index)
            .map(|param| param.spec().label.to_string())
            .unwrap_or_default()
    }

    fn get_parameter_text(&self, index: i32) -> String {
        Param::from_index(index)
            .map(|param| (param.spec().to_text)(self.tree.value(param)))
            .unwrap_or_default()
    }

    fn get_parameter_name(&self, index: i32) -> String {
        Param::from_index(index)
            .map(|param| param.spec().name.to_string())
            .unwrap_or_default()
    }

    fn can_be_automated(&self, index: i32) -> bool {
        Param::from_index(index).is_some()
    }

    fn string_to_parameter(&self, index: i32, text: String) -> bool {
        match Param::from_index(index) {
            Some(param) => {
                self.tree.set_value(param, (param.spec().from_text)(&text));
                true
            }
            None => false,
        }
    }

    fn get_preset_data(&self) -> Vec<u8> {
        self.export_persisted_state()
    }

    fn get_bank_data(&self) -> Vec<u8> {
        self.export_persisted_state()
    }

    fn load_preset_data(&self, data: &[u8]) {
        self.import_persisted_state(data);
    }

    fn load_bank_data(&self, data: &[u8]) {
        self.import_persisted_state(data);
    }
}

/// The editor interface also directly accesses the plugin state through its own API.
impl crate::editor::EditorRemoteState for PluginState {
    fn set_parameter_control(&self, param: Param, plain: f32) {
        self.tree.set_value(param, plain);
        self.notify_host(param);
    }

    fn parameter_control(&self, param: Param) -> f32 {
        self.tree.value(param)
    }

    fn undo(&self) -> bool {
        let undone = self.tree.undo();
        log::debug!("undo: {}", undone);
        undone
    }

    fn redo(&self) -> bool {
        let redone = self.tree.redo();
        log::debug!("redo: {}", redone);
        redone
    }

    fn can_undo(&self) -> bool {
        self.tree.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.tree.can_redo()
    }

    fn begin_new_transaction(&self) {
        log::trace!("new undo transaction");
        self.tree.begin_new_transaction();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorRemoteState;
    use crate::working_values::WorkingSnapshot;
    use std::sync::mpsc::{channel, Receiver, Sender};

    struct ChannelControl(Sender<f32>);

    impl Control for ChannelControl {
        fn update(&mut self, plain: f32) {
            let _ = self.0.send(plain);
        }
    }

    fn control() -> (Box<dyn Control>, Receiver<f32>) {
        let (tx, rx) = channel();
        (Box::new(ChannelControl(tx)), rx)
    }

    #[test]
    fn registration_leaves_no_undo_history() {
        let state = PluginState::new(None);
        assert!(!state.can_undo());
        assert!(!state.can_redo());
        assert_eq!(state.working_values().snapshot(), WorkingSnapshot::default());
    }

    #[test]
    fn host_automation_updates_working_values() {
        let state = PluginState::new(None);
        let working = state.working_values();

        state.set_parameter(0, 1.);
        state.set_parameter(1, 69. / 127.);
        state.set_parameter(2, 0.8);
        state.set_parameter(3, 1.);
        state.set_parameter(7, 1.);

        let snapshot = working.snapshot();
        assert_eq!(snapshot.waveform, Waveform::Sawtooth);
        assert_eq!(snapshot.note_number, 69);
        assert!((snapshot.level - 0.8).abs() < 1e-6);
        assert!(snapshot.loud);
    }

    #[test]
    fn host_text_display() {
        let state = PluginState::new(None);
        assert_eq!(state.get_parameter_text(0), "Sine");
        assert_eq!(state.get_parameter_text(1), "C4");
        assert_eq!(state.get_parameter_text(2), "5");
        assert_eq!(state.get_parameter_text(3), "no");
        assert_eq!(state.get_parameter_label(2), "/10");
        assert_eq!(state.get_parameter_name(1), "Midi Note Number");
        assert_eq!(state.get_parameter_text(9), "");

        assert!(state.string_to_parameter(0, "Square".to_string()));
        assert!(state.string_to_parameter(1, "A4".to_string()));
        assert!(state.string_to_parameter(3, "yes".to_string()));
        assert!(!state.string_to_parameter(4, "yes".to_string()));
        assert_eq!(state.get_parameter_text(0), "Square");
        assert_eq!(state.get_parameter_text(1), "A4");
        assert_eq!(state.get_parameter_text(3), "yes");
    }

    #[test]
    fn out_of_range_note_text_still_sets_a_value() {
        let state = PluginState::new(None);
        assert!(state.string_to_parameter(1, "C999999999".to_string()));
        assert_eq!(state.get_parameter_text(1), "C-1");
        assert!(state.string_to_parameter(1, "C-2147483648".to_string()));
        assert_eq!(state.get_parameter_text(1), "C-1");
        assert!(state.string_to_parameter(1, "C20".to_string()));
        assert_eq!(state.get_parameter_text(1), "G9");
    }

    #[test]
    fn one_edit_then_boundary_is_undoable() {
        let state = PluginState::new(None);
        let working = state.working_values();

        state.set_parameter_control(Param::Level, 2.);
        state.begin_new_transaction();
        assert!(state.can_undo());
        assert!((working.snapshot().level - 0.2).abs() < 1e-6);

        assert!(state.undo());
        assert_eq!(working.snapshot().level, 0.5);
        assert!(!state.can_undo());
        assert!(state.can_redo());

        assert!(state.redo());
        assert!((working.snapshot().level - 0.2).abs() < 1e-6);
    }

    #[test]
    fn persisted_state_round_trips_into_fresh_instance() {
        let state = PluginState::new(None);
        state.set_parameter_control(Param::Waveform, 2.);
        state.set_parameter_control(Param::MidiNoteNumber, 72.);
        state.set_parameter_control(Param::Level, 7.5);
        state.set_parameter_control(Param::Loud, 1.);

        let restored = PluginState::new(None);
        restored.load_preset_data(&state.get_preset_data());

        assert_eq!(
            restored.working_values().snapshot(),
            state.working_values().snapshot()
        );
        assert!(!restored.can_undo());
    }

    #[test]
    fn mismatched_persisted_state_is_ignored() {
        let state = PluginState::new(None);
        state.set_parameter_control(Param::MidiNoteNumber, 40.);
        let before = state.working_values().snapshot();

        let mut foreign = Document::new("SomeOtherPlugin");
        foreign.set_attribute("midiNoteNumber", 100.);
        assert!(!state.import_persisted_state(&foreign.to_bytes()));
        assert!(!state.import_persisted_state(b"garbage"));

        assert_eq!(state.working_values().snapshot(), before);
    }

    #[test]
    fn parameter_documents_round_trip_and_are_undoable() {
        let source = PluginState::new(None);
        source.set_parameter_control(Param::Waveform, 1.);
        source.set_parameter_control(Param::MidiNoteNumber, 48.);
        source.set_parameter_control(Param::Level, 3.);
        source.set_parameter_control(Param::Loud, 1.);

        let mut document = Document::new("PluginParameters");
        source.export_state(&mut document);
        assert_eq!(document.attribute("Waveform"), Some("Triangle"));
        assert_eq!(document.attribute("Loud"), Some("1"));

        let target = PluginState::new(None);
        target.import_state(&document);
        assert_eq!(
            target.working_values().snapshot(),
            source.working_values().snapshot()
        );
        assert!(target.can_undo());
    }

    #[test]
    fn empty_parameter_document_imports_zero_values() {
        let state = PluginState::new(None);
        state.import_state(&Document::new("PluginParameters"));
        assert_eq!(
            state.working_values().snapshot(),
            WorkingSnapshot {
                waveform: Waveform::Sine,
                note_number: 0,
                level: 0.,
                loud: false,
            }
        );
    }

    #[test]
    fn attached_controls_follow_the_tree() {
        let state = PluginState::new(None);
        state.detach_controls();

        let (level, level_rx) = control();
        let (waveform, _waveform_rx) = control();
        let (note, _note_rx) = control();
        let (loud, loud_rx) = control();
        state.attach_controls(waveform, note, level, loud);
        assert!(state.has_attached_controls());
        assert_eq!(level_rx.try_recv(), Ok(5.));
        assert_eq!(loud_rx.try_recv(), Ok(0.));

        state.set_parameter(2, 0.1);
        assert_eq!(level_rx.try_recv(), Ok(1.));

        // Reattaching replaces the old bindings.
        let (level2, level2_rx) = control();
        let (waveform2, _w) = control();
        let (note2, _n) = control();
        let (loud2, _l) = control();
        state.attach_controls(waveform2, note2, level2, loud2);
        state.set_parameter(2, 0.25);
        assert!(level_rx.try_recv().is_err());
        assert_eq!(level2_rx.try_recv(), Ok(1.));
        assert_eq!(level2_rx.try_recv(), Ok(2.5));

        state.detach_controls();
        assert!(!state.has_attached_controls());
        state.set_parameter(2, 0.4);
        assert!(level2_rx.try_recv().is_err());
    }
}
