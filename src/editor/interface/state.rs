//! The editor interface must keep some state between events: the value each control currently
//! shows, whether undo and redo are available, and any drag in progress. This module contains the
//! `InterfaceState` struct along with logic to update it in response to window events like clicks,
//! drags, etc. as well as from external state updates.

use vst_window::{MouseButton, WindowEvent};

use super::{control_bounds, hit_test, Region, SIZE_X, SIZE_Y};
use crate::parameters::Param;
use crate::plugin_state::StateUpdate;
use crate::waveform::Waveform;

/// All the possible ways a click+drag operation on the interface window might be interpreted.
enum DragBehavior {
    MoveSlider { param: Param },
}

/// Holds any state required to display and update the editor interface.
pub(in crate::editor) struct InterfaceState {
    /// Plain value shown by each control, indexed by `Param::index`.
    values: [f32; Param::COUNT],
    can_undo: bool,
    can_redo: bool,
    /// (X, Y) pixel coordinate of the cursor, from the top-left corner.
    /// Coordinates could be negative if the cursor is dragged outside of the window!
    cursor_pos: (f32, f32),
    drag_behavior: Option<DragBehavior>,
}

impl InterfaceState {
    pub fn new() -> Self {
        Self {
            values: Param::ALL.map(|param| param.spec().default),
            can_undo: false,
            can_redo: false,
            cursor_pos: Default::default(),
            drag_behavior: None,
        }
    }

    #[cfg(test)]
    pub fn value(&self, param: Param) -> f32 {
        self.values[param.index()]
    }

    pub fn set_history_availability(&mut self, can_undo: bool, can_redo: bool) {
        self.can_undo = can_undo;
        self.can_redo = can_redo;
    }

    /// Update the editor state in response to an external message.
    pub fn react_to_control_event(&mut self, event: StateUpdate) {
        match event {
            StateUpdate::SetParameter(param, plain) => self.values[param.index()] = plain,
        }
    }

    fn set_control<S: super::EditorRemoteState>(&mut self, param: Param, plain: f32, remote_state: &S) {
        let plain = param.spec().range.snap(plain);
        self.values[param.index()] = plain;
        remote_state.set_parameter_control(param, plain);
    }

    fn slider_value(&self, param: Param) -> f32 {
        let fraction = control_bounds(param).fraction_x(self.cursor_pos.0);
        param.spec().range.denormalize(fraction)
    }

    fn step_waveform<S: super::EditorRemoteState>(&mut self, step: i32, remote_state: &S) {
        let current = remote_state.parameter_control(Param::Waveform) as i32;
        let next = (current + step).rem_euclid(Waveform::CHOICES as i32);
        self.set_control(Param::Waveform, next as f32, remote_state);
    }

    fn refresh_history<S: super::EditorRemoteState>(&mut self, remote_state: &S) {
        self.set_history_availability(remote_state.can_undo(), remote_state.can_redo());
    }

    /// Update the editor state and remote state store as necessary in response to an interaction
    /// with the editor window.
    pub fn react_to_window_event<S: super::EditorRemoteState>(
        &mut self,
        event: WindowEvent,
        remote_state: &S,
    ) {
        match event {
            WindowEvent::CursorMovement(x, y) => {
                self.cursor_pos = (x * SIZE_X as f32, y * SIZE_Y as f32);
                if let Some(DragBehavior::MoveSlider { param }) = self.drag_behavior {
                    let value = self.slider_value(param);
                    self.set_control(param, value, remote_state);
                }
            }
            WindowEvent::MouseClick(button) => match (hit_test(self.cursor_pos), button) {
                (Some(Region::Control(Param::Waveform)), MouseButton::Left) => {
                    self.step_waveform(1, remote_state)
                }
                (Some(Region::Control(Param::Waveform)), MouseButton::Right) => {
                    self.step_waveform(-1, remote_state)
                }
                (Some(Region::Control(Param::Loud)), MouseButton::Left) => {
                    let loud = remote_state.parameter_control(Param::Loud) >= 0.5;
                    self.set_control(Param::Loud, if loud { 0. } else { 1. }, remote_state);
                }
                (Some(Region::Control(param)), MouseButton::Left) => {
                    let value = self.slider_value(param);
                    self.set_control(param, value, remote_state);
                    self.drag_behavior = Some(DragBehavior::MoveSlider { param });
                }
                (Some(Region::Control(param)), MouseButton::Right) if param != Param::Loud => {
                    self.set_control(param, param.spec().default, remote_state);
                }
                (Some(Region::UndoButton), MouseButton::Left) if self.can_undo => {
                    remote_state.undo();
                    self.refresh_history(remote_state);
                }
                (Some(Region::RedoButton), MouseButton::Left) if self.can_redo => {
                    remote_state.redo();
                    self.refresh_history(remote_state);
                }
                _ => (),
            },
            WindowEvent::MouseRelease(MouseButton::Left) => {
                drop(self.drag_behavior.take());
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorRemoteState;
    use crate::plugin_state::PluginState;

    /// Moves the cursor to a pixel position.
    fn move_to(state: &mut InterfaceState, remote: &PluginState, x: f32, y: f32) {
        state.react_to_window_event(
            WindowEvent::CursorMovement(x / SIZE_X as f32, y / SIZE_Y as f32),
            remote,
        );
    }

    fn click(state: &mut InterfaceState, remote: &PluginState, button: MouseButton) {
        state.react_to_window_event(WindowEvent::MouseClick(button), remote);
    }

    #[test]
    fn waveform_selector_cycles() {
        let remote = PluginState::new(None);
        let mut state = InterfaceState::new();

        move_to(&mut state, &remote, 150., 30.);
        click(&mut state, &remote, MouseButton::Right);
        assert_eq!(remote.parameter_control(Param::Waveform), 3.);
        click(&mut state, &remote, MouseButton::Left);
        assert_eq!(remote.parameter_control(Param::Waveform), 0.);
        click(&mut state, &remote, MouseButton::Left);
        assert_eq!(state.value(Param::Waveform), 1.);
        assert_eq!(remote.working_values().snapshot().waveform, Waveform::Triangle);
    }

    #[test]
    fn slider_drag_sets_level() {
        let remote = PluginState::new(None);
        let mut state = InterfaceState::new();
        let bounds = control_bounds(Param::Level);
        let row = bounds.y + bounds.height / 2.;

        move_to(&mut state, &remote, bounds.x + 1., row);
        click(&mut state, &remote, MouseButton::Left);
        assert!(remote.parameter_control(Param::Level) < 0.05);

        move_to(&mut state, &remote, bounds.x + bounds.width / 4., 0.);
        assert!((remote.parameter_control(Param::Level) - 2.5).abs() < 1e-3);

        state.react_to_window_event(WindowEvent::MouseRelease(MouseButton::Left), &remote);
        move_to(&mut state, &remote, bounds.x + bounds.width * 0.9, row);
        assert!((remote.parameter_control(Param::Level) - 2.5).abs() < 1e-3);

        click(&mut state, &remote, MouseButton::Right);
        assert_eq!(remote.parameter_control(Param::Level), 5.);
        assert_eq!(state.value(Param::Level), 5.);
    }

    #[test]
    fn note_slider_snaps_to_whole_notes() {
        let remote = PluginState::new(None);
        let mut state = InterfaceState::new();
        let bounds = control_bounds(Param::MidiNoteNumber);

        move_to(&mut state, &remote, bounds.x + bounds.width * 0.3, bounds.y + 1.);
        click(&mut state, &remote, MouseButton::Left);
        let note = remote.parameter_control(Param::MidiNoteNumber);
        assert_eq!(note, note.round());
        assert_eq!(note, 38.);
    }

    #[test]
    fn loud_toggle_flips() {
        let remote = PluginState::new(None);
        let mut state = InterfaceState::new();

        move_to(&mut state, &remote, 150., 120.);
        click(&mut state, &remote, MouseButton::Left);
        assert!(remote.working_values().snapshot().loud);
        click(&mut state, &remote, MouseButton::Left);
        assert!(!remote.working_values().snapshot().loud);
    }

    #[test]
    fn undo_button_respects_availability() {
        let remote = PluginState::new(None);
        let mut state = InterfaceState::new();

        move_to(&mut state, &remote, 150., 120.);
        click(&mut state, &remote, MouseButton::Left);
        remote.begin_new_transaction();

        // The button stays disabled until availability is polled.
        move_to(&mut state, &remote, 150., 150.);
        click(&mut state, &remote, MouseButton::Left);
        assert_eq!(remote.parameter_control(Param::Loud), 1.);

        state.set_history_availability(remote.can_undo(), remote.can_redo());
        click(&mut state, &remote, MouseButton::Left);
        assert_eq!(remote.parameter_control(Param::Loud), 0.);

        move_to(&mut state, &remote, 250., 150.);
        click(&mut state, &remote, MouseButton::Left);
        assert_eq!(remote.parameter_control(Param::Loud), 1.);
    }

    #[test]
    fn control_events_update_display() {
        let mut state = InterfaceState::new();
        state.react_to_control_event(StateUpdate::SetParameter(Param::Level, 8.));
        assert_eq!(state.value(Param::Level), 8.);
        assert_eq!(state.value(Param::MidiNoteNumber), 60.);
    }
}
