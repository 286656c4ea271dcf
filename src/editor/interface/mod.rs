//! All the logic behind the editor UI is contained within this module.
//!
//! The interface tracks the panel's layout and the value each control displays, and turns window
//! input events into parameter edits and undo/redo requests. Nothing is drawn here.

use std::sync::mpsc::Receiver;

use vst_window::{EditorWindow, EventSource};

use crate::parameters::Param;
use crate::plugin_state::StateUpdate;

mod state;

use super::EditorRemoteState;
pub(super) use state::InterfaceState;

/// Pixel layout of the control panel: one labelled row per parameter, then the undo/redo buttons.
mod layout {
    pub const CONTROL_LEFT: f32 = 144.;
    pub const COMBO_WIDTH: f32 = 150.;
    pub const SLIDER_WIDTH: f32 = 420.;
    pub const TOGGLE_WIDTH: f32 = 24.;
    pub const BUTTON_WIDTH: f32 = 80.;
    pub const BUTTON_GAP: f32 = 20.;
    pub const CONTROL_HEIGHT: f32 = 24.;
    pub const GAP_HEIGHT: f32 = 8.;
    pub const FIRST_ROW_TOP: f32 = 20.;
}

/// Actual pixel width of the editor window.
pub(super) const SIZE_X: usize = 600;
/// Actual pixel height of the editor window.
pub(super) const SIZE_Y: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn contains(&self, (x, y): (f32, f32)) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Horizontal position of `x` within this rectangle, from 0 to 1.
    fn fraction_x(&self, x: f32) -> f32 {
        ((x - self.x) / self.width).max(0.).min(1.)
    }
}

/// Something on the panel that reacts to the mouse.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Region {
    Control(Param),
    UndoButton,
    RedoButton,
}

fn row_top(row: usize) -> f32 {
    use self::layout::*;
    FIRST_ROW_TOP + row as f32 * (CONTROL_HEIGHT + GAP_HEIGHT)
}

fn control_bounds(param: Param) -> Rect {
    use self::layout::*;
    let width = match param {
        Param::Waveform => COMBO_WIDTH,
        Param::MidiNoteNumber | Param::Level => SLIDER_WIDTH,
        Param::Loud => TOGGLE_WIDTH,
    };
    Rect {
        x: CONTROL_LEFT,
        y: row_top(param.index()),
        width,
        height: CONTROL_HEIGHT,
    }
}

fn button_bounds(region: Region) -> Rect {
    use self::layout::*;
    let x = match region {
        Region::RedoButton => CONTROL_LEFT + BUTTON_WIDTH + BUTTON_GAP,
        _ => CONTROL_LEFT,
    };
    Rect {
        x,
        y: row_top(Param::COUNT),
        width: BUTTON_WIDTH,
        height: CONTROL_HEIGHT,
    }
}

fn hit_test(pos: (f32, f32)) -> Option<Region> {
    Param::ALL
        .iter()
        .map(|param| Region::Control(*param))
        .chain([Region::UndoButton, Region::RedoButton].iter().copied())
        .find(|region| match region {
            Region::Control(param) => control_bounds(*param).contains(pos),
            _ => button_bounds(*region).contains(pos),
        })
}

/// Represents a window containing an editor interface. A new one is used each time the parent
/// window provided by the host DAW is opened or closed.
pub(super) struct EditorInterface {
    /// Kept alive for as long as the interface is open.
    _window: EditorWindow,
    event_source: EventSource,
    incoming: Receiver<StateUpdate>,
    state: InterfaceState,
}

impl EditorInterface {
    /// Setup the `EditorInterface` within the provided parent `EditorWindow` to respond to events
    /// from the corresponding `EventSource`, and to control updates arriving on `incoming`.
    pub fn new(
        window: EditorWindow,
        event_source: EventSource,
        incoming: Receiver<StateUpdate>,
        initial_state: InterfaceState,
    ) -> Self {
        Self {
            _window: window,
            event_source,
            incoming,
            state: initial_state,
        }
    }

    /// Run as much as possible of the editor interface without blocking. This means acting on any
    /// pending state change events from the attached controls, and then responding to any new
    /// window input events.
    pub fn run_tasks<S: EditorRemoteState>(&mut self, remote_state: &S) {
        while let Ok(event) = self.incoming.try_recv() {
            self.state.react_to_control_event(event);
        }

        while let Some(event) = self.event_source.poll_event() {
            self.state.react_to_window_event(event, remote_state);
        }
    }

    /// Polls whether undo and redo are currently available.
    pub fn refresh_history<S: EditorRemoteState>(&mut self, remote_state: &S) {
        self.state
            .set_history_availability(remote_state.can_undo(), remote_state.can_redo());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_hit_their_controls() {
        assert_eq!(hit_test((150., 30.)), Some(Region::Control(Param::Waveform)));
        assert_eq!(
            hit_test((500., 60.)),
            Some(Region::Control(Param::MidiNoteNumber))
        );
        assert_eq!(hit_test((150., 90.)), Some(Region::Control(Param::Level)));
        assert_eq!(hit_test((150., 120.)), Some(Region::Control(Param::Loud)));
        assert_eq!(hit_test((150., 150.)), Some(Region::UndoButton));
        assert_eq!(hit_test((250., 150.)), Some(Region::RedoButton));
    }

    #[test]
    fn gaps_and_margins_hit_nothing() {
        assert_eq!(hit_test((10., 30.)), None);
        assert_eq!(hit_test((150., 47.)), None);
        assert_eq!(hit_test((200., 120.)), None);
        assert_eq!(hit_test((234., 150.)), None);
        assert_eq!(hit_test((580., 190.)), None);
    }

    #[test]
    fn slider_fraction_clamps() {
        let bounds = control_bounds(Param::Level);
        assert_eq!(bounds.fraction_x(bounds.x - 50.), 0.);
        assert_eq!(bounds.fraction_x(bounds.x + bounds.width / 2.), 0.5);
        assert_eq!(bounds.fraction_x(SIZE_X as f32 + 10.), 1.);
    }
}
