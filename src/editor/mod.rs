//! In VST terminology, the editor is a graphical window that can be used to display and interact
//! with a plugin using a custom visual appearance.
//!
//! The editor runs fully on the UI thread. It manages an OS window through a cross-platform API
//! exposed by the `vst_window` crate, binds its controls to the parameter store while open, and
//! owns the periodic timer that splits parameter edits into undo transactions.

use std::sync::{
    mpsc::{channel, Sender},
    Arc,
};
use std::time::{Duration, Instant};

use vst::editor::Editor;
use vst_window::setup;

use crate::parameters::Param;
use crate::plugin_state::{Control, PluginState, StateUpdate};

mod interface;
use interface::{EditorInterface, InterfaceState, SIZE_X, SIZE_Y};

/// How often a new undo transaction is started while the editor is open.
pub(crate) const TRANSACTION_INTERVAL: Duration = Duration::from_millis(500);

/// Persistent VST-compatible wrapper that opens and closes an `EditorInterface`.
pub(super) struct PluginEditor {
    opened_interface: Option<EditorInterface>,
    remote_state: Arc<PluginState>,
    transaction_timer: TransactionTimer,
}

impl PluginEditor {
    pub fn new(remote_state: Arc<PluginState>) -> Self {
        Self {
            opened_interface: None,
            remote_state,
            transaction_timer: TransactionTimer::new(TRANSACTION_INTERVAL),
        }
    }

    /// Closes the current undo transaction, so that edits made after this point become a separate
    /// undo step, and refreshes the undo/redo buttons.
    ///
    /// The boundary falls on a fixed cadence, so it can land in the middle of a slider drag and
    /// split that one gesture into two undo steps.
    fn transaction_timer_callback(&mut self) {
        self.remote_state.begin_new_transaction();
        if let Some(opened_interface) = &mut self.opened_interface {
            opened_interface.refresh_history(&*self.remote_state);
        }
    }
}

/// `PluginEditor` responds directly to VST API calls specific to the UI thread.
impl Editor for PluginEditor {
    fn size(&self) -> (i32, i32) {
        (SIZE_X as i32, SIZE_Y as i32)
    }

    fn position(&self) -> (i32, i32) {
        (0, 0)
    }

    fn open(&mut self, parent: *mut core::ffi::c_void) -> bool {
        if self.opened_interface.is_none() {
            let (window, event_source) = setup(parent, (SIZE_X as i32, SIZE_Y as i32));
            let (to_interface, incoming) = channel();
            let link = |param: Param| -> Box<dyn Control> {
                Box::new(ControlLink {
                    param,
                    to_interface: to_interface.clone(),
                })
            };
            self.remote_state.attach_controls(
                link(Param::Waveform),
                link(Param::MidiNoteNumber),
                link(Param::Level),
                link(Param::Loud),
            );
            self.opened_interface = Some(EditorInterface::new(
                window,
                event_source,
                incoming,
                InterfaceState::new(),
            ));

            // Run the timer callback once immediately, then on every interval.
            self.transaction_timer.start(Instant::now());
            self.transaction_timer_callback();
            true
        } else {
            false
        }
    }

    fn close(&mut self) {
        self.transaction_timer.stop();
        self.remote_state.detach_controls();
        drop(self.opened_interface.take());
    }

    fn is_open(&mut self) -> bool {
        self.opened_interface.is_some()
    }

    fn idle(&mut self) {
        if let Some(opened_interface) = &mut self.opened_interface {
            opened_interface.run_tasks(&*self.remote_state);
        }
        if self.transaction_timer.tick(Instant::now()) {
            self.transaction_timer_callback();
        }
    }
}

/// Forwards state tree changes for one parameter to the open interface on the UI thread.
struct ControlLink {
    param: Param,
    to_interface: Sender<StateUpdate>,
}

impl Control for ControlLink {
    fn update(&mut self, plain: f32) {
        // The interface may already be gone while it is being closed.
        let _ = self
            .to_interface
            .send(StateUpdate::SetParameter(self.param, plain));
    }
}

/// A repeating deadline, polled from the UI thread's idle callback.
pub(crate) struct TransactionTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl TransactionTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Arms the timer to fire one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Returns whether the timer fired, and if so schedules the next deadline.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

/// The editor interface holds a handle directly to the remote VST plugin state, which should
/// implement this trait. It should be possible to update the remote state through these trait
/// methods.
///
/// Setting a control should do two things as necessary:
///   - Update the remote long-term internal state, which in turn updates the audio thread's working
///     values
///   - Notify the host DAW that the parameter has been changed by the user.
pub(crate) trait EditorRemoteState {
    /// Sets a parameter to a new plain value in its own range, as a user gesture.
    fn set_parameter_control(&self, param: Param, plain: f32);
    /// Current plain value of a parameter.
    fn parameter_control(&self, param: Param) -> f32;
    fn undo(&self) -> bool;
    fn redo(&self) -> bool;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn begin_new_transaction(&self);
}
