//! The state tree is the single source of truth for every parameter value. Host automation, user
//! gestures, undo/redo and state loading all write through it, and registered listeners project
//! each change outward (into the audio thread's working values, and into any attached controls).
//!
//! Values are stored "plain", i.e. within each parameter's own range rather than normalized.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use crate::parameters::Param;

mod document;
mod undo;

pub use document::{Document, StateError};
use undo::{Change, UndoManager};

/// Called with the parameter and its new plain value after every change.
pub type Listener = Box<dyn Fn(Param, f32) + Send + Sync>;

struct TreeValues {
    values: BTreeMap<Param, f32>,
    undo: UndoManager,
}

pub struct StateTree {
    /// Root tag of persisted documents.
    schema: &'static str,
    inner: Mutex<TreeValues>,
    listeners: RwLock<Vec<(Param, Listener)>>,
}

impl StateTree {
    pub fn new(schema: &'static str) -> Self {
        Self {
            schema,
            inner: Mutex::new(TreeValues {
                values: BTreeMap::new(),
                undo: UndoManager::new(),
            }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TreeValues> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a parameter node holding its default value. Like any other edit, this is recorded in
    /// the undo log; callers clear the log once setup is complete.
    pub fn create_parameter(&self, param: Param) {
        let default = param.spec().default;
        let mut inner = self.lock();
        if inner.values.insert(param, default).is_none() {
            inner.undo.record(Change {
                param,
                before: 0.,
                after: default,
            });
        }
    }

    pub fn add_listener(&self, param: Param, listener: Listener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((param, listener));
    }

    fn notify(&self, param: Param, plain: f32) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for (_, listener) in listeners.iter().filter(|(p, _)| *p == param) {
            listener(param, plain);
        }
    }

    /// Current plain value, or 0 for a parameter that was never created.
    pub fn value(&self, param: Param) -> f32 {
        self.lock().values.get(&param).copied().unwrap_or(0.)
    }

    /// Sets a parameter through the undoable path. The value is snapped into the parameter's legal
    /// range first. Setting a parameter to its current value does nothing.
    pub fn set_value(&self, param: Param, plain: f32) {
        self.write(param, plain, true);
    }

    /// Listeners run while the tree is locked, so that concurrent writers notify in the same order
    /// their values landed. Listeners must not call back into the tree.
    fn write(&self, param: Param, plain: f32, record: bool) {
        let plain = param.spec().range.snap(plain);
        let mut inner = self.lock();
        let before = match inner.values.get_mut(&param) {
            Some(value) if *value != plain => std::mem::replace(value, plain),
            _ => return,
        };
        if record {
            inner.undo.record(Change {
                param,
                before,
                after: plain,
            });
        }
        self.notify(param, plain);
    }

    pub fn begin_new_transaction(&self) {
        self.lock().undo.begin_new_transaction();
    }

    pub fn can_undo(&self) -> bool {
        self.lock().undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.lock().undo.can_redo()
    }

    pub fn undo(&self) -> bool {
        let restore = self.lock().undo.undo();
        self.replay(restore)
    }

    pub fn redo(&self) -> bool {
        let restore = self.lock().undo.redo();
        self.replay(restore)
    }

    fn replay(&self, restore: Option<Vec<(Param, f32)>>) -> bool {
        match restore {
            Some(values) => {
                for (param, plain) in values {
                    self.write(param, plain, false);
                }
                true
            }
            None => false,
        }
    }

    pub fn clear_undo_history(&self) {
        self.lock().undo.clear_history();
    }

    /// Snapshot of the whole tree, one attribute per parameter id.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new(self.schema);
        for (param, value) in self.lock().values.iter() {
            document.set_attribute(param.id(), value);
        }
        document
    }

    /// Replaces the tree's values with those in `document`. Documents with a foreign root tag are
    /// rejected without touching anything. Attributes that are missing or unknown are skipped.
    ///
    /// Loading a whole state is not an edit the user can undo, so the undo log is cleared.
    pub fn replace_from_document(&self, document: &Document) -> Result<(), StateError> {
        if !document.has_tag(self.schema) {
            return Err(StateError::WrongTag {
                expected: self.schema.to_string(),
                found: document.tag.clone(),
            });
        }
        for (key, value) in document.attributes.iter() {
            let param = match Param::from_id(key) {
                Some(param) => param,
                None => continue,
            };
            if let Ok(plain) = value.trim().parse::<f32>() {
                if plain.is_finite() {
                    self.write(param, plain, false);
                }
            }
        }
        self.clear_undo_history();
        Ok(())
    }
}
