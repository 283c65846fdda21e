//! Game events and their payloads.
use derive_more::From;
use itertools::Itertools;
use log::{debug, error};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::Weak,
};

use super::{HFrame, HObject, Object};

/// The name of the event fired when a script handler fails. Its only
/// argument is the error message.
pub const LUA_ERROR: &str = "LUA_ERROR";

/// A dynamically-typed script value.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Str(x.to_owned())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(x) => write!(f, "{}", x),
            Value::Int(x) => write!(f, "{}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(x) => f.write_str(x),
        }
    }
}

/// The ordered arguments of an event or a script call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventData {
    args: Vec<Value>,
}

impl EventData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument (builder style).
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.args.push(value.into());
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.args.get(i)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

impl From<Vec<Value>> for EventData {
    fn from(args: Vec<Value>) -> Self {
        Self { args }
    }
}

impl fmt::Display for EventData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.args.iter().join(", "))
    }
}

/// Dispatches named events to the frames registered for them.
#[derive(Debug, Default)]
pub struct EventEmitter {
    receivers: RefCell<HashMap<String, Vec<Weak<Object>>>>,
    /// Set while `LUA_ERROR` is being dispatched. A handler failing inside a
    /// `LUA_ERROR` handler does not fire another one.
    in_error: Cell<bool>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, event: &str, frame: &HFrame) {
        let mut receivers = self.receivers.borrow_mut();
        let list = receivers.entry(event.to_owned()).or_insert_with(Vec::new);
        if !list.iter().any(|w| frame.is(w)) {
            list.push(frame.downgrade());
        }
    }

    pub(crate) fn unregister(&self, event: &str, frame: &HFrame) {
        let mut receivers = self.receivers.borrow_mut();
        if let Some(list) = receivers.get_mut(event) {
            list.retain(|w| w.strong_count() > 0 && !frame.is(w));
            if list.is_empty() {
                receivers.remove(event);
            }
        }
    }

    /// Get the number of frames registered for `event`.
    pub fn num_receivers(&self, event: &str) -> usize {
        self.receivers.borrow().get(event).map_or(0, |list| {
            list.iter().filter(|w| w.strong_count() > 0).count()
        })
    }

    /// Deliver `event` to every registered frame as an `OnEvent` script call.
    ///
    /// The receiver list is snapshotted, so handlers may register and
    /// unregister frames freely.
    pub fn fire_event(&self, event: &str, data: &EventData) {
        let is_error = event == LUA_ERROR;
        if is_error && self.in_error.get() {
            error!("a LUA_ERROR handler failed: {}", data);
            return;
        }

        let receivers: Vec<HFrame> = match self.receivers.borrow().get(event) {
            Some(list) => list
                .iter()
                .filter_map(|w| w.upgrade())
                .filter_map(|obj| HObject::from_rc(obj).as_frame())
                .collect(),
            None => return,
        };
        debug!("firing {} {} to {} frame(s)", event, data, receivers.len());

        if is_error {
            self.in_error.set(true);
        }
        for frame in receivers {
            frame.on_event(event, data);
        }
        if is_error {
            self.in_error.set(false);
        }
    }
}
