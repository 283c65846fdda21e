//! Script handlers of frames.
use log::{error, warn};
use std::{
    cell::Cell,
    fmt,
    rc::{Rc, Weak},
};

use super::{AliveChecker, EventData, HFrame, Value, LUA_ERROR};
use crate::ScriptResult;

/// The script names a frame accepts.
pub const SCRIPT_NAMES: &[&str] = &[
    "OnLoad",
    "OnShow",
    "OnHide",
    "OnUpdate",
    "OnSizeChanged",
    "OnEvent",
    "OnEnter",
    "OnLeave",
    "OnMouseDown",
    "OnMouseUp",
    "OnMouseWheel",
    "OnKeyDown",
    "OnKeyUp",
    "OnChar",
    "OnDragStart",
    "OnDragStop",
    "OnReceiveDrag",
    "OnFocusGained",
    "OnFocusLost",
    "OnDoubleClick",
];

/// The function type of script handlers.
pub type ScriptHandler = Rc<dyn Fn(&HFrame, &EventData) -> ScriptResult>;

pub(crate) struct ScriptSlot {
    handler: ScriptHandler,
    connected: Cell<bool>,
}

impl fmt::Debug for ScriptSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ScriptSlot")
            .field("connected", &self.connected)
            .finish()
    }
}

impl ScriptSlot {
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub(crate) fn handler(&self) -> ScriptHandler {
        self.handler.clone()
    }
}

/// Represents a script handler registration.
///
/// Dropping a `ScriptConnection` does not disconnect the handler.
#[derive(Debug, Clone)]
pub struct ScriptConnection {
    slot: Weak<ScriptSlot>,
}

impl ScriptConnection {
    /// Disconnect the handler. It is no longer called, and it is erased
    /// during the frame's next `update`.
    pub fn disconnect(&self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.connected.set(false);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slot.upgrade().map_or(false, |s| s.is_connected())
    }
}

impl HFrame {
    /// Check if `name` is a script name frames accept.
    pub fn can_use_script(&self, name: &str) -> bool {
        SCRIPT_NAMES.contains(&name)
    }

    /// Register a script handler.
    ///
    /// If `append` is `false`, the handlers already registered for `name`
    /// are disconnected first. Returns `None` if frames do not accept the
    /// script name.
    pub fn define_script(
        &self,
        name: &str,
        handler: impl Fn(&HFrame, &EventData) -> ScriptResult + 'static,
        append: bool,
    ) -> Option<ScriptConnection> {
        self.define_script_handler(name, Rc::new(handler), append)
    }

    /// `define_script` for an already shared handler.
    pub fn define_script_handler(
        &self,
        name: &str,
        handler: ScriptHandler,
        append: bool,
    ) -> Option<ScriptConnection> {
        if !self.can_use_script(name) {
            warn!("{}: frames cannot use the {:?} script", self.name(), name);
            return None;
        }

        let slot = Rc::new(ScriptSlot {
            handler,
            connected: Cell::new(true),
        });
        let connection = ScriptConnection {
            slot: Rc::downgrade(&slot),
        };

        let mut scripts = self.state().scripts.borrow_mut();
        let list = scripts.entry(name.to_owned()).or_insert_with(Vec::new);
        if !append {
            for old in list.iter() {
                old.connected.set(false);
            }
        }
        list.push(slot);

        Some(connection)
    }

    /// Disconnect every handler of `name`.
    pub fn remove_script(&self, name: &str) {
        if let Some(list) = self.state().scripts.borrow().get(name) {
            for slot in list.iter() {
                slot.connected.set(false);
            }
        }
    }

    /// Check if `name` has at least one connected handler.
    pub fn has_script(&self, name: &str) -> bool {
        self.state()
            .scripts
            .borrow()
            .get(name)
            .map_or(false, |list| list.iter().any(|s| s.is_connected()))
    }

    /// Get the connected handlers of `name` in registration order.
    pub fn script_handlers(&self, name: &str) -> Vec<ScriptHandler> {
        self.state()
            .scripts
            .borrow()
            .get(name)
            .map(|list| {
                list.iter()
                    .filter(|s| s.is_connected())
                    .map(|s| s.handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Call the handlers of `name`.
    ///
    /// Does nothing until the frame is loaded. A failing handler stops the
    /// remaining handlers of this call; the error is logged and fired as
    /// [`LUA_ERROR`]. Handlers may destroy the frame, in which case the
    /// remaining handlers are skipped.
    pub fn fire_script(&self, name: &str, data: &EventData) {
        if !self.is_loaded() || self.is_virtual() {
            return;
        }

        let slots = match self.state().scripts.borrow().get(name) {
            Some(list) => list.clone(),
            None => return,
        };

        let checker = AliveChecker::new(self);
        for slot in slots {
            if !slot.is_connected() {
                continue;
            }

            let result = (slot.handler)(self, data);

            if let Err(e) = result {
                let message = format!("{}:{}: {}", self.name(), name, e);
                error!("{}", message);
                if let Some(manager) = self.manager() {
                    manager
                        .events()
                        .fire_event(LUA_ERROR, &EventData::new().with(message));
                }
                break;
            }

            if !checker.is_alive() {
                return;
            }
        }
    }

    /// Erase disconnected handlers.
    pub(crate) fn remove_disconnected_scripts(&self) {
        let mut scripts = self.state().scripts.borrow_mut();
        scripts.retain(|_, list| {
            list.retain(|s| s.is_connected());
            !list.is_empty()
        });
    }

    // --------------------------------------------------------------------
    // Game events

    /// Receive `event` through `OnEvent` whenever it is fired.
    pub fn register_event(&self, event: &str) {
        if self.is_virtual() {
            return;
        }
        {
            let mut events = self.state().registered_events.borrow_mut();
            if events.iter().any(|e| e == event) {
                return;
            }
            events.push(event.to_owned());
        }
        if let Some(manager) = self.manager() {
            manager.events().register(event, self);
        }
    }

    pub fn unregister_event(&self, event: &str) {
        self.state()
            .registered_events
            .borrow_mut()
            .retain(|e| e != event);
        if let Some(manager) = self.manager() {
            manager.events().unregister(event, self);
        }
    }

    pub(crate) fn unregister_all_events(&self) {
        let events = std::mem::replace(&mut *self.state().registered_events.borrow_mut(), Vec::new());
        if let Some(manager) = self.manager() {
            for event in events.iter() {
                manager.events().unregister(event, self);
            }
        }
    }

    pub fn is_event_registered(&self, event: &str) -> bool {
        self.state()
            .registered_events
            .borrow()
            .iter()
            .any(|e| e == event)
    }

    pub(crate) fn on_event(&self, event: &str, data: &EventData) {
        let mut args = vec![Value::from(event)];
        args.extend(data.args().iter().cloned());
        self.fire_script("OnEvent", &EventData::from(args));
    }
}
