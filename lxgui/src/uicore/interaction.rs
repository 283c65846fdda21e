//! Mouse, keyboard and focus state of frames.
use bitflags::bitflags;
use cgmath::Vector2;
use flags_macro::flags;
use log::debug;
use std::{
    cell::{Cell, RefCell},
    fmt,
};

use super::{Bounds2, EventData, HFrame};

bitflags! {
    /// Which input a frame reacts to.
    pub(super) struct InteractionFlags: u16 {
        /// Mouse buttons fire `OnMouseDown`/`OnMouseUp` on the frame.
        const MOUSE_CLICK = 1 << 0;
        /// The frame can be hovered and fires `OnEnter`/`OnLeave`.
        const MOUSE_MOVE = 1 << 1;
        const MOUSE_WHEEL = 1 << 2;
        const MOVABLE = 1 << 3;
        const RESIZABLE = 1 << 4;
        /// The frame was moved or resized by the user.
        const USER_PLACED = 1 << 5;
        /// The frame requests the focus when it is shown.
        const AUTO_FOCUS = 1 << 6;
        /// The frame is on top of the focus stack.
        const FOCUS = 1 << 7;
        /// The mouse cursor is over the frame.
        const MOUSE_IN_FRAME = 1 << 8;
    }
}

pub(super) struct InteractionState {
    flags: Cell<InteractionFlags>,
    drag_buttons: RefCell<Vec<String>>,
    captured_keys: RefCell<Vec<String>>,
    /// Fractions of the apparent dimensions.
    rel_hit_rect_insets: Cell<Bounds2<f32>>,
}

impl fmt::Debug for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InteractionState")
            .field("flags", &self.flags.get())
            .field("drag_buttons", &self.drag_buttons.borrow())
            .field("captured_keys", &self.captured_keys.borrow())
            .field("rel_hit_rect_insets", &self.rel_hit_rect_insets.get())
            .finish()
    }
}

impl InteractionState {
    pub(super) fn new() -> Self {
        Self {
            flags: Cell::new(InteractionFlags::empty()),
            drag_buttons: RefCell::new(Vec::new()),
            captured_keys: RefCell::new(Vec::new()),
            rel_hit_rect_insets: Cell::new(Bounds2::zero()),
        }
    }
}

impl HFrame {
    fn interaction(&self) -> &InteractionState {
        &self.state().interaction
    }

    fn has_interaction_flags(&self, flags: InteractionFlags) -> bool {
        self.interaction().flags.get().contains(flags)
    }

    /// Set or clear `flags`. Returns `true` if anything changed.
    fn set_interaction_flags(&self, flags: InteractionFlags, value: bool) -> bool {
        let cell = &self.interaction().flags;
        let old = cell.get();
        let mut new = old;
        new.set(flags, value);
        cell.set(new);
        old != new
    }

    // --------------------------------------------------------------------
    // Mouse

    /// Enable or disable both mouse clicks and mouse movement.
    pub fn enable_mouse(&self, enabled: bool) {
        self.set_interaction_flags(flags![InteractionFlags::{MOUSE_CLICK | MOUSE_MOVE}], enabled);
    }

    pub fn enable_mouse_click(&self, enabled: bool) {
        self.set_interaction_flags(InteractionFlags::MOUSE_CLICK, enabled);
    }

    /// Allow the frame to be hovered.
    ///
    /// A hovered frame that stops accepting mouse movement fires `OnLeave`
    /// on the next mouse movement.
    pub fn enable_mouse_move(&self, enabled: bool) {
        self.set_interaction_flags(InteractionFlags::MOUSE_MOVE, enabled);
    }

    pub fn enable_mouse_wheel(&self, enabled: bool) {
        self.set_interaction_flags(InteractionFlags::MOUSE_WHEEL, enabled);
    }

    pub fn is_mouse_click_enabled(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::MOUSE_CLICK)
    }

    pub fn is_mouse_move_enabled(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::MOUSE_MOVE)
    }

    pub fn is_mouse_wheel_enabled(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::MOUSE_WHEEL)
    }

    /// Check if the mouse cursor was over this frame at the last mouse
    /// movement.
    pub fn is_mouse_in_frame(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::MOUSE_IN_FRAME)
    }

    /// Record whether the mouse cursor is over the frame and fire
    /// `OnEnter`/`OnLeave` when it changes. `OnEnter` receives the cursor
    /// position.
    pub fn notify_mouse_in_frame(&self, in_frame: bool, position: Vector2<f32>) {
        if !self.set_interaction_flags(InteractionFlags::MOUSE_IN_FRAME, in_frame) {
            return;
        }
        if in_frame {
            self.fire_script("OnEnter", &EventData::new().with(position.x).with(position.y));
        } else {
            self.fire_script("OnLeave", &EventData::new());
        }
    }

    /// Accept drags started with any of `buttons`. Replaces the previous
    /// list; an empty list disables dragging.
    pub fn register_for_drag(&self, buttons: &[&str]) {
        *self.interaction().drag_buttons.borrow_mut() =
            buttons.iter().map(|&b| b.to_owned()).collect();
    }

    pub fn is_registered_for_drag(&self, button: &str) -> bool {
        self.interaction()
            .drag_buttons
            .borrow()
            .iter()
            .any(|b| b == button)
    }

    // --------------------------------------------------------------------
    // Keyboard

    /// Receive `OnKeyDown`/`OnKeyUp` for `key` even without the focus.
    pub fn enable_key_capture(&self, key: &str, enabled: bool) {
        let mut keys = self.interaction().captured_keys.borrow_mut();
        let pos = keys.iter().position(|k| k == key);
        match (enabled, pos) {
            (true, None) => keys.push(key.to_owned()),
            (false, Some(i)) => {
                keys.remove(i);
            }
            _ => {}
        }
    }

    pub fn is_key_capture_enabled(&self, key: &str) -> bool {
        self.interaction()
            .captured_keys
            .borrow()
            .iter()
            .any(|k| k == key)
    }

    // --------------------------------------------------------------------
    // Placement by the user

    pub fn is_movable(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::MOVABLE)
    }

    /// Allow [`Manager::start_moving`](super::Manager::start_moving) on this
    /// frame.
    pub fn set_movable(&self, movable: bool) {
        self.set_interaction_flags(InteractionFlags::MOVABLE, movable);
    }

    pub fn is_resizable(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::RESIZABLE)
    }

    /// Allow [`Manager::start_sizing`](super::Manager::start_sizing) on this
    /// frame.
    pub fn set_resizable(&self, resizable: bool) {
        self.set_interaction_flags(InteractionFlags::RESIZABLE, resizable);
    }

    pub fn is_user_placed(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::USER_PLACED)
    }

    pub fn set_user_placed(&self, user_placed: bool) {
        self.set_interaction_flags(InteractionFlags::USER_PLACED, user_placed);
    }

    // --------------------------------------------------------------------
    // Hit testing

    pub fn rel_hit_rect_insets(&self) -> Bounds2<f32> {
        self.interaction().rel_hit_rect_insets.get()
    }

    /// Shrink the area `is_in_region` accepts by `insets`, expressed as
    /// fractions of the apparent dimensions. Applied on top of the absolute
    /// insets.
    pub fn set_rel_hit_rect_insets(&self, insets: Bounds2<f32>) {
        self.interaction().rel_hit_rect_insets.set(insets);
    }

    // --------------------------------------------------------------------
    // Focus

    pub fn is_auto_focus_enabled(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::AUTO_FOCUS)
    }

    /// Request the focus whenever the frame is shown.
    pub fn enable_auto_focus(&self, enabled: bool) {
        self.set_interaction_flags(InteractionFlags::AUTO_FOCUS, enabled);
    }

    /// Check if this frame is the focused frame.
    pub fn has_focus(&self) -> bool {
        self.has_interaction_flags(InteractionFlags::FOCUS)
    }

    /// Request or release the focus.
    ///
    /// Requesting puts the frame on top of the manager's focus stack.
    /// Releasing removes it from the stack, giving the focus back to the
    /// frame below it.
    pub fn set_focus(&self, focus: bool) {
        if self.is_virtual() {
            return;
        }
        let manager = match self.manager() {
            Some(m) => m,
            None => return,
        };
        if focus {
            manager.request_focus(self);
        } else {
            manager.release_focus(self);
        }
    }

    /// Record a focus change and fire `OnFocusGained`/`OnFocusLost`.
    ///
    /// Called by the manager when the top of the focus stack changes.
    pub fn notify_focus(&self, focus: bool) {
        if !self.set_interaction_flags(InteractionFlags::FOCUS, focus) {
            return;
        }
        debug!("{}: focus {}", self.name(), if focus { "gained" } else { "lost" });
        if focus {
            self.fire_script("OnFocusGained", &EventData::new());
        } else {
            self.fire_script("OnFocusLost", &EventData::new());
        }
    }

    pub(super) fn copy_interaction_from(&self, template: &HFrame) {
        let src = template.interaction();
        let dst = self.interaction();
        let transient = flags![InteractionFlags::{FOCUS | MOUSE_IN_FRAME}];
        dst.flags
            .set((src.flags.get() - transient) | (dst.flags.get() & transient));
        *dst.drag_buttons.borrow_mut() = src.drag_buttons.borrow().clone();
        *dst.captured_keys.borrow_mut() = src.captured_keys.borrow().clone();
        dst.rel_hit_rect_insets.set(src.rel_hit_rect_insets.get());
    }
}
