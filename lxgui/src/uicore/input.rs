//! Input dispatch: focus, hovering, mouse buttons, dragging and keys.
//!
//! The host feeds raw input to the [`Manager`]. Every dispatch method
//! returns `true` if a frame captured the input, `false` if it should be
//! forwarded to whatever lies behind the interface.
use cgmath::{vec2, Vector2, Zero};
use log::{debug, warn};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Weak,
};

use super::{
    manager::ManagerInner, AnchorData, AnchorOffset, AnchorPoint, AnchorTarget, EventData,
    HFrame, HObject, Manager, Object,
};

/// A frame being moved with the mouse.
#[derive(Debug)]
struct Moving {
    frame: Weak<Object>,
    start: Vector2<f32>,
}

/// A frame being resized with the mouse.
#[derive(Debug)]
struct Sizing {
    frame: Weak<Object>,
    start: Vector2<f32>,
    from_right: bool,
    from_bottom: bool,
    width: bool,
    height: bool,
}

pub(super) struct InputState {
    /// The last entry is the focused frame.
    focus_stack: RefCell<Vec<Weak<Object>>>,
    hovered: RefCell<Weak<Object>>,
    dragged: RefCell<Weak<Object>>,
    moving: RefCell<Option<Moving>>,
    sizing: RefCell<Option<Sizing>>,
    mouse_position: Cell<Vector2<f32>>,
    /// Accumulated since `start_moving` or `start_sizing`.
    mouse_movement: Cell<Vector2<f32>>,
}

impl fmt::Debug for InputState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InputState")
            .field("focus_stack", &self.focus_stack.borrow().len())
            .field("moving", &self.moving.borrow().is_some())
            .field("sizing", &self.sizing.borrow().is_some())
            .field("mouse_position", &self.mouse_position.get())
            .finish()
    }
}

impl InputState {
    pub(super) fn new() -> Self {
        Self {
            focus_stack: RefCell::new(Vec::new()),
            hovered: RefCell::new(Weak::new()),
            dragged: RefCell::new(Weak::new()),
            moving: RefCell::new(None),
            sizing: RefCell::new(None),
            mouse_position: Cell::new(Vector2::zero()),
            mouse_movement: Cell::new(Vector2::zero()),
        }
    }
}

fn live_frame(weak: &Weak<Object>) -> Option<HFrame> {
    HObject::upgrade(weak)
        .filter(|obj| !obj.is_destroyed())
        .and_then(|obj| obj.as_frame())
}

/// Destroyed frames leave the focus stack in `forget_frame`, so they are
/// not filtered out here.
fn stacked_frame(weak: &Weak<Object>) -> Option<HFrame> {
    HObject::upgrade(weak).and_then(|obj| obj.as_frame())
}

impl ManagerInner {
    pub(crate) fn focused_frame(&self) -> Option<HFrame> {
        self.input()
            .focus_stack
            .borrow()
            .iter()
            .rev()
            .find_map(stacked_frame)
    }

    /// Put `frame` on top of the focus stack.
    pub(crate) fn request_focus(&self, frame: &HFrame) {
        let old = self.focused_frame();
        {
            let mut stack = self.input().focus_stack.borrow_mut();
            stack.retain(|w| !frame.is(w) && stacked_frame(w).is_some());
            stack.push(frame.downgrade());
        }
        self.on_focus_changed(old);
    }

    /// Remove `frame` from the focus stack.
    pub(crate) fn release_focus(&self, frame: &HFrame) {
        let old = self.focused_frame();
        self.input()
            .focus_stack
            .borrow_mut()
            .retain(|w| !frame.is(w) && stacked_frame(w).is_some());
        self.on_focus_changed(old);
    }

    pub(crate) fn clear_focus(&self) {
        let old = self.focused_frame();
        self.input().focus_stack.borrow_mut().clear();
        self.on_focus_changed(old);
    }

    fn on_focus_changed(&self, old: Option<HFrame>) {
        let new = self.focused_frame();
        if old == new {
            return;
        }
        if let Some(old) = old {
            old.notify_focus(false);
        }
        if let Some(new) = new {
            new.notify_focus(true);
        }
    }

    /// Drop every reference the input state holds to a destroyed frame.
    pub(crate) fn forget_frame(&self, frame: &HFrame) {
        self.release_focus(frame);
        let input = self.input();
        for slot in [&input.hovered, &input.dragged].iter() {
            if frame.is(&slot.borrow()) {
                *slot.borrow_mut() = Weak::new();
            }
        }
        if matches!(&*input.moving.borrow(), Some(m) if frame.is(&m.frame)) {
            *input.moving.borrow_mut() = None;
        }
        if matches!(&*input.sizing.borrow(), Some(s) if frame.is(&s.frame)) {
            *input.sizing.borrow_mut() = None;
        }
    }

    fn apply_mouse_movement(&self, movement: Vector2<f32>) {
        let input = self.input();
        let total = input.mouse_movement.get() + movement;
        input.mouse_movement.set(total);

        let moving = input
            .moving
            .borrow()
            .as_ref()
            .and_then(|m| Some((live_frame(&m.frame)?, m.start)));
        if let Some((frame, start)) = moving {
            let offset = start + total;
            frame.set_point(
                AnchorData::new(AnchorPoint::TopLeft, AnchorTarget::Screen, AnchorPoint::TopLeft)
                    .with_offset(offset.x, offset.y),
            );
            return;
        }

        let sizing = input
            .sizing
            .borrow()
            .as_ref()
            .and_then(|s| {
                let width = if s.from_right {
                    s.start.x + total.x
                } else {
                    s.start.x - total.x
                };
                let height = if s.from_bottom {
                    s.start.y + total.y
                } else {
                    s.start.y - total.y
                };
                Some((
                    live_frame(&s.frame)?,
                    vec2(width.max(0.0), height.max(0.0)),
                    s.width,
                    s.height,
                ))
            });
        if let Some((frame, dims, width, height)) = sizing {
            match (width, height) {
                (true, true) => frame.set_dimensions(dims),
                (true, false) => frame.set_width(dims.x),
                (false, true) => frame.set_height(dims.y),
                (false, false) => {}
            }
        }
    }

    fn topmost_frame_at(&self, pos: Vector2<f32>, pred: impl Fn(&HFrame) -> bool) -> Option<HFrame> {
        self.root()
            .find_topmost_frame(|f| pred(f) && f.is_in_region(pos))
    }
}

// =======================================================================
//                              Public methods
// =======================================================================

impl Manager {
    // --------------------------------------------------------------------
    // Focus

    /// Get the frame receiving keyboard input first.
    pub fn focused_frame(&self) -> Option<HFrame> {
        self.inner.focused_frame()
    }

    /// Empty the focus stack.
    pub fn clear_focus(&self) {
        self.inner.clear_focus();
    }

    // --------------------------------------------------------------------
    // Mouse

    pub fn mouse_position(&self) -> Vector2<f32> {
        self.inner.input().mouse_position.get()
    }

    /// Get the frame under the mouse cursor, as of the last mouse movement.
    pub fn hovered_frame(&self) -> Option<HFrame> {
        live_frame(&self.inner.input().hovered.borrow())
    }

    /// Move the mouse cursor to `position` (in UI units).
    ///
    /// Moves or resizes the frame being placed by the user, then updates
    /// the hovered frame: the top-most frame accepting mouse movement under
    /// the cursor. `OnLeave` fires on the frame the cursor left, then
    /// `OnEnter` on the new one.
    pub fn on_mouse_moved(&self, position: Vector2<f32>) -> bool {
        let input = self.inner.input();
        let movement = position - input.mouse_position.replace(position);
        self.inner.apply_mouse_movement(movement);
        self.update_hovered_frame()
    }

    /// Re-run the hover test at the current cursor position. Call this
    /// after the layout changed under a still cursor.
    pub fn update_hovered_frame(&self) -> bool {
        let input = self.inner.input();
        let pos = input.mouse_position.get();
        let hovered = self.inner.topmost_frame_at(pos, HFrame::is_mouse_move_enabled);
        let old = live_frame(&input.hovered.borrow());
        *input.hovered.borrow_mut() = hovered.as_ref().map_or_else(Weak::new, |f| f.downgrade());

        if old != hovered {
            if let Some(old) = old {
                old.notify_mouse_in_frame(false, pos);
            }
            if let Some(new) = &hovered {
                new.notify_mouse_in_frame(true, pos);
            }
        }
        hovered.is_some()
    }

    /// Press or release `button` at the cursor position.
    ///
    /// The target is the top-most frame accepting clicks under the cursor.
    /// A press that is not a double click clears the focus unless it hits
    /// the focused frame. A press raises the target's top-level parent and
    /// fires `OnMouseDown`; a release fires `OnMouseUp`; a double click
    /// fires `OnDoubleClick`. The handlers receive the button name and the
    /// cursor position.
    pub fn on_mouse_button(&self, button: &str, pressed: bool, double_click: bool) -> bool {
        let pos = self.mouse_position();
        let target = self.inner.topmost_frame_at(pos, HFrame::is_mouse_click_enabled);

        if pressed && !double_click && (target.is_none() || target != self.focused_frame()) {
            self.clear_focus();
        }

        let target = match target {
            Some(t) => t,
            None => return false,
        };
        let data = EventData::new().with(button).with(pos.x).with(pos.y);

        if double_click {
            target.fire_script("OnDoubleClick", &data);
        } else if pressed {
            if let Some(top_level) = target.top_level_parent() {
                top_level.raise();
            }
            target.fire_script("OnMouseDown", &data);
        } else {
            target.fire_script("OnMouseUp", &data);
        }
        true
    }

    /// Scroll the mouse wheel by `scroll` notches at the cursor position.
    /// `OnMouseWheel` fires on the top-most frame accepting the wheel.
    pub fn on_mouse_wheel(&self, scroll: f32) -> bool {
        let pos = self.mouse_position();
        match self.inner.topmost_frame_at(pos, HFrame::is_mouse_wheel_enabled) {
            Some(frame) => {
                let data = EventData::new().with(scroll).with(pos.x).with(pos.y);
                frame.fire_script("OnMouseWheel", &data);
                true
            }
            None => false,
        }
    }

    /// Start dragging with `button` at the cursor position.
    ///
    /// Dragging the title region of a movable frame moves the frame. If the
    /// clicked frame is registered for `button`, it becomes the dragged
    /// frame and fires `OnDragStart`.
    pub fn on_drag_start(&self, button: &str) -> bool {
        let pos = self.mouse_position();
        let frame = match self.inner.topmost_frame_at(pos, HFrame::is_mouse_click_enabled) {
            Some(f) => f,
            None => return false,
        };

        if let Some(title) = frame.title_region() {
            if title.is_in_region(pos) {
                self.start_moving(&frame);
            }
        }

        if frame.is_registered_for_drag(button) {
            *self.inner.input().dragged.borrow_mut() = frame.downgrade();
            frame.fire_script(
                "OnDragStart",
                &EventData::new().with(button).with(pos.x).with(pos.y),
            );
        }
        true
    }

    /// Stop dragging with `button` at the cursor position.
    ///
    /// Ends any user placement, fires `OnDragStop` on the dragged frame,
    /// then `OnReceiveDrag` on the frame under the cursor if it is
    /// registered for `button`.
    pub fn on_drag_stop(&self, button: &str) -> bool {
        self.stop_moving();
        self.stop_sizing();

        let dragged = {
            let mut slot = self.inner.input().dragged.borrow_mut();
            let frame = live_frame(&slot);
            *slot = Weak::new();
            frame
        };
        if let Some(dragged) = dragged {
            dragged.fire_script("OnDragStop", &EventData::new());
        }

        let pos = self.mouse_position();
        let frame = match self.inner.topmost_frame_at(pos, HFrame::is_mouse_click_enabled) {
            Some(f) => f,
            None => return false,
        };
        if frame.is_registered_for_drag(button) {
            frame.fire_script(
                "OnReceiveDrag",
                &EventData::new().with(button).with(pos.x).with(pos.y),
            );
        }
        true
    }

    /// Get the frame being dragged, if any.
    pub fn dragged_frame(&self) -> Option<HFrame> {
        live_frame(&self.inner.input().dragged.borrow())
    }

    // --------------------------------------------------------------------
    // Keyboard

    /// Enter the character `c`. `OnChar` fires on the focused frame with
    /// the character and its code point.
    pub fn on_char(&self, c: char) -> bool {
        match self.focused_frame() {
            Some(frame) => {
                let data = EventData::new()
                    .with(c.to_string())
                    .with(i64::from(u32::from(c)));
                frame.fire_script("OnChar", &data);
                true
            }
            None => false,
        }
    }

    /// Press or release the key named `key` (including modifier prefixes
    /// such as `Ctrl-`).
    ///
    /// The focused frame receives `OnKeyDown`/`OnKeyUp`. Without a focused
    /// frame, the top-most frame capturing `key` receives it.
    pub fn on_key(&self, key: &str, pressed: bool) -> bool {
        let target = self
            .focused_frame()
            .or_else(|| self.find_topmost_frame(|f| f.is_key_capture_enabled(key)));
        match target {
            Some(frame) => {
                let name = if pressed { "OnKeyDown" } else { "OnKeyUp" };
                frame.fire_script(name, &EventData::new().with(key));
                true
            }
            None => false,
        }
    }

    // --------------------------------------------------------------------
    // Placement by the user

    /// Make `frame` follow the mouse cursor until `stop_moving`.
    ///
    /// The frame's anchors are replaced with a single top-left anchor on
    /// the screen at its current position. Does nothing unless the frame is
    /// movable. Stops any resizing.
    pub fn start_moving(&self, frame: &HFrame) {
        if !frame.is_movable() {
            warn!("{}: cannot move a frame that is not movable", frame.name());
            return;
        }
        self.stop_sizing();

        let start = frame.borders().top_left();
        frame.clear_all_points();
        frame.set_point(AnchorData {
            point: AnchorPoint::TopLeft,
            target: AnchorTarget::Screen,
            parent_point: AnchorPoint::TopLeft,
            offset: AnchorOffset::Abs(start),
        });
        frame.set_user_placed(true);
        debug!("{}: start moving", frame.name());

        let input = self.inner.input();
        input.mouse_movement.set(Vector2::zero());
        *input.moving.borrow_mut() = Some(Moving {
            frame: frame.downgrade(),
            start,
        });
    }

    pub fn stop_moving(&self) {
        *self.inner.input().moving.borrow_mut() = None;
    }

    pub fn is_moving(&self, frame: &HFrame) -> bool {
        matches!(&*self.inner.input().moving.borrow(), Some(m) if frame.is(&m.frame))
    }

    /// Resize `frame` with the mouse cursor from `point` until
    /// `stop_sizing`.
    ///
    /// The opposite point stays in place. Sides and corners resize one and
    /// both axes respectively. Does nothing unless the frame is resizable,
    /// nor for `Center`. Stops any moving.
    pub fn start_sizing(&self, frame: &HFrame, point: AnchorPoint) {
        if !frame.is_resizable() {
            warn!("{}: cannot resize a frame that is not resizable", frame.name());
            return;
        }
        let (opposite, from_right, from_bottom) = match point {
            AnchorPoint::TopLeft | AnchorPoint::Top => (AnchorPoint::BottomRight, false, false),
            AnchorPoint::TopRight | AnchorPoint::Right => (AnchorPoint::BottomLeft, true, false),
            AnchorPoint::BottomRight | AnchorPoint::Bottom => (AnchorPoint::TopLeft, true, true),
            AnchorPoint::BottomLeft | AnchorPoint::Left => (AnchorPoint::TopRight, false, true),
            AnchorPoint::Center => {
                warn!("{}: cannot resize from the center", frame.name());
                return;
            }
        };
        self.stop_moving();

        let borders = frame.borders();
        let start = frame.apparent_dimensions();
        frame.clear_all_points();
        frame.set_point(AnchorData {
            point: opposite,
            target: AnchorTarget::Screen,
            parent_point: AnchorPoint::TopLeft,
            offset: AnchorOffset::Abs(borders.point(opposite)),
        });
        frame.set_dimensions(start);
        frame.set_user_placed(true);
        debug!("{}: start sizing from {}", frame.name(), point.as_str());

        let input = self.inner.input();
        input.mouse_movement.set(Vector2::zero());
        *input.sizing.borrow_mut() = Some(Sizing {
            frame: frame.downgrade(),
            start,
            from_right,
            from_bottom,
            width: point != AnchorPoint::Top && point != AnchorPoint::Bottom,
            height: point != AnchorPoint::Left && point != AnchorPoint::Right,
        });
    }

    pub fn stop_sizing(&self) {
        *self.inner.input().sizing.borrow_mut() = None;
    }

    pub fn is_sizing(&self, frame: &HFrame) -> bool {
        matches!(&*self.inner.input().sizing.borrow(), Some(s) if frame.is(&s.frame))
    }
}
