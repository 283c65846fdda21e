//! The UI object model.
//!
//! # Objects
//!
//! Every widget is a UI object referred to by a handle type. [`HObject`] is
//! the untyped handle. [`HFrame`] refers to a frame, a container owning child
//! frames and layered regions. [`HRegion`] refers to a layered region (a
//! texture, a font string, or a plain region such as a title region). Handles
//! are reference-counted: a frame's child and region slots and the manager's
//! root frame list hold the owning handles. Every other reference (anchors,
//! dependency lists, registries, renderer buckets) is weak.
//!
//! # Layouting
//!
//! The geometry of an object is defined by up to nine *anchors*, each
//! attaching one point of the object to a point of another object (or of the
//! screen) with an offset. The resulting border rectangle is resolved lazily:
//!
//!  - Mutating an anchor or a dimension marks the object and everything
//!    anchored to it (transitively) as dirty.
//!  - Querying the borders of a dirty object resolves its anchor targets
//!    first, then combines the anchored positions with the object's
//!    dimensions axis by axis.
//!
//! Anchors forming a cycle are rejected when they are assigned, so
//! resolution always terminates. An object whose borders could not be
//! determined is *not ready* and is not drawn.
//!
//! # Composition
//!
//! Frames are drawn stratum by stratum, then level by level inside a
//! stratum (see [`FrameStrata`] and [`StrataList`]). The regions of a frame
//! are drawn layer by layer (see [`Layer`]).
use arrayvec::ArrayVec;
use bitflags::bitflags;
use cgmath::{vec2, Vector2, Zero};
use std::{
    cell::{Cell, RefCell},
    fmt,
    ops::Deref,
    rc::{Rc, Weak},
};

use crate::utils::{self, RoundingMethod};

mod anchor;
mod event;
mod frame;
mod input;
mod interaction;
mod layer;
mod layout;
mod lifecycle;
mod manager;
mod region;
mod registry;
mod renderer;
mod script;
mod types;

pub use self::anchor::{AnchorData, AnchorOffset, AnchorTarget};
pub use self::event::{EventData, EventEmitter, Value, LUA_ERROR};
pub use self::frame::Backdrop;
pub use self::lifecycle::{AliveChecker, ObjectAttributes};
pub use self::manager::{Manager, ManagerConfig, Root};
pub use self::registry::check_name;
pub use self::renderer::{FrameRenderer, RenderBackend, StrataList};
pub use self::script::{ScriptConnection, ScriptHandler, SCRIPT_NAMES};
pub use self::types::{AnchorPoint, Bounds2, FrameStrata, Layer, ObjectType};

use self::anchor::Anchor;
use self::frame::FrameState;
use self::manager::ManagerInner;

/// A handle to a UI object of any type.
#[derive(Debug, Clone)]
pub struct HObject {
    obj: Rc<Object>,
}

/// A handle to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HFrame {
    obj: HObject,
}

/// A handle to a layered region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HRegion {
    obj: HObject,
}

bitflags! {
    struct ObjectFlags: u16 {
        /// The object is a template. It is never shown, drawn nor laid out.
        const VIRTUAL = 1 << 0;
        /// The object is shown by itself (but may be hidden by an ancestor).
        const SHOWN = 1 << 1;
        /// The object and all of its ancestors are shown.
        const VISIBLE = 1 << 2;
        /// The last border resolution succeeded on both axes.
        const READY = 1 << 3;
        /// The object has been fully constructed. Scripts only run once this
        /// is set.
        const LOADED = 1 << 4;
        /// The object is owned by its parent in a dedicated slot (e.g., a
        /// title region) and is not copied by inheritance.
        const SPECIAL = 1 << 5;
        /// The object was created from at least one template.
        const INHERITS = 1 << 6;
        /// `destroy` has been called.
        const DESTROYED = 1 << 7;
    }
}

bitflags! {
    /// Indicates which derived property of an object must be recalculated.
    ///
    /// `BORDERS` is propagated to every object anchored to this one. The
    /// propagation stops at objects that are already dirty.
    struct ObjectDirtyFlags: u8 {
        /// The border rectangle may be out-of-date.
        const BORDERS = 1 << 0;

        /// The layer buckets of a frame must be rebuilt.
        const LAYERS = 1 << 1;

        /// The border rectangle is being resolved. (Technically, this is not
        /// a dirty bit.) Used to detect resolver re-entry.
        const UPDATING_BORDERS = 1 << 2;
    }
}

struct Object {
    manager: Weak<ManagerInner>,
    ty: ObjectType,
    name: String,
    raw_name: String,
    lua_name: String,
    flags: Cell<ObjectFlags>,
    dirty: Cell<ObjectDirtyFlags>,
    parent: RefCell<Weak<Object>>,
    alpha: Cell<f32>,
    dimensions: Cell<Vector2<f32>>,
    anchors: RefCell<[Option<Anchor>; 9]>,
    defined_borders: Cell<Bounds2<bool>>,
    borders: Cell<Bounds2<f32>>,
    /// Objects having an anchor attached to this object.
    anchored_objects: RefCell<Vec<Weak<Object>>>,
    /// The de-duplicated set of objects this object's anchors are attached to.
    anchor_parents: RefCell<ArrayVec<[Weak<Object>; 9]>>,
    /// Only meaningful for layered regions.
    draw_layer: Cell<Layer>,
    /// Only present for frames.
    frame: Option<Box<FrameState>>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Object")
            .field("ty", &self.ty)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("dirty", &self.dirty)
            .field("parent", &self.parent.borrow().upgrade().map(|p| p.name.clone()))
            .field("alpha", &self.alpha)
            .field("dimensions", &self.dimensions)
            .field("defined_borders", &self.defined_borders)
            .field("borders", &self.borders)
            .field("draw_layer", &self.draw_layer)
            .field("frame", &self.frame)
            .finish()
    }
}

impl Object {
    fn new(
        manager: Weak<ManagerInner>,
        ty: ObjectType,
        names: (String, String, String),
        is_virtual: bool,
        parent: Option<&HFrame>,
    ) -> Self {
        let (name, raw_name, lua_name) = names;
        let mut flags = ObjectFlags::SHOWN;
        flags.set(ObjectFlags::VIRTUAL, is_virtual);

        Self {
            manager,
            ty,
            name,
            raw_name,
            lua_name,
            flags: Cell::new(flags),
            dirty: Cell::new(ObjectDirtyFlags::BORDERS),
            parent: RefCell::new(parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.obj.obj))),
            alpha: Cell::new(1.0),
            dimensions: Cell::new(Vector2::zero()),
            anchors: RefCell::new(Default::default()),
            defined_borders: Cell::new(Bounds2::none()),
            borders: Cell::new(Bounds2::zero()),
            anchored_objects: RefCell::new(Vec::new()),
            anchor_parents: RefCell::new(ArrayVec::new()),
            draw_layer: Cell::new(Layer::default()),
            frame: if ty.is_frame() {
                Some(Box::new(FrameState::new(is_virtual)))
            } else {
                None
            },
        }
    }
}

// =======================================================================
//                            Handle conversions
// =======================================================================

impl HObject {
    fn from_rc(obj: Rc<Object>) -> Self {
        Self { obj }
    }

    pub(crate) fn downgrade(&self) -> Weak<Object> {
        Rc::downgrade(&self.obj)
    }

    /// Check if `weak` points to this object.
    pub(crate) fn is(&self, weak: &Weak<Object>) -> bool {
        Weak::ptr_eq(weak, &self.downgrade())
    }

    fn upgrade(weak: &Weak<Object>) -> Option<Self> {
        weak.upgrade().map(Self::from_rc)
    }

    /// Get a frame handle if this object is a frame.
    pub fn as_frame(&self) -> Option<HFrame> {
        if self.obj.ty.is_frame() {
            Some(HFrame { obj: self.clone() })
        } else {
            None
        }
    }

    /// Get a region handle if this object is a layered region.
    pub fn as_region(&self) -> Option<HRegion> {
        if self.obj.ty.is_layered_region() {
            Some(HRegion { obj: self.clone() })
        } else {
            None
        }
    }

    fn frame_state(&self) -> Option<&FrameState> {
        self.obj.frame.as_deref()
    }

    fn set_flag(&self, flag: ObjectFlags, value: bool) {
        let mut flags = self.obj.flags.get();
        flags.set(flag, value);
        self.obj.flags.set(flags);
    }

    fn has_flag(&self, flag: ObjectFlags) -> bool {
        self.obj.flags.get().contains(flag)
    }

    fn set_dirty_flags(&self, new_flags: ObjectDirtyFlags) {
        self.obj.dirty.set(self.obj.dirty.get() | new_flags);
    }

    fn clear_dirty_flags(&self, flags: ObjectDirtyFlags) {
        self.obj.dirty.set(self.obj.dirty.get() - flags);
    }

    fn has_dirty_flags(&self, flags: ObjectDirtyFlags) -> bool {
        self.obj.dirty.get().intersects(flags)
    }
}

impl PartialEq for HObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.obj, &other.obj)
    }
}

impl Eq for HObject {}

impl HFrame {
    fn state(&self) -> &FrameState {
        match self.obj.frame_state() {
            Some(state) => state,
            None => unreachable!("a frame handle refers to a non-frame object"),
        }
    }

    /// Get the untyped handle.
    pub fn to_object(&self) -> HObject {
        self.obj.clone()
    }
}

impl Deref for HFrame {
    type Target = HObject;

    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl From<HFrame> for HObject {
    fn from(x: HFrame) -> HObject {
        x.obj
    }
}

impl HRegion {
    /// Get the untyped handle.
    pub fn to_object(&self) -> HObject {
        self.obj.clone()
    }
}

impl Deref for HRegion {
    type Target = HObject;

    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl From<HRegion> for HObject {
    fn from(x: HRegion) -> HObject {
        x.obj
    }
}

// =======================================================================
//                              Public methods
// =======================================================================

impl HObject {
    /// Get the name of the object. For concrete objects, this is the name
    /// after `$parent` substitution.
    pub fn name(&self) -> &str {
        &self.obj.name
    }

    /// Get the name as it was given to the factory.
    pub fn raw_name(&self) -> &str {
        &self.obj.raw_name
    }

    /// Get the name after `$parent` substitution, even for virtual objects.
    pub fn lua_name(&self) -> &str {
        &self.obj.lua_name
    }

    pub fn object_type(&self) -> ObjectType {
        self.obj.ty
    }

    /// Check if the object's type chain contains `type_name` (e.g.,
    /// `"LayeredRegion"` for a texture).
    pub fn is_object_type(&self, type_name: &str) -> bool {
        self.obj.ty.type_chain().contains(&type_name)
    }

    pub fn is_virtual(&self) -> bool {
        self.has_flag(ObjectFlags::VIRTUAL)
    }

    /// Check if the object occupies a dedicated slot of its parent.
    pub fn is_special(&self) -> bool {
        self.has_flag(ObjectFlags::SPECIAL)
    }

    /// Check if the object was created from at least one template.
    pub fn inherits(&self) -> bool {
        self.has_flag(ObjectFlags::INHERITS)
    }

    pub fn is_loaded(&self) -> bool {
        self.has_flag(ObjectFlags::LOADED)
    }

    pub fn is_destroyed(&self) -> bool {
        self.has_flag(ObjectFlags::DESTROYED)
    }

    /// Get the parent frame.
    pub fn parent(&self) -> Option<HFrame> {
        HObject::upgrade(&self.obj.parent.borrow()).and_then(|p| p.as_frame())
    }

    pub(crate) fn manager(&self) -> Option<Rc<ManagerInner>> {
        self.obj.manager.upgrade()
    }

    // --------------------------------------------------------------------
    // Alpha

    pub fn set_alpha(&self, alpha: f32) {
        if self.obj.alpha.get() != alpha {
            self.obj.alpha.set(alpha);
            self.notify_renderer_need_redraw();
        }
    }

    pub fn alpha(&self) -> f32 {
        self.obj.alpha.get()
    }

    /// Get the alpha value multiplied by every ancestor's.
    pub fn effective_alpha(&self) -> f32 {
        match self.parent() {
            Some(p) => self.alpha() * p.effective_alpha(),
            None => self.alpha(),
        }
    }

    // --------------------------------------------------------------------
    // Visibility

    /// Show the object. It becomes visible if its parent is visible.
    pub fn show(&self) {
        if self.has_flag(ObjectFlags::SHOWN) {
            return;
        }
        self.set_flag(ObjectFlags::SHOWN, true);

        if self.is_virtual() {
            return;
        }

        let parent_visible = self.parent().map_or(true, |p| p.is_visible());
        if parent_visible && !self.is_visible() {
            self.notify_visible();
        }
    }

    /// Hide the object and everything it contains.
    pub fn hide(&self) {
        if !self.has_flag(ObjectFlags::SHOWN) {
            return;
        }
        self.set_flag(ObjectFlags::SHOWN, false);

        if self.is_visible() {
            self.notify_invisible();
        }
    }

    pub fn set_shown(&self, shown: bool) {
        if shown {
            self.show();
        } else {
            self.hide();
        }
    }

    pub fn is_shown(&self) -> bool {
        self.has_flag(ObjectFlags::SHOWN)
    }

    /// Check if the object and all of its ancestors are shown.
    pub fn is_visible(&self) -> bool {
        self.has_flag(ObjectFlags::VISIBLE)
    }

    pub(crate) fn notify_visible(&self) {
        if self.is_virtual() {
            return;
        }
        self.set_flag(ObjectFlags::VISIBLE, true);
        if let Some(frame) = self.as_frame() {
            frame.on_visibility_changed(true);
        }
        self.notify_renderer_need_redraw();
    }

    pub(crate) fn notify_invisible(&self) {
        if self.is_virtual() {
            return;
        }
        self.set_flag(ObjectFlags::VISIBLE, false);
        if let Some(frame) = self.as_frame() {
            frame.on_visibility_changed(false);
        }
        self.notify_renderer_need_redraw();
    }

    /// Bring the visibility flag in line with the parent's.
    pub(crate) fn sync_visibility_with_parent(&self) {
        if self.is_virtual() {
            return;
        }
        let visible = self.is_shown() && self.parent().map_or(true, |p| p.is_visible());
        if visible != self.is_visible() {
            if visible {
                self.notify_visible();
            } else {
                self.notify_invisible();
            }
        }
    }

    // --------------------------------------------------------------------
    // Dimensions

    /// Set the explicit dimensions of the object in UI units. They are used
    /// on axes not fully determined by anchors.
    pub fn set_dimensions(&self, dims: Vector2<f32>) {
        let dims = match self.as_frame() {
            Some(frame) => frame.clamp_dimensions(dims),
            None => dims,
        };
        if self.obj.dimensions.get() == dims {
            return;
        }
        self.obj.dimensions.set(dims);
        if !self.is_virtual() {
            self.notify_borders_need_update();
        }
    }

    pub fn set_width(&self, width: f32) {
        let dims = self.dimensions();
        self.set_dimensions(vec2(width, dims.y));
    }

    pub fn set_height(&self, height: f32) {
        let dims = self.dimensions();
        self.set_dimensions(vec2(dims.x, height));
    }

    /// Set the dimensions as a fraction of the parent's apparent dimensions
    /// (or of the renderer's target if there is no parent).
    pub fn set_relative_dimensions(&self, rel: Vector2<f32>) {
        let base = self.relative_base();
        self.set_dimensions(vec2(rel.x * base.x, rel.y * base.y));
    }

    pub fn set_relative_width(&self, rel: f32) {
        self.set_width(rel * self.relative_base().x);
    }

    pub fn set_relative_height(&self, rel: f32) {
        self.set_height(rel * self.relative_base().y);
    }

    fn relative_base(&self) -> Vector2<f32> {
        match self.parent() {
            Some(p) => p.apparent_dimensions(),
            None => self.renderer_target_dimensions(),
        }
    }

    /// Get the explicit dimensions.
    pub fn dimensions(&self) -> Vector2<f32> {
        self.obj.dimensions.get()
    }

    // --------------------------------------------------------------------
    // Rendering plumbing

    /// Round a value in UI units to the device pixel grid.
    pub fn round_to_pixel(&self, value: f32, method: RoundingMethod) -> f32 {
        let scale = self
            .manager()
            .map_or(1.0, |m| m.interface_scaling_factor());
        utils::round(value, 1.0 / scale, method)
    }

    /// Get the renderer this object is drawn by: the nearest renderer
    /// override on the ancestor chain, or the manager's root renderer.
    pub fn top_level_renderer(&self) -> Option<Rc<dyn FrameRenderer>> {
        if let Some(renderer) = self.frame_state().and_then(|s| s.renderer_override()) {
            return Some(renderer);
        }
        match self.parent() {
            Some(p) => p.top_level_renderer(),
            None => self.manager().map(|m| m.root_renderer()),
        }
    }

    /// Get the dimensions of the area the top-level renderer draws into.
    pub fn renderer_target_dimensions(&self) -> Vector2<f32> {
        self.top_level_renderer()
            .map_or_else(Vector2::zero, |r| r.target_dimensions())
    }

    /// Tell the top-level renderer that the object's stratum must be
    /// redrawn. Regions forward the request to their parent frame.
    pub fn notify_renderer_need_redraw(&self) {
        if self.is_virtual() {
            return;
        }
        match self.as_frame() {
            Some(frame) => {
                if let Some(renderer) = frame.top_level_renderer() {
                    renderer.notify_strata_needs_redraw(frame.frame_strata());
                }
            }
            None => {
                if let Some(parent) = self.parent() {
                    parent.notify_renderer_need_redraw();
                }
            }
        }
    }

    /// Tell the object that the interface scaling factor changed.
    pub fn notify_scaling_factor_updated(&self) {
        if let Some(frame) = self.as_frame() {
            frame.propagate_scaling_factor_updated();
        }
        self.notify_borders_need_update();
    }

    pub(crate) fn notify_object_moved(&self) {
        if let Some(m) = self.manager() {
            m.notify_object_moved();
        }
    }
}
