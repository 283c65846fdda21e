//! The object factory and owner of the root frames.
use cgmath::{vec2, Vector2};
use log::{debug, trace, warn};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use super::{
    input::InputState,
    registry::{check_name, Registry},
    renderer::find_topmost_frame,
    EventEmitter, FrameRenderer, FrameStrata, HFrame, HObject, Object, ObjectAttributes,
    RenderBackend, StrataList,
};

/// The configuration of a [`Manager`].
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// The size of the screen in device pixels.
    pub screen_dimensions: Vector2<f32>,
    /// The number of device pixels per UI unit.
    pub interface_scaling_factor: f32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            screen_dimensions: vec2(800.0, 600.0),
            interface_scaling_factor: 1.0,
        }
    }
}

/// The default renderer, drawing every frame without a renderer override
/// directly to the screen.
#[derive(Debug)]
pub struct Root {
    strata: RefCell<StrataList>,
    target_dimensions: Cell<Vector2<f32>>,
}

impl Root {
    fn new(target_dimensions: Vector2<f32>) -> Self {
        Self {
            strata: RefCell::new(StrataList::new()),
            target_dimensions: Cell::new(target_dimensions),
        }
    }

    /// Get the frames drawn by this renderer in drawing order.
    pub fn frames(&self) -> Vec<HFrame> {
        self.strata.borrow_mut().frames()
    }

    pub fn num_frames(&self) -> usize {
        self.strata.borrow().num_frames()
    }

    /// Check if `strata` must be redrawn.
    pub fn needs_redraw(&self, strata: FrameStrata) -> bool {
        self.strata.borrow().needs_redraw(strata)
    }

    /// Check if the frame list changed since the last call, and reset the
    /// flag.
    pub fn take_list_changed(&self) -> bool {
        self.strata.borrow_mut().take_list_changed()
    }

    /// Find the top-most visible frame satisfying `pred`.
    pub fn find_topmost_frame(&self, pred: impl FnMut(&HFrame) -> bool) -> Option<HFrame> {
        find_topmost_frame(self.frames(), pred)
    }

    /// Draw every frame, then clear the redraw flags.
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        for frame in self.frames() {
            frame.render(backend);
        }
        self.strata.borrow_mut().clear_redraw_flags();
    }
}

impl FrameRenderer for Root {
    fn notify_rendered_frame(&self, frame: &HFrame, rendered: bool) {
        self.strata
            .borrow_mut()
            .notify_rendered_frame(frame, rendered);
    }

    fn notify_frame_strata_changed(&self, frame: &HFrame, old: FrameStrata, new: FrameStrata) {
        self.strata
            .borrow_mut()
            .notify_frame_strata_changed(frame, old, new);
    }

    fn notify_frame_level_changed(&self, frame: &HFrame, old: i32, new: i32) {
        self.strata
            .borrow_mut()
            .notify_frame_level_changed(frame, old, new);
    }

    fn notify_strata_needs_redraw(&self, strata: FrameStrata) {
        self.strata.borrow_mut().notify_strata_needs_redraw(strata);
    }

    fn highest_level(&self, strata: FrameStrata) -> i32 {
        self.strata.borrow().highest_level(strata)
    }

    fn highest_level_excluding(&self, strata: FrameStrata, excluded: &HFrame) -> i32 {
        self.strata
            .borrow()
            .highest_level_excluding(strata, excluded)
    }

    fn target_dimensions(&self) -> Vector2<f32> {
        self.target_dimensions.get()
    }
}

pub(crate) struct ManagerInner {
    config: RefCell<ManagerConfig>,
    root: Rc<Root>,
    registry: RefCell<Registry>,
    virtual_registry: RefCell<Registry>,
    /// Tombstoned slots. `None` entries are erased by `Manager::update`.
    root_frames: RefCell<Vec<Option<HFrame>>>,
    virtual_root_frames: RefCell<Vec<HFrame>>,
    events: EventEmitter,
    /// Some object moved since the last layout pass.
    object_moved: Cell<bool>,
    input: InputState,
}

impl fmt::Debug for ManagerInner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ManagerInner")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("registry", &self.registry.borrow().len())
            .field("virtual_registry", &self.virtual_registry.borrow().len())
            .field("root_frames", &self.root_frames.borrow().len())
            .field("events", &self.events)
            .field("object_moved", &self.object_moved)
            .field("input", &self.input)
            .finish()
    }
}

fn target_dimensions_of(config: &ManagerConfig) -> Vector2<f32> {
    config.screen_dimensions / config.interface_scaling_factor
}

impl ManagerInner {
    pub(crate) fn interface_scaling_factor(&self) -> f32 {
        self.config.borrow().interface_scaling_factor
    }

    pub(crate) fn root_renderer(&self) -> Rc<dyn FrameRenderer> {
        self.root.clone()
    }

    pub(crate) fn root(&self) -> &Root {
        &self.root
    }

    pub(super) fn input(&self) -> &InputState {
        &self.input
    }

    pub(crate) fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub(crate) fn object_by_name(&self, name: &str) -> Option<HObject> {
        self.registry.borrow().get(name)
    }

    pub(crate) fn notify_object_moved(&self) {
        self.object_moved.set(true);
    }

    /// Remove `frame` from the root frame list (or from the virtual root
    /// frame list). The slot is tombstoned.
    pub(crate) fn remove_root_frame(&self, frame: &HFrame) -> Option<HFrame> {
        if frame.is_virtual() {
            let mut list = self.virtual_root_frames.borrow_mut();
            let i = list.iter().position(|f| f == frame)?;
            return Some(list.remove(i));
        }
        self.root_frames
            .borrow_mut()
            .iter_mut()
            .find(|slot| matches!(slot, Some(f) if f == frame))
            .and_then(Option::take)
    }

    pub(crate) fn unregister_object(&self, obj: &HObject) {
        if obj.is_virtual() {
            self.virtual_registry.borrow_mut().remove(obj);
        } else {
            self.registry.borrow_mut().remove(obj);
        }
    }
}

/// Construct an object and register it.
///
/// The object is attached to `parent` only through its back-reference; the
/// caller is responsible for inserting it into the parent's slots. Returns
/// `None` (after logging a warning) if the name is invalid or already taken.
pub(crate) fn create_object(
    manager: &Rc<ManagerInner>,
    attr: ObjectAttributes,
    parent: Option<&HFrame>,
) -> Option<HObject> {
    let ObjectAttributes {
        name: raw_name,
        object_type,
        is_virtual,
        inheritance,
    } = attr;

    if let Err(e) = check_name(&raw_name) {
        warn!("cannot create a {}: {}", object_type, e);
        return None;
    }

    let is_virtual = is_virtual || parent.map_or(false, |p| p.is_virtual());
    let lua_name = HObject::substitute_parent_name(&raw_name, parent);
    let name = if is_virtual {
        raw_name.clone()
    } else {
        lua_name.clone()
    };

    let obj = HObject::from_rc(Rc::new(Object::new(
        Rc::downgrade(manager),
        object_type,
        (name, raw_name, lua_name),
        is_virtual,
        parent,
    )));

    // Only top-level templates can be looked up by name
    let registered = if !is_virtual {
        manager.registry.borrow_mut().add(&obj)
    } else if parent.is_none() {
        manager.virtual_registry.borrow_mut().add(&obj)
    } else {
        Ok(())
    };
    if let Err(e) = registered {
        warn!("cannot create a {}: {}", object_type, e);
        return None;
    }

    if let Some(frame) = obj.as_frame() {
        if !is_virtual {
            frame.init_frame_strata(
                parent.map_or(FrameStrata::Medium, |p| p.frame_strata()),
            );
            if let Some(renderer) = frame.top_level_renderer() {
                renderer.notify_rendered_frame(&frame, true);
            }
        }
    }

    for template in inheritance.iter() {
        if !obj.is_object_type(template.object_type().name()) {
            warn!(
                "{}: cannot inherit from {} ({} is not a {})",
                obj.name(),
                template.name(),
                object_type,
                template.object_type()
            );
            continue;
        }
        obj.copy_from(template);
    }

    debug!("created {} {}", object_type, obj.name());
    Some(obj)
}

/// The owner of a user interface.
///
/// The manager creates root frames, owns them, and drives the per-tick
/// update and the rendering. Dropping the manager destroys every object it
/// created.
#[derive(Debug)]
pub struct Manager {
    pub(super) inner: Rc<ManagerInner>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl Manager {
    pub fn new(config: ManagerConfig) -> Self {
        let root = Rc::new(Root::new(target_dimensions_of(&config)));
        Self {
            inner: Rc::new(ManagerInner {
                config: RefCell::new(config),
                root,
                registry: RefCell::new(Registry::default()),
                virtual_registry: RefCell::new(Registry::default()),
                root_frames: RefCell::new(Vec::new()),
                virtual_root_frames: RefCell::new(Vec::new()),
                events: EventEmitter::new(),
                object_moved: Cell::new(false),
                input: InputState::new(),
            }),
        }
    }

    pub fn config(&self) -> ManagerConfig {
        self.inner.config.borrow().clone()
    }

    pub fn interface_scaling_factor(&self) -> f32 {
        self.inner.interface_scaling_factor()
    }

    /// Change the number of device pixels per UI unit. Every object's
    /// borders are recomputed.
    pub fn set_interface_scaling_factor(&self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            warn!("invalid interface scaling factor: {}", factor);
            return;
        }
        if self.interface_scaling_factor() == factor {
            return;
        }
        self.inner.config.borrow_mut().interface_scaling_factor = factor;
        self.on_config_changed();
    }

    pub fn screen_dimensions(&self) -> Vector2<f32> {
        self.inner.config.borrow().screen_dimensions
    }

    pub fn set_screen_dimensions(&self, dims: Vector2<f32>) {
        if self.screen_dimensions() == dims {
            return;
        }
        self.inner.config.borrow_mut().screen_dimensions = dims;
        self.on_config_changed();
    }

    fn on_config_changed(&self) {
        let target = target_dimensions_of(&self.inner.config.borrow());
        self.inner.root.target_dimensions.set(target);
        for frame in self.root_frames() {
            frame.notify_scaling_factor_updated();
        }
        self.inner.notify_object_moved();
    }

    /// Get the root renderer.
    pub fn root(&self) -> &Root {
        &self.inner.root
    }

    /// Get the root renderer as a trait object.
    pub fn root_renderer(&self) -> Rc<dyn FrameRenderer> {
        self.inner.root_renderer()
    }

    pub fn events(&self) -> &EventEmitter {
        &self.inner.events
    }

    /// Create a frame without a parent.
    pub fn create_root_frame(&self, attr: ObjectAttributes) -> Option<HFrame> {
        if !attr.object_type.is_frame() {
            warn!(
                "cannot create a root frame of type {}",
                attr.object_type
            );
            return None;
        }
        let frame = create_object(&self.inner, attr, None)?.as_frame()?;

        if frame.is_virtual() {
            self.inner
                .virtual_root_frames
                .borrow_mut()
                .push(frame.clone());
        } else {
            self.inner
                .root_frames
                .borrow_mut()
                .push(Some(frame.clone()));
            frame.sync_visibility_with_parent();
        }
        frame.notify_loaded();
        Some(frame)
    }

    /// Get the root frames in creation order.
    pub fn root_frames(&self) -> Vec<HFrame> {
        self.inner
            .root_frames
            .borrow()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn virtual_root_frames(&self) -> Vec<HFrame> {
        self.inner.virtual_root_frames.borrow().clone()
    }

    /// Find a concrete object by name.
    pub fn object_by_name(&self, name: &str) -> Option<HObject> {
        self.inner.object_by_name(name)
    }

    pub fn frame_by_name(&self, name: &str) -> Option<HFrame> {
        self.object_by_name(name).and_then(|o| o.as_frame())
    }

    /// Find a template by name.
    pub fn virtual_object_by_name(&self, name: &str) -> Option<HObject> {
        self.inner.virtual_registry.borrow().get(name)
    }

    /// Get the number of live concrete objects.
    pub fn num_objects(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Advance the interface by `delta` seconds.
    ///
    /// If any object moved since the last call, every border is resolved
    /// first. Then every root frame is updated in creation order.
    pub fn update(&self, delta: f32) {
        if self.inner.object_moved.replace(false) {
            trace!("layout pass");
            for frame in self.root_frames() {
                frame.update_borders_recursive();
            }
        }

        let mut i = 0;
        loop {
            let frame = match self.inner.root_frames.borrow().get(i) {
                Some(slot) => slot.clone(),
                None => break,
            };
            i += 1;
            if let Some(frame) = frame {
                frame.update(delta);
            }
        }
        self.inner
            .root_frames
            .borrow_mut()
            .retain(Option::is_some);
    }

    /// Draw every frame drawn by the root renderer.
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        self.inner.root.render(backend);
    }

    /// Find the top-most visible frame drawn by the root renderer that
    /// satisfies `pred`.
    pub fn find_topmost_frame(&self, pred: impl FnMut(&HFrame) -> bool) -> Option<HFrame> {
        self.inner.root.find_topmost_frame(pred)
    }

    /// Destroy every root frame and template.
    pub fn close_ui(&self) {
        for frame in self.root_frames() {
            frame.destroy();
        }
        for frame in self.virtual_root_frames() {
            frame.destroy();
        }
        self.inner.root_frames.borrow_mut().clear();
        self.inner.virtual_root_frames.borrow_mut().clear();
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.close_ui();
    }
}
