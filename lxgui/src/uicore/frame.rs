//! Frames: containers of child frames and layered regions.
use cgmath::{vec2, Vector2};
use log::{debug, warn};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    f32::INFINITY,
    fmt,
    rc::{Rc, Weak},
};

use super::{
    interaction::InteractionState,
    layer::LayerBucket,
    manager::create_object,
    renderer::same_renderer,
    script::{ScriptHandler, ScriptSlot},
    AliveChecker, Bounds2, EventData, FrameRenderer, FrameStrata, HFrame, HObject, HRegion,
    Layer, ObjectAttributes, ObjectDirtyFlags, ObjectFlags, ObjectType, RenderBackend,
};

/// A plain description of a frame's background and border, drawn by the
/// render backend behind the frame's regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub background_file: String,
    pub edge_file: String,
    pub background_tiling: bool,
    pub tile_size: f32,
    pub edge_size: f32,
    pub background_insets: Bounds2<f32>,
    pub edge_insets: Bounds2<f32>,
    /// RGBA
    pub background_color: [f32; 4],
    /// RGBA
    pub edge_color: [f32; 4],
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            background_file: String::new(),
            edge_file: String::new(),
            background_tiling: false,
            tile_size: 0.0,
            edge_size: 0.0,
            background_insets: Bounds2::zero(),
            edge_insets: Bounds2::zero(),
            background_color: [1.0; 4],
            edge_color: [1.0; 4],
        }
    }
}

pub(crate) struct FrameState {
    /// Tombstoned slots. `None` entries are erased by `update`.
    children: RefCell<Vec<Option<HFrame>>>,
    /// Tombstoned slots. `None` entries are erased by `update`.
    regions: RefCell<Vec<Option<HRegion>>>,
    title_region: RefCell<Option<HRegion>>,
    pub(super) layers: RefCell<[LayerBucket; 5]>,
    strata: Cell<FrameStrata>,
    level: Cell<i32>,
    top_level: Cell<bool>,
    renderer: RefCell<Option<Weak<dyn FrameRenderer>>>,
    backdrop: RefCell<Option<Backdrop>>,
    min_dimensions: Cell<Vector2<f32>>,
    max_dimensions: Cell<Vector2<f32>>,
    clamped_to_screen: Cell<bool>,
    scale: Cell<f32>,
    abs_hit_rect_insets: Cell<Bounds2<f32>>,
    pub(super) interaction: InteractionState,
    /// The apparent dimensions observed by the last `update`.
    old_size: Cell<Vector2<f32>>,
    /// `OnShow`/`OnHide` calls deferred to the next `update`.
    queued_events: RefCell<Vec<&'static str>>,
    pub(super) scripts: RefCell<HashMap<String, Vec<Rc<ScriptSlot>>>>,
    pub(super) registered_events: RefCell<Vec<String>>,
}

impl fmt::Debug for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FrameState")
            .field("children", &self.children.borrow().len())
            .field("regions", &self.regions.borrow().len())
            .field("title_region", &self.title_region.borrow().is_some())
            .field("strata", &self.strata)
            .field("level", &self.level)
            .field("top_level", &self.top_level)
            .field("has_renderer", &self.renderer.borrow().is_some())
            .field("backdrop", &self.backdrop)
            .field("min_dimensions", &self.min_dimensions)
            .field("max_dimensions", &self.max_dimensions)
            .field("clamped_to_screen", &self.clamped_to_screen)
            .field("scale", &self.scale)
            .field("abs_hit_rect_insets", &self.abs_hit_rect_insets)
            .field("interaction", &self.interaction)
            .field("queued_events", &self.queued_events)
            .finish()
    }
}

impl FrameState {
    pub(super) fn new(is_virtual: bool) -> Self {
        Self {
            children: RefCell::new(Vec::new()),
            regions: RefCell::new(Vec::new()),
            title_region: RefCell::new(None),
            layers: RefCell::new(Default::default()),
            strata: Cell::new(if is_virtual {
                FrameStrata::Parent
            } else {
                FrameStrata::Medium
            }),
            level: Cell::new(0),
            top_level: Cell::new(false),
            renderer: RefCell::new(None),
            backdrop: RefCell::new(None),
            min_dimensions: Cell::new(vec2(0.0, 0.0)),
            max_dimensions: Cell::new(vec2(INFINITY, INFINITY)),
            clamped_to_screen: Cell::new(false),
            scale: Cell::new(1.0),
            abs_hit_rect_insets: Cell::new(Bounds2::zero()),
            interaction: InteractionState::new(),
            old_size: Cell::new(vec2(0.0, 0.0)),
            queued_events: RefCell::new(Vec::new()),
            scripts: RefCell::new(HashMap::new()),
            registered_events: RefCell::new(Vec::new()),
        }
    }

    pub(super) fn renderer_override(&self) -> Option<Rc<dyn FrameRenderer>> {
        self.renderer.borrow().as_ref().and_then(Weak::upgrade)
    }
}

/// Push `[min, max]` inside `[0, limit]`, keeping its length if possible.
fn clamp_span(min: &mut f32, max: &mut f32, limit: f32) {
    let len = *max - *min;
    if *max > limit {
        if len > limit {
            *min = 0.0;
            *max = limit;
        } else {
            *max = limit;
            *min = limit - len;
        }
    }
    if *min < 0.0 {
        if len > limit {
            *min = 0.0;
            *max = limit;
        } else {
            *min = 0.0;
            *max = len;
        }
    }
}

impl HObject {
    /// Replace the parent back-reference.
    pub(crate) fn set_parent(&self, parent: Option<&HFrame>) {
        let new_parent = parent.map_or_else(Weak::new, |p| p.downgrade());
        {
            let mut cur = self.obj.parent.borrow_mut();
            if Weak::ptr_eq(&cur, &new_parent) {
                return;
            }
            *cur = new_parent;
        }
        if !self.is_virtual() {
            self.update_anchors();
            self.notify_borders_need_update();
        }
    }

    /// Check if `frame` is a (possibly indirect) parent of this object.
    pub fn is_descendant_of(&self, frame: &HFrame) -> bool {
        let mut cur = self.parent();
        while let Some(p) = cur {
            if p == *frame {
                return true;
            }
            cur = p.parent();
        }
        false
    }

    /// Check if `point` (in screen space) is inside the object.
    ///
    /// For frames, the hit rectangle is the border rectangle shrunk by the
    /// absolute hit rectangle insets and by the relative ones (scaled by the
    /// apparent dimensions), extended by the title region.
    pub fn is_in_region(&self, point: Vector2<f32>) -> bool {
        match self.as_frame() {
            Some(frame) => {
                if let Some(title) = frame.title_region() {
                    if title.is_in_region(point) {
                        return true;
                    }
                }
                let abs = frame.state().abs_hit_rect_insets.get();
                let rel = frame.rel_hit_rect_insets();
                let size = self.apparent_dimensions();
                let insets = Bounds2::new(
                    abs.left + rel.left * size.x,
                    abs.right + rel.right * size.x,
                    abs.top + rel.top * size.y,
                    abs.bottom + rel.bottom * size.y,
                );
                self.borders().inset(&insets).contains_point(point)
            }
            None => self.borders().contains_point(point),
        }
    }
}

// =======================================================================
//                              Public methods
// =======================================================================

impl HFrame {
    // --------------------------------------------------------------------
    // Children

    /// Get the child frames in insertion order.
    pub fn children(&self) -> Vec<HFrame> {
        self.state().children.borrow().iter().flatten().cloned().collect()
    }

    pub fn num_children(&self) -> usize {
        self.state().children.borrow().iter().flatten().count()
    }

    /// Get the number of child slots, including the ones of removed children
    /// not yet erased by `update`.
    pub fn rough_num_children(&self) -> usize {
        self.state().children.borrow().len()
    }

    /// Find a child by its name, or by its raw name without the `$parent`
    /// prefix.
    pub fn child(&self, name: &str) -> Option<HFrame> {
        self.children()
            .into_iter()
            .find(|c| c.name() == name || strip_parent(c.raw_name()) == Some(name))
    }

    /// Create a child frame. Its level is one above this frame's.
    pub fn create_child(&self, attr: ObjectAttributes) -> Option<HFrame> {
        if !attr.object_type.is_frame() {
            warn!(
                "{}: cannot create a child frame of type {}",
                self.name(),
                attr.object_type
            );
            return None;
        }
        let manager = self.manager()?;
        let child = create_object(&manager, attr, Some(self))?.as_frame()?;
        child.set_level(self.level().saturating_add(1));
        self.add_child(child.clone());
        child.notify_loaded();
        Some(child)
    }

    /// Take ownership of `child`.
    ///
    /// If the child belonged to another frame, it is removed from it first.
    /// If the child's effective renderer changes, it is moved between the
    /// renderers along with its descendants.
    pub fn add_child(&self, child: HFrame) {
        if child == *self || self.is_descendant_of(&child) {
            warn!("{}: cannot add {} as a child", self.name(), child.name());
            return;
        }
        if self.state().children.borrow().iter().flatten().any(|c| *c == child) {
            warn!("{}: {} is already a child", self.name(), child.name());
            return;
        }
        match child.parent() {
            Some(old_parent) if old_parent != *self => {
                old_parent.remove_child(&child);
            }
            Some(_) => {}
            None => {
                if let Some(manager) = self.manager() {
                    manager.remove_root_frame(&child);
                }
            }
        }

        let old_renderer = child.top_level_renderer();
        child.set_parent(Some(self));
        self.state().children.borrow_mut().push(Some(child.clone()));

        if child.is_virtual() {
            return;
        }
        child.sync_visibility_with_parent();

        let new_renderer = child.top_level_renderer();
        let changed = match (&old_renderer, &new_renderer) {
            (Some(a), Some(b)) => !same_renderer(a, b),
            (None, None) => false,
            _ => true,
        };
        if changed {
            debug!("{}: moving {} to another renderer", self.name(), child.name());
            if let Some(old) = old_renderer {
                old.notify_rendered_frame(&child, false);
                child.propagate_renderer(&*old, false);
            }
            if let Some(new) = new_renderer {
                new.notify_rendered_frame(&child, true);
                child.propagate_renderer(&*new, true);
            }
        }
    }

    /// Give up ownership of `child` and return the owning handle.
    ///
    /// The slot is tombstoned and erased during the next `update`, so this
    /// may be called while the children are being updated. A child that was
    /// drawn by this frame's renderer override is moved to the root
    /// renderer.
    pub fn remove_child(&self, child: &HFrame) -> Option<HFrame> {
        let removed = self
            .state()
            .children
            .borrow_mut()
            .iter_mut()
            .find(|slot| matches!(slot, Some(c) if c == child))
            .and_then(Option::take);
        let removed = match removed {
            Some(x) => x,
            None => {
                warn!("{}: {} is not a child", self.name(), child.name());
                return None;
            }
        };

        let manager = self.manager();
        let rehome = if removed.is_virtual() || removed.renderer().is_some() {
            None
        } else {
            match (self.top_level_renderer(), &manager) {
                (Some(top), Some(m)) if !same_renderer(&top, &m.root_renderer()) => Some(top),
                _ => None,
            }
        };

        if let Some(top) = &rehome {
            top.notify_rendered_frame(&removed, false);
            removed.propagate_renderer(&**top, false);
        }

        removed.set_parent(None);

        if rehome.is_some() {
            if let Some(m) = &manager {
                let root = m.root_renderer();
                root.notify_rendered_frame(&removed, true);
                removed.propagate_renderer(&*root, true);
            }
        }

        self.notify_renderer_need_redraw();
        Some(removed)
    }

    pub(super) fn take_all_children(&self) -> Vec<HFrame> {
        std::mem::replace(&mut *self.state().children.borrow_mut(), Vec::new())
            .into_iter()
            .flatten()
            .collect()
    }

    // --------------------------------------------------------------------
    // Regions

    /// Get the layered regions in insertion order. The title region is not
    /// included.
    pub fn regions(&self) -> Vec<HRegion> {
        self.state().regions.borrow().iter().flatten().cloned().collect()
    }

    pub fn num_regions(&self) -> usize {
        self.state().regions.borrow().iter().flatten().count()
    }

    /// Get the number of region slots, including tombstoned ones.
    pub fn rough_num_regions(&self) -> usize {
        self.state().regions.borrow().len()
    }

    /// Find a region by its name, or by its raw name without the `$parent`
    /// prefix.
    pub fn region(&self, name: &str) -> Option<HRegion> {
        self.regions()
            .into_iter()
            .find(|r| r.name() == name || strip_parent(r.raw_name()) == Some(name))
    }

    /// Create a layered region drawn in `layer`.
    pub fn create_region(&self, layer: Layer, attr: ObjectAttributes) -> Option<HRegion> {
        if !attr.object_type.is_layered_region() {
            warn!(
                "{}: cannot create a region of type {}",
                self.name(),
                attr.object_type
            );
            return None;
        }
        let manager = self.manager()?;
        let region = create_object(&manager, attr, Some(self))?.as_region()?;
        region.set_draw_layer(layer);
        self.add_region(region.clone());
        region.notify_loaded();
        Some(region)
    }

    /// Take ownership of `region`.
    pub fn add_region(&self, region: HRegion) {
        if self.state().regions.borrow().iter().flatten().any(|r| *r == region) {
            warn!("{}: {} is already a region", self.name(), region.name());
            return;
        }
        if let Some(old_parent) = region.parent() {
            if old_parent != *self {
                old_parent.remove_region(&region);
            }
        }

        region.set_parent(Some(self));
        self.state().regions.borrow_mut().push(Some(region.clone()));
        region.sync_visibility_with_parent();
        self.notify_layers_need_update();
    }

    /// Give up ownership of `region` and return the owning handle. The slot
    /// is tombstoned.
    pub fn remove_region(&self, region: &HRegion) -> Option<HRegion> {
        let removed = self
            .state()
            .regions
            .borrow_mut()
            .iter_mut()
            .find(|slot| matches!(slot, Some(r) if r == region))
            .and_then(Option::take);
        let removed = match removed {
            Some(x) => x,
            None => {
                warn!("{}: {} is not a region", self.name(), region.name());
                return None;
            }
        };

        removed.set_parent(None);
        self.notify_layers_need_update();
        Some(removed)
    }

    /// Get the title region, the area by which the frame can be dragged.
    pub fn title_region(&self) -> Option<HRegion> {
        self.state().title_region.borrow().clone()
    }

    /// Create the title region. Fails if the frame already has one.
    pub fn create_title_region(&self) -> Option<HRegion> {
        if self.title_region().is_some() {
            warn!("{}: the frame already has a title region", self.name());
            return None;
        }
        let manager = self.manager()?;
        let region = create_object(
            &manager,
            ObjectAttributes::new("$parentTitleRegion", ObjectType::Region),
            Some(self),
        )?
        .as_region()?;
        region.set_flag(ObjectFlags::SPECIAL, true);
        *self.state().title_region.borrow_mut() = Some(region.clone());
        region.sync_visibility_with_parent();
        region.notify_loaded();
        Some(region)
    }

    pub(super) fn take_title_region(&self, region: &HRegion) -> Option<HRegion> {
        let taken = {
            let mut slot = self.state().title_region.borrow_mut();
            if slot.as_ref() == Some(region) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(taken) = &taken {
            taken.set_parent(None);
        }
        taken
    }

    pub(super) fn take_all_regions(&self) -> Vec<HRegion> {
        let mut out: Vec<HRegion> =
            std::mem::replace(&mut *self.state().regions.borrow_mut(), Vec::new())
                .into_iter()
                .flatten()
                .collect();
        out.extend(self.state().title_region.borrow_mut().take());
        for bucket in self.state().layers.borrow_mut().iter_mut() {
            bucket.regions.clear();
        }
        out
    }

    // --------------------------------------------------------------------
    // Strata and level

    pub fn frame_strata(&self) -> FrameStrata {
        self.state().strata.get()
    }

    /// Set the strata. `Parent` is resolved to the parent's strata, or to
    /// `Medium` if there is no parent. Virtual frames keep `Parent` as it is.
    pub fn set_frame_strata(&self, strata: FrameStrata) {
        let strata = if strata == FrameStrata::Parent && !self.is_virtual() {
            self.parent()
                .map_or(FrameStrata::Medium, |p| p.frame_strata())
        } else {
            strata
        };

        let old = self.frame_strata();
        if old == strata {
            return;
        }
        self.state().strata.set(strata);

        if !self.is_virtual() {
            if let Some(renderer) = self.top_level_renderer() {
                renderer.notify_frame_strata_changed(self, old, strata);
            }
        }
    }

    /// `set_frame_strata` with a strata name. Unknown names are logged and
    /// ignored.
    pub fn set_frame_strata_str(&self, name: &str) {
        match name.parse() {
            Ok(strata) => self.set_frame_strata(strata),
            Err(e) => warn!("{}: {}", self.name(), e),
        }
    }

    pub(super) fn init_frame_strata(&self, strata: FrameStrata) {
        self.state().strata.set(strata);
    }

    pub fn level(&self) -> i32 {
        self.state().level.get()
    }

    pub fn set_level(&self, level: i32) {
        let old = self.level();
        if old == level {
            return;
        }
        self.state().level.set(level);

        if !self.is_virtual() {
            if let Some(renderer) = self.top_level_renderer() {
                renderer.notify_frame_level_changed(self, old, level);
            }
        }
    }

    fn add_level(&self, delta: i64) {
        let level = (i64::from(self.level()) + delta)
            .max(i64::from(i32::min_value()))
            .min(i64::from(i32::max_value()));
        self.set_level(level as i32);
        for child in self.children() {
            child.add_level(delta);
        }
    }

    /// Put a top-level frame above every other frame of its stratum.
    ///
    /// The level difference is applied to all descendants, saturating at
    /// the `i32` bounds. The level never decreases, and raising a frame that
    /// is already on top has no effect.
    pub fn raise(&self) {
        if !self.is_top_level() || self.is_virtual() {
            return;
        }
        let renderer = match self.top_level_renderer() {
            Some(r) => r,
            None => return,
        };

        let old_level = self.level();
        let new_level = renderer
            .highest_level_excluding(self.frame_strata(), self)
            .saturating_add(1);
        if new_level > old_level {
            self.add_level(i64::from(new_level) - i64::from(old_level));
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.state().top_level.get()
    }

    pub fn set_top_level(&self, top_level: bool) {
        self.state().top_level.set(top_level);
    }

    /// Get the nearest top-level frame among this frame and its ancestors.
    pub fn top_level_parent(&self) -> Option<HFrame> {
        let mut cur = Some(self.clone());
        while let Some(frame) = cur {
            if frame.is_top_level() {
                return Some(frame);
            }
            cur = frame.parent();
        }
        None
    }

    // --------------------------------------------------------------------
    // Renderer

    /// Get the renderer override of this frame.
    pub fn renderer(&self) -> Option<Rc<dyn FrameRenderer>> {
        self.state().renderer_override()
    }

    /// Draw this frame and its descendants with `renderer` instead of the
    /// parent's renderer. `None` removes the override.
    pub fn set_renderer(&self, renderer: Option<Weak<dyn FrameRenderer>>) {
        let unchanged = match (&*self.state().renderer.borrow(), &renderer) {
            (None, None) => true,
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            _ => false,
        };
        if unchanged {
            return;
        }

        if !self.is_virtual() {
            if let Some(old) = self.top_level_renderer() {
                old.notify_rendered_frame(self, false);
                self.propagate_renderer(&*old, false);
            }
        }

        *self.state().renderer.borrow_mut() = renderer;

        if !self.is_virtual() {
            if let Some(new) = self.top_level_renderer() {
                new.notify_rendered_frame(self, true);
                self.propagate_renderer(&*new, true);
            }
        }
    }

    /// Report the descendants drawn by this frame's renderer to `renderer`.
    /// Stops at descendants having their own override.
    fn propagate_renderer(&self, renderer: &dyn FrameRenderer, rendered: bool) {
        for child in self.children() {
            if child.renderer().is_some() {
                continue;
            }
            renderer.notify_rendered_frame(&child, rendered);
            child.propagate_renderer(renderer, rendered);
        }
    }

    // --------------------------------------------------------------------
    // Appearance

    pub fn backdrop(&self) -> Option<Backdrop> {
        self.state().backdrop.borrow().clone()
    }

    pub fn set_backdrop(&self, backdrop: Option<Backdrop>) {
        *self.state().backdrop.borrow_mut() = backdrop;
        self.notify_renderer_need_redraw();
    }

    pub fn scale(&self) -> f32 {
        self.state().scale.get()
    }

    pub fn set_scale(&self, scale: f32) {
        if self.scale() != scale {
            self.state().scale.set(scale);
            self.notify_renderer_need_redraw();
        }
    }

    /// Get the scale multiplied by every ancestor's.
    pub fn effective_scale(&self) -> f32 {
        match self.parent() {
            Some(p) => self.scale() * p.effective_scale(),
            None => self.scale(),
        }
    }

    // --------------------------------------------------------------------
    // Dimension limits

    pub fn min_dimensions(&self) -> Vector2<f32> {
        self.state().min_dimensions.get()
    }

    /// Get the maximum dimensions. Unbounded axes are infinite.
    pub fn max_dimensions(&self) -> Vector2<f32> {
        self.state().max_dimensions.get()
    }

    pub fn set_min_dimensions(&self, dims: Vector2<f32>) {
        self.set_min_width(dims.x);
        self.set_min_height(dims.y);
    }

    /// Set the maximum dimensions. A negative value means unbounded.
    pub fn set_max_dimensions(&self, dims: Vector2<f32>) {
        self.set_max_width(dims.x);
        self.set_max_height(dims.y);
    }

    pub fn set_min_width(&self, value: f32) {
        let (min, max) = (self.min_dimensions(), self.max_dimensions());
        let value = value.max(0.0);
        if value > max.x {
            warn!("{}: min width {} exceeds max width {}", self.name(), value, max.x);
            return;
        }
        self.set_limits(vec2(value, min.y), max);
    }

    pub fn set_min_height(&self, value: f32) {
        let (min, max) = (self.min_dimensions(), self.max_dimensions());
        let value = value.max(0.0);
        if value > max.y {
            warn!("{}: min height {} exceeds max height {}", self.name(), value, max.y);
            return;
        }
        self.set_limits(vec2(min.x, value), max);
    }

    pub fn set_max_width(&self, value: f32) {
        let (min, max) = (self.min_dimensions(), self.max_dimensions());
        let value = if value < 0.0 { INFINITY } else { value };
        if value < min.x {
            warn!("{}: max width {} is below min width {}", self.name(), value, min.x);
            return;
        }
        self.set_limits(min, vec2(value, max.y));
    }

    pub fn set_max_height(&self, value: f32) {
        let (min, max) = (self.min_dimensions(), self.max_dimensions());
        let value = if value < 0.0 { INFINITY } else { value };
        if value < min.y {
            warn!("{}: max height {} is below min height {}", self.name(), value, min.y);
            return;
        }
        self.set_limits(min, vec2(max.x, value));
    }

    fn set_limits(&self, min: Vector2<f32>, max: Vector2<f32>) {
        if self.min_dimensions() == min && self.max_dimensions() == max {
            return;
        }
        self.state().min_dimensions.set(min);
        self.state().max_dimensions.set(max);

        self.set_dimensions(self.dimensions());
        if !self.is_virtual() {
            self.notify_borders_need_update();
        }
    }

    pub(super) fn clamp_dimensions(&self, dims: Vector2<f32>) -> Vector2<f32> {
        let (min, max) = (self.min_dimensions(), self.max_dimensions());
        vec2(dims.x.max(min.x).min(max.x), dims.y.max(min.y).min(max.y))
    }

    /// Apply the dimension limits and the screen clamping to a resolved
    /// border rectangle.
    pub(super) fn constrain_borders(&self, b: &mut Bounds2<f32>) {
        let (min, max) = (self.min_dimensions(), self.max_dimensions());

        let width = b.width();
        if width < min.x {
            b.right = b.left + min.x;
        } else if width > max.x {
            b.right = b.left + max.x;
        }
        let height = b.height();
        if height < min.y {
            b.bottom = b.top + min.y;
        } else if height > max.y {
            b.bottom = b.top + max.y;
        }

        if self.is_clamped_to_screen() {
            let screen = self.renderer_target_dimensions();
            clamp_span(&mut b.left, &mut b.right, screen.x);
            clamp_span(&mut b.top, &mut b.bottom, screen.y);
        }
    }

    pub fn is_clamped_to_screen(&self) -> bool {
        self.state().clamped_to_screen.get()
    }

    /// Keep the frame inside the renderer's target area.
    pub fn set_clamped_to_screen(&self, clamped: bool) {
        if self.state().clamped_to_screen.replace(clamped) != clamped && !self.is_virtual() {
            self.notify_borders_need_update();
        }
    }

    // --------------------------------------------------------------------
    // Hit testing

    pub fn abs_hit_rect_insets(&self) -> Bounds2<f32> {
        self.state().abs_hit_rect_insets.get()
    }

    /// Shrink the area `is_in_region` accepts by `insets` (in UI units).
    pub fn set_abs_hit_rect_insets(&self, insets: Bounds2<f32>) {
        self.state().abs_hit_rect_insets.set(insets);
    }

    // --------------------------------------------------------------------
    // Per-tick processing

    /// Advance the frame by `delta` seconds.
    ///
    /// Runs, in this order: the deferred `OnShow`/`OnHide` scripts, the
    /// layer rebuild, `OnUpdate`, the title region, the regions, the
    /// children, and finally `OnSizeChanged` if the apparent dimensions
    /// changed. Removed regions and children are erased after their pass.
    /// Stops as soon as a script destroys the frame.
    pub fn update(&self, delta: f32) {
        let checker = AliveChecker::new(self);

        let queued = std::mem::replace(&mut *self.state().queued_events.borrow_mut(), Vec::new());
        for event in queued {
            self.fire_script(event, &EventData::new());
            if !checker.is_alive() {
                return;
            }
        }

        if self.has_dirty_flags(ObjectDirtyFlags::LAYERS) {
            self.rebuild_layers();
        }

        if self.is_visible() {
            self.fire_script("OnUpdate", &EventData::new().with(delta));
            if !checker.is_alive() {
                return;
            }
        }

        if let Some(title) = self.title_region() {
            title.update(delta);
        }

        let mut i = 0;
        loop {
            let region = match self.state().regions.borrow().get(i) {
                Some(slot) => slot.clone(),
                None => break,
            };
            i += 1;
            if let Some(region) = region {
                region.update(delta);
            }
        }
        self.state().regions.borrow_mut().retain(Option::is_some);

        let mut i = 0;
        loop {
            let child = match self.state().children.borrow().get(i) {
                Some(slot) => slot.clone(),
                None => break,
            };
            i += 1;
            if let Some(child) = child {
                child.update(delta);
                if !checker.is_alive() {
                    return;
                }
            }
        }
        self.state().children.borrow_mut().retain(Option::is_some);

        self.remove_disconnected_scripts();

        let size = self.apparent_dimensions();
        if self.state().old_size.replace(size) != size {
            self.fire_script("OnSizeChanged", &EventData::new().with(size.x).with(size.y));
        }
    }

    /// Draw the frame's backdrop and regions. Nothing is drawn unless the
    /// frame is visible and ready.
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        if !self.is_visible() || !self.is_ready() {
            return;
        }
        if let Some(backdrop) = self.backdrop() {
            backend.draw_backdrop(self, &backdrop);
        }
        self.render_layers(backend);
    }

    /// Resolve the borders of this frame and everything it contains.
    pub(crate) fn update_borders_recursive(&self) {
        self.update_borders();
        if let Some(title) = self.title_region() {
            title.update_borders();
        }
        for region in self.regions() {
            region.update_borders();
        }
        for child in self.children() {
            child.update_borders_recursive();
        }
    }

    // --------------------------------------------------------------------
    // Propagation

    pub(super) fn on_visibility_changed(&self, visible: bool) {
        if !visible {
            self.set_focus(false);
        } else if self.is_auto_focus_enabled() {
            self.set_focus(true);
        }

        self.state()
            .queued_events
            .borrow_mut()
            .push(if visible { "OnShow" } else { "OnHide" });

        let regions = self.regions().into_iter().chain(self.title_region());
        for region in regions {
            if visible && region.is_shown() {
                region.notify_visible();
            } else if !visible && region.is_visible() {
                region.notify_invisible();
            }
        }
        for child in self.children() {
            if visible && child.is_shown() {
                child.notify_visible();
            } else if !visible && child.is_visible() {
                child.notify_invisible();
            }
        }
    }

    pub(super) fn propagate_scaling_factor_updated(&self) {
        if let Some(title) = self.title_region() {
            title.notify_scaling_factor_updated();
        }
        for child in self.children() {
            child.notify_scaling_factor_updated();
        }
        for region in self.regions() {
            region.notify_scaling_factor_updated();
        }
    }

    pub(super) fn clear_scripts(&self) {
        self.state().scripts.borrow_mut().clear();
        self.state().queued_events.borrow_mut().clear();
    }

    // --------------------------------------------------------------------
    // Inheritance

    pub(super) fn copy_frame_state_from(&self, template: &HFrame) {
        let scripts: Vec<(String, ScriptHandler)> = template
            .state()
            .scripts
            .borrow()
            .iter()
            .flat_map(|(name, list)| {
                list.iter()
                    .filter(|slot| slot.is_connected())
                    .map(move |slot| (name.clone(), slot.handler()))
            })
            .collect();
        for (name, handler) in scripts {
            self.define_script_handler(&name, handler, true);
        }

        self.set_frame_strata(template.frame_strata());

        // The template's level is relative to the ancestor as many levels
        // up as the level value
        let mut high_parent = self.clone();
        for _ in 0..template.level() {
            match high_parent.parent() {
                Some(p) => high_parent = p,
                None => break,
            }
        }
        self.set_level(high_parent.level().saturating_add(template.level()));

        self.set_top_level(template.is_top_level());
        self.set_min_dimensions(template.min_dimensions());
        let max = template.max_dimensions();
        self.set_max_dimensions(vec2(
            if max.x.is_finite() { max.x } else { -1.0 },
            if max.y.is_finite() { max.y } else { -1.0 },
        ));
        self.set_clamped_to_screen(template.is_clamped_to_screen());
        self.set_abs_hit_rect_insets(template.abs_hit_rect_insets());
        self.copy_interaction_from(template);
        self.set_scale(template.scale());
        if let Some(backdrop) = template.backdrop() {
            self.set_backdrop(Some(backdrop));
        }

        for region in template.regions() {
            if region.is_special() {
                continue;
            }
            let attr = ObjectAttributes::new(region.raw_name(), region.object_type())
                .inherits(region.to_object());
            if self.create_region(region.draw_layer(), attr).is_none() {
                warn!(
                    "{}: cannot create region {} inherited from {}",
                    self.name(),
                    region.raw_name(),
                    template.name()
                );
            }
        }

        if let Some(title) = template.title_region() {
            if let Some(own) = self.create_title_region() {
                own.copy_from(&title);
            }
        }

        for child in template.children() {
            if child.is_special() {
                continue;
            }
            let attr = ObjectAttributes::frame(child.raw_name()).inherits(child.to_object());
            if self.create_child(attr).is_none() {
                warn!(
                    "{}: cannot create child {} inherited from {}",
                    self.name(),
                    child.raw_name(),
                    template.name()
                );
            }
        }

        self.notify_layers_need_update();
    }
}

fn strip_parent(raw_name: &str) -> Option<&str> {
    if raw_name.starts_with("$parent") {
        Some(&raw_name["$parent".len()..])
    } else {
        None
    }
}
