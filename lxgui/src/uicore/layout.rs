//! Anchor resolution.
use arrayvec::ArrayVec;
use cgmath::{vec2, Vector2};
use log::{error, trace, warn};
use std::f32::{INFINITY, NEG_INFINITY};

use super::{
    anchor::Anchor, AnchorData, AnchorPoint, AnchorTarget, Bounds2, HObject, ObjectDirtyFlags,
    ObjectFlags,
};
use crate::{utils::RoundingMethod, Error};

type Targets = ArrayVec<[HObject; 9]>;

/// Fill in the missing border(s) of one axis.
///
/// `min` and `max` are the extremes pinned by anchors, or infinite if none
/// pinned them. `center` is the position pinned by a center-like anchor.
/// `size` is the explicit dimension along the axis and is only used when it
/// is positive. Returns `false` if the axis is under-determined.
pub(crate) fn make_borders(min: &mut f32, max: &mut f32, center: Option<f32>, size: f32) -> bool {
    let has_size = size.is_finite() && size > 0.0;

    match (min.is_infinite(), max.is_infinite()) {
        (true, true) => match center {
            Some(center) if has_size => {
                *min = center - size / 2.0;
                *max = center + size / 2.0;
                true
            }
            _ => false,
        },
        (false, true) => {
            if has_size {
                *max = *min + size;
            } else if let Some(center) = center {
                *max = *min + 2.0 * (center - *min);
            } else {
                return false;
            }
            true
        }
        (true, false) => {
            if has_size {
                *min = *max - size;
            } else if let Some(center) = center {
                *min = *max - 2.0 * (*max - center);
            } else {
                return false;
            }
            true
        }
        (false, false) => true,
    }
}

/// The accumulated constraints of the read pass.
struct Extremes {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    x_center: Option<f32>,
    y_center: Option<f32>,
}

impl Extremes {
    fn new() -> Self {
        Self {
            left: INFINITY,
            right: NEG_INFINITY,
            top: INFINITY,
            bottom: NEG_INFINITY,
            x_center: None,
            y_center: None,
        }
    }

    fn add(&mut self, point: AnchorPoint, pos: Vector2<f32>) {
        use AnchorPoint::*;
        let (x, y) = (pos.x, pos.y);
        match point {
            TopLeft => {
                self.left = self.left.min(x);
                self.top = self.top.min(y);
            }
            Top => {
                self.top = self.top.min(y);
                self.x_center = Some(x);
            }
            TopRight => {
                self.right = self.right.max(x);
                self.top = self.top.min(y);
            }
            Right => {
                self.right = self.right.max(x);
                self.y_center = Some(y);
            }
            BottomRight => {
                self.right = self.right.max(x);
                self.bottom = self.bottom.max(y);
            }
            Bottom => {
                self.bottom = self.bottom.max(y);
                self.x_center = Some(x);
            }
            BottomLeft => {
                self.left = self.left.min(x);
                self.bottom = self.bottom.max(y);
            }
            Left => {
                self.left = self.left.min(x);
                self.y_center = Some(y);
            }
            Center => {
                self.x_center = Some(x);
                self.y_center = Some(y);
            }
        }
    }
}

/// Which logical borders `point` pins.
fn defined_borders_of(point: AnchorPoint, defined: &mut Bounds2<bool>) {
    use AnchorPoint::*;
    match point {
        TopLeft => {
            defined.top = true;
            defined.left = true;
        }
        Top => defined.top = true,
        TopRight => {
            defined.top = true;
            defined.right = true;
        }
        Right => defined.right = true,
        BottomRight => {
            defined.bottom = true;
            defined.right = true;
        }
        Bottom => defined.bottom = true,
        BottomLeft => {
            defined.bottom = true;
            defined.left = true;
        }
        Left => defined.left = true,
        Center => {}
    }
}

impl HObject {
    /// Set an anchor, replacing the one at the same point.
    ///
    /// If the anchor's target (directly or indirectly) depends on this
    /// object, the anchor is removed again and an error is logged.
    pub fn set_point(&self, data: AnchorData) {
        let index = data.point.index();
        self.obj.anchors.borrow_mut()[index] = Some(Anchor::new(data));
        self.on_anchors_changed();
    }

    /// Set an anchor. `target` is the name of the target object. An empty
    /// name refers to the parent.
    pub fn set_anchor(
        &self,
        point: AnchorPoint,
        target: &str,
        target_point: AnchorPoint,
        offset: Vector2<f32>,
        is_relative: bool,
    ) {
        let data = AnchorData::new(point, target, target_point);
        self.set_point(if is_relative {
            data.with_rel_offset(offset.x, offset.y)
        } else {
            data.with_offset(offset.x, offset.y)
        });
    }

    /// Make the object cover `target` exactly.
    pub fn set_all_points(&self, target: impl Into<AnchorTarget>) {
        let target = target.into();
        if let AnchorTarget::Named(name) = &target {
            if name == self.name() {
                error!("{}: cannot call set_all_points on itself", self.name());
                return;
            }
        }

        {
            let mut anchors = self.obj.anchors.borrow_mut();
            for slot in anchors.iter_mut() {
                *slot = None;
            }
            anchors[AnchorPoint::TopLeft.index()] = Some(Anchor::new(AnchorData::new(
                AnchorPoint::TopLeft,
                target.clone(),
                AnchorPoint::TopLeft,
            )));
            anchors[AnchorPoint::BottomRight.index()] = Some(Anchor::new(AnchorData::new(
                AnchorPoint::BottomRight,
                target,
                AnchorPoint::BottomRight,
            )));
        }
        self.on_anchors_changed();
    }

    /// Remove every anchor.
    pub fn clear_all_points(&self) {
        let had_any = {
            let mut anchors = self.obj.anchors.borrow_mut();
            let had_any = anchors.iter().any(Option::is_some);
            for slot in anchors.iter_mut() {
                *slot = None;
            }
            had_any
        };
        if had_any {
            self.on_anchors_changed();
        }
    }

    /// Get the anchor at `point`.
    pub fn point(&self, point: AnchorPoint) -> Option<AnchorData> {
        self.obj.anchors.borrow()[point.index()]
            .as_ref()
            .map(|a| a.data.clone())
    }

    /// Get all anchors in slot order.
    pub fn points(&self) -> Vec<AnchorData> {
        self.obj
            .anchors
            .borrow()
            .iter()
            .flatten()
            .map(|a| a.data.clone())
            .collect()
    }

    pub fn num_points(&self) -> usize {
        self.obj.anchors.borrow().iter().flatten().count()
    }

    /// Modify the anchor at `point` in place.
    pub fn modify_point(
        &self,
        point: AnchorPoint,
        f: impl FnOnce(&mut AnchorData),
    ) -> Result<(), Error> {
        let mut data = self
            .point(point)
            .ok_or_else(|| Error::NoSuchPoint(self.name().to_owned()))?;
        f(&mut data);

        {
            let mut anchors = self.obj.anchors.borrow_mut();
            anchors[point.index()] = None;
            let index = data.point.index();
            anchors[index] = Some(Anchor::new(data));
        }
        self.on_anchors_changed();
        Ok(())
    }

    fn on_anchors_changed(&self) {
        self.recompute_defined_borders();
        if self.is_virtual() {
            return;
        }
        self.update_anchors();
        self.notify_borders_need_update();
        self.notify_renderer_need_redraw();
        self.notify_object_moved();
    }

    fn recompute_defined_borders(&self) {
        let mut defined = Bounds2::none();
        for anchor in self.obj.anchors.borrow().iter().flatten() {
            defined_borders_of(anchor.data.point, &mut defined);
        }
        self.obj.defined_borders.set(defined);
    }

    /// Get which borders are pinned by at least one anchor.
    pub fn defined_borders(&self) -> Bounds2<bool> {
        self.obj.defined_borders.get()
    }

    pub fn is_apparent_width_defined(&self) -> bool {
        let defined = self.defined_borders();
        self.dimensions().x > 0.0 || (defined.left && defined.right)
    }

    pub fn is_apparent_height_defined(&self) -> bool {
        let defined = self.defined_borders();
        self.dimensions().y > 0.0 || (defined.top && defined.bottom)
    }

    // --------------------------------------------------------------------
    // Resolved geometry

    /// Get the border rectangle, resolving it first if it is out-of-date.
    pub fn borders(&self) -> Bounds2<f32> {
        self.update_borders();
        self.obj.borders.get()
    }

    pub fn left(&self) -> f32 {
        self.borders().left
    }

    pub fn right(&self) -> f32 {
        self.borders().right
    }

    pub fn top(&self) -> f32 {
        self.borders().top
    }

    pub fn bottom(&self) -> f32 {
        self.borders().bottom
    }

    pub fn center(&self) -> Vector2<f32> {
        self.borders().center()
    }

    /// Get the dimensions the object actually occupies on screen.
    ///
    /// On an axis pinned on both sides this is the resolved extent, otherwise
    /// the explicit dimension.
    pub fn apparent_dimensions(&self) -> Vector2<f32> {
        let defined = self.defined_borders();
        let dims = self.dimensions();
        let borders = self.borders();
        vec2(
            if defined.left && defined.right {
                borders.width()
            } else {
                dims.x
            },
            if defined.top && defined.bottom {
                borders.height()
            } else {
                dims.y
            },
        )
    }

    /// Check if the borders could be resolved on both axes.
    pub fn is_ready(&self) -> bool {
        self.update_borders();
        self.has_flag(ObjectFlags::READY)
    }

    /// Check if the borders must be resolved again before use.
    pub fn borders_need_update(&self) -> bool {
        self.has_dirty_flags(ObjectDirtyFlags::BORDERS)
    }

    /// Check if any anchor of this object is (directly or indirectly)
    /// attached to `other`.
    pub fn depends_on(&self, other: &HObject) -> bool {
        let mut visited: Vec<HObject> = Vec::new();
        let mut stack = self.anchor_targets();

        while let Some(target) = stack.pop() {
            if target == *other {
                return true;
            }
            if visited.contains(&target) {
                continue;
            }
            stack.extend(target.anchor_targets());
            visited.push(target);
        }

        false
    }

    /// Get the objects having an anchor attached to this object.
    pub fn anchored_objects(&self) -> Vec<HObject> {
        let mut list = self.obj.anchored_objects.borrow_mut();
        list.retain(|w| w.strong_count() > 0);
        list.iter().filter_map(HObject::upgrade).collect()
    }

    /// Mark the borders of this object and of every object anchored to it as
    /// out-of-date.
    pub fn notify_borders_need_update(&self) {
        if self.is_virtual() || self.borders_need_update() {
            return;
        }
        self.set_dirty_flags(ObjectDirtyFlags::BORDERS);

        for dependent in self.anchored_objects() {
            dependent.notify_borders_need_update();
        }
    }

    // --------------------------------------------------------------------
    // Dependency bookkeeping

    fn anchor_targets(&self) -> Vec<HObject> {
        if self.is_virtual() {
            return Vec::new();
        }
        let anchors = self.obj.anchors.borrow();
        anchors.iter().flatten().filter_map(|a| a.resolve(self)).collect()
    }

    /// Re-resolve anchor targets, reject cyclic anchors and update the
    /// dependency lists of the targets.
    pub(crate) fn update_anchors(&self) {
        let mut targets = Targets::new();
        let mut removed_any = false;

        for &point in AnchorPoint::ALL.iter() {
            let target = match &self.obj.anchors.borrow()[point.index()] {
                Some(anchor) => anchor.resolve(self),
                None => continue,
            };
            let target = match target {
                Some(target) => target,
                None => continue,
            };

            if target == *self || target.depends_on(self) {
                error!(
                    "{}: cyclic anchor dependency: \"{}\" and \"{}\" depend on each other \
                     (directly or indirectly); the {} anchor is removed",
                    self.name(),
                    self.name(),
                    target.name(),
                    point
                );
                self.obj.anchors.borrow_mut()[point.index()] = None;
                removed_any = true;
                continue;
            }

            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        if removed_any {
            self.recompute_defined_borders();
        }
        self.sync_anchor_parents(&targets);
    }

    fn sync_anchor_parents(&self, targets: &[HObject]) {
        let old = std::mem::replace(&mut *self.obj.anchor_parents.borrow_mut(), ArrayVec::new());

        for parent in old.iter().filter_map(HObject::upgrade) {
            if !targets.contains(&parent) {
                parent.remove_anchored_object(self);
            }
        }
        for target in targets {
            if !old.iter().any(|w| target.is(w)) {
                target.add_anchored_object(self);
            }
        }

        *self.obj.anchor_parents.borrow_mut() = targets.iter().map(HObject::downgrade).collect();
    }

    /// Detach this object from every object its anchors are attached to.
    pub(crate) fn detach_from_anchor_parents(&self) {
        self.sync_anchor_parents(&[]);
    }

    fn add_anchored_object(&self, obj: &HObject) {
        let mut list = self.obj.anchored_objects.borrow_mut();
        list.retain(|w| w.strong_count() > 0);
        if !list.iter().any(|w| obj.is(w)) {
            list.push(obj.downgrade());
        }
    }

    fn remove_anchored_object(&self, obj: &HObject) {
        self.obj
            .anchored_objects
            .borrow_mut()
            .retain(|w| w.strong_count() > 0 && !obj.is(w));
    }

    // --------------------------------------------------------------------
    // Resolver

    /// Resolve the border rectangle if it is out-of-date.
    pub(crate) fn update_borders(&self) {
        if !self.borders_need_update() {
            return;
        }
        if self.is_virtual() {
            self.clear_dirty_flags(ObjectDirtyFlags::BORDERS);
            return;
        }
        if self.has_dirty_flags(ObjectDirtyFlags::UPDATING_BORDERS) {
            warn!(
                "{}: border resolution re-entered itself; the object is not ready",
                self.name()
            );
            self.set_flag(ObjectFlags::READY, false);
            return;
        }

        self.set_dirty_flags(ObjectDirtyFlags::UPDATING_BORDERS);
        self.clear_dirty_flags(ObjectDirtyFlags::BORDERS);

        let old_borders = self.obj.borders.get();
        let old_ready = self.has_flag(ObjectFlags::READY);

        let (borders, ready, targets) = self.resolve_borders();

        self.clear_dirty_flags(ObjectDirtyFlags::UPDATING_BORDERS);
        self.obj.borders.set(borders);
        self.set_flag(ObjectFlags::READY, ready);
        self.sync_anchor_parents(&targets);

        trace!("{}: borders = {:?}, ready = {}", self.name(), borders, ready);

        if borders != old_borders || ready != old_ready {
            self.notify_renderer_need_redraw();
        }
    }

    fn resolve_borders(&self) -> (Bounds2<f32>, bool, Targets) {
        let dims = self.dimensions();
        let mut targets = Targets::new();
        let mut extremes = Extremes::new();
        let mut ready = true;
        let mut num_anchors = 0;

        for &point in AnchorPoint::ALL.iter() {
            let anchors = self.obj.anchors.borrow();
            let anchor = match &anchors[point.index()] {
                Some(anchor) => anchor,
                None => continue,
            };
            num_anchors += 1;

            let target = anchor.resolve(self);
            let pos = anchor.position(self, target.as_ref());
            extremes.add(anchor.data.point, pos);

            if let Some(target) = target {
                if !target.has_flag(ObjectFlags::READY) {
                    ready = false;
                }
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }

        if num_anchors == 0 {
            return (Bounds2::new(0.0, dims.x, 0.0, dims.y), false, targets);
        }

        let width = self.round_to_pixel(dims.x, RoundingMethod::NearestNotZero);
        let height = self.round_to_pixel(dims.y, RoundingMethod::NearestNotZero);

        let Extremes {
            mut left,
            mut right,
            mut top,
            mut bottom,
            x_center,
            y_center,
        } = extremes;

        if !make_borders(&mut top, &mut bottom, y_center, height) {
            ready = false;
        }
        if !make_borders(&mut left, &mut right, x_center, width) {
            ready = false;
        }

        if !ready {
            return (Bounds2::zero(), false, targets);
        }

        if right < left {
            right = left + 1.0;
        }
        if bottom < top {
            bottom = top + 1.0;
        }

        let mut borders = Bounds2::new(
            self.round_to_pixel(left, RoundingMethod::Nearest),
            self.round_to_pixel(right, RoundingMethod::Nearest),
            self.round_to_pixel(top, RoundingMethod::Nearest),
            self.round_to_pixel(bottom, RoundingMethod::Nearest),
        );

        if let Some(frame) = self.as_frame() {
            frame.constrain_borders(&mut borders);
        }

        (borders, true, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_pinned() {
        let (mut min, mut max) = (10.0, 30.0);
        assert!(make_borders(&mut min, &mut max, None, 100.0));
        assert_eq!((min, max), (10.0, 30.0));
    }

    #[test]
    fn min_pinned_with_size() {
        let (mut min, mut max) = (10.0, NEG_INFINITY);
        assert!(make_borders(&mut min, &mut max, None, 50.0));
        assert_eq!((min, max), (10.0, 60.0));
    }

    #[test]
    fn min_pinned_mirrors_around_center() {
        let (mut min, mut max) = (10.0, NEG_INFINITY);
        assert!(make_borders(&mut min, &mut max, Some(25.0), 0.0));
        assert_eq!((min, max), (10.0, 40.0));
    }

    #[test]
    fn max_pinned() {
        let (mut min, mut max) = (INFINITY, 100.0);
        assert!(make_borders(&mut min, &mut max, None, 30.0));
        assert_eq!((min, max), (70.0, 100.0));

        let (mut min, mut max) = (INFINITY, 100.0);
        assert!(make_borders(&mut min, &mut max, Some(90.0), 0.0));
        assert_eq!((min, max), (80.0, 100.0));
    }

    #[test]
    fn center_only() {
        let (mut min, mut max) = (INFINITY, NEG_INFINITY);
        assert!(make_borders(&mut min, &mut max, Some(50.0), 20.0));
        assert_eq!((min, max), (40.0, 60.0));

        let (mut min, mut max) = (INFINITY, NEG_INFINITY);
        assert!(!make_borders(&mut min, &mut max, Some(50.0), 0.0));
    }

    #[test]
    fn under_determined() {
        let (mut min, mut max) = (INFINITY, NEG_INFINITY);
        assert!(!make_borders(&mut min, &mut max, None, 20.0));

        let (mut min, mut max) = (10.0, NEG_INFINITY);
        assert!(!make_borders(&mut min, &mut max, None, 0.0));
    }

    #[test]
    fn extremes_combine() {
        let mut e = Extremes::new();
        e.add(AnchorPoint::TopLeft, vec2(10.0, 20.0));
        e.add(AnchorPoint::BottomLeft, vec2(5.0, 80.0));
        e.add(AnchorPoint::Right, vec2(90.0, 50.0));
        assert_eq!(e.left, 5.0);
        assert_eq!(e.top, 20.0);
        assert_eq!(e.bottom, 80.0);
        assert_eq!(e.right, 90.0);
        assert_eq!(e.y_center, Some(50.0));
        assert_eq!(e.x_center, None);
    }

    #[test]
    fn defined_borders() {
        let mut d = Bounds2::none();
        defined_borders_of(AnchorPoint::Center, &mut d);
        assert_eq!(d, Bounds2::none());
        defined_borders_of(AnchorPoint::TopRight, &mut d);
        assert!(d.top && d.right && !d.left && !d.bottom);
    }
}
