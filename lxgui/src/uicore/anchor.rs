//! Anchors: directed positioning constraints between objects.
use cgmath::{vec2, Vector2, Zero};
use log::warn;
use std::cell::Cell;

use super::{AnchorPoint, HObject};
use crate::utils::RoundingMethod;

/// The object an anchor is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnchorTarget {
    /// The anchored object's direct parent, or the screen if it has none.
    Parent,
    /// An object looked up by name every time the anchor is resolved. A
    /// leading `$parent` is replaced with the parent's script name.
    Named(String),
    /// The screen origin.
    Screen,
}

impl From<&str> for AnchorTarget {
    /// An empty name refers to the parent.
    fn from(x: &str) -> Self {
        if x.is_empty() {
            AnchorTarget::Parent
        } else {
            AnchorTarget::Named(x.to_owned())
        }
    }
}

impl From<String> for AnchorTarget {
    fn from(x: String) -> Self {
        if x.is_empty() {
            AnchorTarget::Parent
        } else {
            AnchorTarget::Named(x)
        }
    }
}

impl From<&HObject> for AnchorTarget {
    fn from(x: &HObject) -> Self {
        AnchorTarget::Named(x.name().to_owned())
    }
}

/// The offset of an anchor from its target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorOffset {
    /// An offset in UI units.
    Abs(Vector2<f32>),
    /// An offset expressed as a fraction of the target's dimensions.
    Rel(Vector2<f32>),
}

impl AnchorOffset {
    /// Convert the offset to UI units given the dimensions of the target.
    pub fn absolute(&self, target_size: Vector2<f32>) -> Vector2<f32> {
        match *self {
            AnchorOffset::Abs(v) => v,
            AnchorOffset::Rel(v) => vec2(v.x * target_size.x, v.y * target_size.y),
        }
    }

    pub fn is_relative(&self) -> bool {
        match self {
            AnchorOffset::Rel(_) => true,
            AnchorOffset::Abs(_) => false,
        }
    }
}

impl Default for AnchorOffset {
    fn default() -> Self {
        AnchorOffset::Abs(Vector2::zero())
    }
}

/// The description of an anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorData {
    /// The point of the anchored object.
    pub point: AnchorPoint,
    pub target: AnchorTarget,
    /// The point of the target `point` is attached to.
    pub parent_point: AnchorPoint,
    pub offset: AnchorOffset,
}

impl AnchorData {
    /// Construct an anchor with a zero offset.
    pub fn new(
        point: AnchorPoint,
        target: impl Into<AnchorTarget>,
        parent_point: AnchorPoint,
    ) -> Self {
        Self {
            point,
            target: target.into(),
            parent_point,
            offset: AnchorOffset::default(),
        }
    }

    /// Construct an anchor attaching `point` to the same point of the parent.
    pub fn to_parent(point: AnchorPoint) -> Self {
        Self::new(point, AnchorTarget::Parent, point)
    }

    /// Replace the offset with an absolute one.
    pub fn with_offset(self, x: f32, y: f32) -> Self {
        Self {
            offset: AnchorOffset::Abs(vec2(x, y)),
            ..self
        }
    }

    /// Replace the offset with one relative to the target's dimensions.
    pub fn with_rel_offset(self, x: f32, y: f32) -> Self {
        Self {
            offset: AnchorOffset::Rel(vec2(x, y)),
            ..self
        }
    }
}

/// An anchor stored in an object's anchor slot.
#[derive(Debug)]
pub(crate) struct Anchor {
    pub(crate) data: AnchorData,
    /// Set once an unresolvable target was reported.
    warned: Cell<bool>,
}

impl Anchor {
    pub(crate) fn new(data: AnchorData) -> Self {
        Self {
            data,
            warned: Cell::new(false),
        }
    }

    fn warn_once(&self, owner: &HObject, what: std::fmt::Arguments<'_>) {
        if !self.warned.replace(true) {
            warn!("{}: {}; anchoring to the screen instead", owner.name(), what);
        }
    }

    /// Find the object this anchor is attached to. `None` means the screen.
    ///
    /// Named targets are looked up in the live registry on every call, so a
    /// destroyed or not-yet-created target silently resolves to the screen.
    pub(crate) fn resolve(&self, owner: &HObject) -> Option<HObject> {
        match &self.data.target {
            AnchorTarget::Screen => None,
            AnchorTarget::Parent => owner.parent().map(|p| p.to_object()),
            AnchorTarget::Named(name) => {
                let full_name = if name.starts_with("$parent") {
                    match owner.parent() {
                        Some(parent) => name.replacen("$parent", parent.lua_name(), 1),
                        None => {
                            self.warn_once(
                                owner,
                                format_args!("anchor target {:?} has no parent to refer to", name),
                            );
                            return None;
                        }
                    }
                } else {
                    name.clone()
                };

                match owner.manager().and_then(|m| m.object_by_name(&full_name)) {
                    Some(target) => Some(target),
                    None => {
                        self.warn_once(
                            owner,
                            format_args!("unknown anchor target {:?}", full_name),
                        );
                        None
                    }
                }
            }
        }
    }

    /// The absolute offset of this anchor given the apparent dimensions of
    /// its resolved target.
    pub(crate) fn absolute_offset(&self, target_size: Vector2<f32>) -> Vector2<f32> {
        self.data.offset.absolute(target_size)
    }

    /// Compute the screen-space position of `data.point` of the owner.
    ///
    /// `target` must be the result of `resolve`. Its borders are brought up
    /// to date as a side effect.
    pub(crate) fn position(&self, owner: &HObject, target: Option<&HObject>) -> Vector2<f32> {
        let (target_pos, target_size, rel_base) = match target {
            Some(t) => {
                let b = t.borders();
                (b.top_left(), b.dimensions(), t.apparent_dimensions())
            }
            None => {
                let size = owner.renderer_target_dimensions();
                (Vector2::zero(), size, size)
            }
        };

        let offset = self.absolute_offset(rel_base);
        let offset = vec2(
            owner.round_to_pixel(offset.x, RoundingMethod::NearestNotZero),
            owner.round_to_pixel(offset.y, RoundingMethod::NearestNotZero),
        );

        target_pos + self.data.parent_point.offset_in(target_size) + offset
    }
}
