//! Creation parameters, inheritance and destruction of UI objects.
use flags_macro::flags;
use log::{debug, warn};
use std::rc::Weak;

use super::{
    AnchorData, AnchorOffset, AnchorPoint, AnchorTarget, EventData, HFrame, HObject, Object,
    ObjectFlags, ObjectType,
};

/// The parameters of a new object.
#[derive(Debug, Clone, Default)]
pub struct ObjectAttributes {
    /// The raw name. A leading `$parent` is replaced with the parent's name.
    pub name: String,
    pub object_type: ObjectType,
    /// Create a template instead of a concrete object. Children of virtual
    /// frames are always virtual.
    pub is_virtual: bool,
    /// Templates to copy from, in order.
    pub inheritance: Vec<HObject>,
}

impl ObjectAttributes {
    pub fn new(name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            name: name.into(),
            object_type,
            ..Self::default()
        }
    }

    pub fn frame(name: impl Into<String>) -> Self {
        Self::new(name, ObjectType::Frame)
    }

    pub fn virtual_(self) -> Self {
        Self {
            is_virtual: true,
            ..self
        }
    }

    pub fn inherits(mut self, template: impl Into<HObject>) -> Self {
        self.inheritance.push(template.into());
        self
    }
}

/// Checks if an object is still alive.
///
/// Script handlers can destroy arbitrary objects, including the one whose
/// handler is running. Code calling into scripts keeps an `AliveChecker` and
/// consults it after each call.
#[derive(Debug, Clone)]
pub struct AliveChecker {
    obj: Weak<Object>,
}

impl AliveChecker {
    pub fn new(obj: &HObject) -> Self {
        Self {
            obj: obj.downgrade(),
        }
    }

    /// Check if the object still exists and has not been destroyed.
    pub fn is_alive(&self) -> bool {
        HObject::upgrade(&self.obj).map_or(false, |obj| !obj.is_destroyed())
    }
}

impl HObject {
    /// Copy the properties of `template` into this object.
    ///
    /// Alpha, visibility, dimensions and anchors are copied for every
    /// object. Frames copy their frame-specific state and recreate the
    /// template's children and regions.
    pub fn copy_from(&self, template: &HObject) {
        self.set_flag(ObjectFlags::INHERITS, true);

        self.set_alpha(template.alpha());
        self.set_shown(template.is_shown());
        self.set_dimensions(template.dimensions());

        for data in template.points() {
            self.set_point(data);
        }

        if let (Some(frame), Some(template)) = (self.as_frame(), template.as_frame()) {
            frame.copy_frame_state_from(&template);
        }
    }

    /// Mark the object as fully constructed and fire `OnLoad`.
    pub fn notify_loaded(&self) {
        if self.is_loaded() {
            return;
        }
        self.set_flag(ObjectFlags::LOADED, true);
        if let Some(frame) = self.as_frame() {
            frame.fire_script("OnLoad", &EventData::new());
        }
    }

    /// Destroy the object.
    ///
    /// The object is hidden, removed from its parent (or from the manager's
    /// root frame list), and torn down along with its children and regions.
    /// Every anchor attached to it is converted into an absolute anchor at
    /// its last position. Calling this method more than once has no effect.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        // Dependents are frozen at the geometry resolved while the object
        // still sits in its parent
        match self.as_frame() {
            Some(frame) => frame.update_borders_recursive(),
            None => self.update_borders(),
        }
        self.hide();
        let _owner = self.release_from_parent();
        self.tear_down();
    }

    /// Remove the object from the container owning it. Returns the owning
    /// handle.
    pub fn release_from_parent(&self) -> Option<HObject> {
        if let Some(parent) = self.parent() {
            if let Some(region) = self.as_region() {
                if self.is_special() {
                    return parent.take_title_region(&region).map(Into::into);
                }
                return parent.remove_region(&region).map(Into::into);
            }
            if let Some(frame) = self.as_frame() {
                return parent.remove_child(&frame).map(Into::into);
            }
            return None;
        }

        match (self.manager(), self.as_frame()) {
            (Some(manager), Some(frame)) => manager.remove_root_frame(&frame).map(Into::into),
            _ => None,
        }
    }

    fn tear_down(&self) {
        if self.is_destroyed() {
            return;
        }

        // The object may already be detached from its parent, so the cached
        // rectangle is used. Captured while every anchor target is still
        // registered.
        let borders = if self.is_virtual() {
            None
        } else {
            Some(self.obj.borders.get())
        };
        let frozen = self.collect_frozen_anchors();

        // A destroyed object is neither drawn nor laid out
        let flags = self.obj.flags.get();
        self.obj
            .flags
            .set(flags - flags![ObjectFlags::{VISIBLE | READY}] | ObjectFlags::DESTROYED);
        debug!("{}: destroying", self.name());

        if let Some(frame) = self.as_frame() {
            for child in frame.take_all_children() {
                child.tear_down();
            }
            for region in frame.take_all_regions() {
                region.tear_down();
            }
            if !self.is_virtual() {
                if let Some(renderer) = frame.top_level_renderer() {
                    renderer.notify_rendered_frame(&frame, false);
                }
            }
            frame.unregister_all_events();
            frame.clear_scripts();
            if let Some(manager) = self.manager() {
                manager.forget_frame(&frame);
            }
        }

        if !self.is_virtual() {
            self.detach_from_anchor_parents();
        }

        if let Some(manager) = self.manager() {
            manager.unregister_object(self);
        }

        if let Some(borders) = borders {
            for (dependent, data) in frozen {
                if dependent.is_destroyed() {
                    continue;
                }
                let point = data.parent_point;
                let pos = borders.point(point);
                let offset = match data.offset {
                    AnchorOffset::Abs(v) => v,
                    AnchorOffset::Rel(v) => cgmath::vec2(
                        v.x * borders.width(),
                        v.y * borders.height(),
                    ),
                };
                let offset = offset + pos;
                dependent.set_point(AnchorData {
                    point: data.point,
                    target: AnchorTarget::Screen,
                    parent_point: AnchorPoint::TopLeft,
                    offset: AnchorOffset::Abs(offset),
                });
            }
        }

        if !self.is_virtual() {
            self.notify_object_moved();
        }
    }

    /// Find every anchor of a live object attached to this one.
    fn collect_frozen_anchors(&self) -> Vec<(HObject, AnchorData)> {
        if self.is_virtual() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for dependent in self.anchored_objects() {
            if dependent.is_destroyed() || dependent == *self {
                continue;
            }
            let anchors = dependent.obj.anchors.borrow();
            for anchor in anchors.iter().flatten() {
                if anchor.resolve(&dependent).as_ref() == Some(self) {
                    out.push((dependent.clone(), anchor.data.clone()));
                }
            }
        }
        out
    }

    /// Build the script name of an object from its raw name.
    pub(crate) fn substitute_parent_name(raw_name: &str, parent: Option<&HFrame>) -> String {
        if !raw_name.starts_with("$parent") {
            return raw_name.to_owned();
        }
        match parent {
            Some(parent) => raw_name.replacen("$parent", parent.lua_name(), 1),
            None => {
                warn!(
                    "{:?} has no parent; \"$parent\" is replaced with an empty string",
                    raw_name
                );
                raw_name.replacen("$parent", "", 1)
            }
        }
    }
}
