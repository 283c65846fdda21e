#![allow(dead_code)]
use cgmath::{vec2, Vector2};
use std::{cell::RefCell, rc::Rc};

use lxgui::{
    prelude::*,
    uicore::{Backdrop, FrameRenderer, RenderBackend, StrataList},
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_manager() -> Manager {
    init_logger();
    Manager::new(ManagerConfig::default())
}

/// Create a root frame with a top-left anchor and explicit dimensions.
pub fn placed_frame(manager: &Manager, name: &str, pos: [f32; 2], size: [f32; 2]) -> HFrame {
    let frame = manager
        .create_root_frame(ObjectAttributes::frame(name))
        .expect("could not create a frame");
    frame.set_point(AnchorData::to_parent(AnchorPoint::TopLeft).with_offset(pos[0], pos[1]));
    frame.set_dimensions(vec2(size[0], size[1]));
    frame
}

/// A shared, append-only log of strings.
#[derive(Debug, Default, Clone)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, x: impl Into<String>) {
        self.0.borrow_mut().push(x.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::replace(&mut *self.0.borrow_mut(), Vec::new())
    }
}

/// Records draw calls as `"backdrop:<frame>"` and `"<region>"`.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<String>,
}

impl RenderBackend for RecordingBackend {
    fn draw_backdrop(&mut self, frame: &HFrame, _: &Backdrop) {
        self.calls.push(format!("backdrop:{}", frame.name()));
    }

    fn draw_region(&mut self, region: &HRegion) {
        self.calls.push(region.name().to_owned());
    }
}

/// An off-screen render target.
#[derive(Debug)]
pub struct TargetRenderer {
    pub strata: RefCell<StrataList>,
    pub dims: Vector2<f32>,
}

impl TargetRenderer {
    pub fn new(dims: Vector2<f32>) -> Self {
        Self {
            strata: RefCell::new(StrataList::new()),
            dims,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.strata.borrow().num_frames()
    }
}

impl FrameRenderer for TargetRenderer {
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

    fn target_dimensions(&self) -> Vector2<f32> {
        self.dims
    }
}
