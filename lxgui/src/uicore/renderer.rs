//! Frame renderers and the strata/level bucket store.
use cgmath::Vector2;
use log::{debug, warn};
use std::{
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use super::{Backdrop, FrameStrata, HFrame, HObject, HRegion, Object};

/// An object drawing a set of frames, sorted by strata and level.
///
/// The manager's [`Root`](super::Root) is the default renderer of every
/// frame. A frame can be redirected to another renderer (e.g., an off-screen
/// render target) with [`HFrame::set_renderer`]; the frame and its
/// descendants without their own override are then reported to that
/// renderer instead.
///
/// All notifications describe the frame's state *after* the change except
/// where the old value is passed explicitly.
pub trait FrameRenderer {
    /// A frame started (`rendered == true`) or stopped being drawn by this
    /// renderer.
    fn notify_rendered_frame(&self, frame: &HFrame, rendered: bool);

    fn notify_frame_strata_changed(&self, frame: &HFrame, old: FrameStrata, new: FrameStrata);

    fn notify_frame_level_changed(&self, frame: &HFrame, old: i32, new: i32);

    /// The contents of `strata` must be drawn again.
    fn notify_strata_needs_redraw(&self, strata: FrameStrata);

    /// Get the highest level used by a frame of `strata`, or `0` if the
    /// stratum is empty.
    fn highest_level(&self, strata: FrameStrata) -> i32;

    /// Get the highest level used by a frame of `strata` that is neither
    /// `excluded` nor one of its descendants, or `0` if there is none.
    ///
    /// Used by [`HFrame::raise`]. The default implementation does not
    /// exclude anything, which makes repeated raises keep climbing.
    fn highest_level_excluding(&self, strata: FrameStrata, excluded: &HFrame) -> i32 {
        let _ = excluded;
        self.highest_level(strata)
    }

    /// Get the dimensions of the drawing area in UI units.
    fn target_dimensions(&self) -> Vector2<f32>;
}

/// The drawing backend. Implemented by graphics integrations.
pub trait RenderBackend {
    /// Draw the backdrop of a frame. Called before the frame's regions.
    fn draw_backdrop(&mut self, frame: &HFrame, backdrop: &Backdrop);

    /// Draw a visible and ready region.
    fn draw_region(&mut self, region: &HRegion);
}

#[derive(Debug, Default)]
struct Stratum {
    levels: BTreeMap<i32, Vec<Weak<Object>>>,
    redraw: bool,
}

/// Per-stratum, per-level lists of frames in drawing order.
///
/// This type implements the bookkeeping part of [`FrameRenderer`]. Wrap it in
/// a `RefCell` to implement the trait.
#[derive(Debug, Default)]
pub struct StrataList {
    strata: [Stratum; FrameStrata::COUNT],
    list_changed: bool,
}

impl StrataList {
    pub fn new() -> Self {
        Self::default()
    }

    fn stratum_mut(&mut self, strata: FrameStrata) -> Option<&mut Stratum> {
        match strata.index() {
            Some(i) => Some(&mut self.strata[i]),
            None => {
                warn!("StrataList: cannot use the PARENT strata directly");
                None
            }
        }
    }

    fn add(&mut self, frame: &HFrame, strata: FrameStrata, level: i32) {
        let stratum = match self.stratum_mut(strata) {
            Some(x) => x,
            None => return,
        };
        let list = stratum.levels.entry(level).or_insert_with(Vec::new);
        if list.iter().any(|w| frame.is(w)) {
            warn!("{}: already registered at {} level {}", frame.name(), strata, level);
            return;
        }
        list.push(frame.downgrade());
        stratum.redraw = true;
        self.list_changed = true;
    }

    fn remove(&mut self, frame: &HFrame, strata: FrameStrata, level: i32) {
        let stratum = match self.stratum_mut(strata) {
            Some(x) => x,
            None => return,
        };
        let found = match stratum.levels.get_mut(&level) {
            Some(list) => {
                let len = list.len();
                list.retain(|w| !frame.is(w));
                list.len() != len
            }
            None => false,
        };
        if !found {
            warn!(
                "{}: not registered at {} level {}",
                frame.name(),
                strata,
                level
            );
            return;
        }
        if stratum.levels.get(&level).map_or(false, Vec::is_empty) {
            stratum.levels.remove(&level);
        }
        stratum.redraw = true;
        self.list_changed = true;
    }

    /// Add or remove a frame at its current strata and level.
    pub fn notify_rendered_frame(&mut self, frame: &HFrame, rendered: bool) {
        let (strata, level) = (frame.frame_strata(), frame.level());
        if rendered {
            self.add(frame, strata, level);
        } else {
            self.remove(frame, strata, level);
        }
    }

    /// Move a frame to another stratum. The frame's level is unchanged.
    pub fn notify_frame_strata_changed(
        &mut self,
        frame: &HFrame,
        old: FrameStrata,
        new: FrameStrata,
    ) {
        let level = frame.level();
        self.remove(frame, old, level);
        self.add(frame, new, level);
    }

    /// Move a frame to another level inside its current stratum.
    pub fn notify_frame_level_changed(&mut self, frame: &HFrame, old: i32, new: i32) {
        let strata = frame.frame_strata();
        self.remove(frame, strata, old);
        self.add(frame, strata, new);
    }

    pub fn notify_strata_needs_redraw(&mut self, strata: FrameStrata) {
        if let Some(stratum) = self.stratum_mut(strata) {
            stratum.redraw = true;
        }
    }

    pub fn highest_level(&self, strata: FrameStrata) -> i32 {
        let stratum = match strata.index() {
            Some(i) => &self.strata[i],
            None => return 0,
        };
        stratum
            .levels
            .iter()
            .rev()
            .find(|(_, list)| list.iter().any(|w| w.strong_count() > 0))
            .map_or(0, |(&level, _)| level)
    }

    pub fn highest_level_excluding(&self, strata: FrameStrata, excluded: &HFrame) -> i32 {
        let stratum = match strata.index() {
            Some(i) => &self.strata[i],
            None => return 0,
        };
        let counts = |obj: HObject| obj != **excluded && !obj.is_descendant_of(excluded);
        stratum
            .levels
            .iter()
            .rev()
            .find(|(_, list)| {
                list.iter()
                    .filter_map(|w| w.upgrade())
                    .any(|obj| counts(HObject::from_rc(obj)))
            })
            .map_or(0, |(&level, _)| level)
    }

    /// Check if `strata` was invalidated since the last call to
    /// `clear_redraw_flags`.
    pub fn needs_redraw(&self, strata: FrameStrata) -> bool {
        strata.index().map_or(false, |i| self.strata[i].redraw)
    }

    pub fn clear_redraw_flags(&mut self) {
        for stratum in self.strata.iter_mut() {
            stratum.redraw = false;
        }
    }

    /// Check if a frame was added, removed or moved since the last call to
    /// `take_list_changed`, and reset the flag.
    pub fn take_list_changed(&mut self) -> bool {
        std::mem::replace(&mut self.list_changed, false)
    }

    /// Get the registered frames in drawing order (bottom-most first).
    ///
    /// Frames that were dropped without being deregistered are pruned.
    pub fn frames(&mut self) -> Vec<HFrame> {
        let mut out = Vec::new();
        for stratum in self.strata.iter_mut() {
            stratum.levels.retain(|_, list| {
                list.retain(|w| w.strong_count() > 0);
                !list.is_empty()
            });
            for list in stratum.levels.values() {
                out.extend(
                    list.iter()
                        .filter_map(|w| w.upgrade())
                        .filter_map(|obj| HObject::from_rc(obj).as_frame()),
                );
            }
        }
        out
    }

    pub fn num_frames(&self) -> usize {
        self.strata
            .iter()
            .flat_map(|s| s.levels.values())
            .map(|list| list.iter().filter(|w| w.strong_count() > 0).count())
            .sum()
    }

    /// Draw every registered frame.
    ///
    /// The list is snapshotted first, so frames may be added or removed by
    /// the backend without invalidating the iteration.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) {
        let frames = self.frames();
        debug!("StrataList: rendering {} frame(s)", frames.len());
        for frame in frames {
            frame.render(backend);
        }
        self.clear_redraw_flags();
    }
}

/// Check if two renderers are the same object.
pub(crate) fn same_renderer(a: &Rc<dyn FrameRenderer>, b: &Rc<dyn FrameRenderer>) -> bool {
    let a: *const dyn FrameRenderer = &**a;
    let b: *const dyn FrameRenderer = &**b;
    a as *const u8 == b as *const u8
}

/// Find the top-most visible frame satisfying `pred` among `frames`, which
/// must be in drawing order.
pub(crate) fn find_topmost_frame(
    frames: Vec<HFrame>,
    mut pred: impl FnMut(&HFrame) -> bool,
) -> Option<HFrame> {
    frames
        .into_iter()
        .rev()
        .find(|frame| frame.is_visible() && pred(frame))
}
