//! Draw layers of a frame.
use log::{debug, warn};

use super::{HFrame, HRegion, Layer, ObjectDirtyFlags, ObjectType, RenderBackend};

/// The regions of one draw layer, in drawing order.
#[derive(Debug, Default)]
pub(crate) struct LayerBucket {
    pub(super) regions: Vec<HRegion>,
    pub(super) disabled: bool,
}

impl HFrame {
    /// Pend a rebuild of the layer buckets. The rebuild happens in the next
    /// `update`.
    pub fn notify_layers_need_update(&self) {
        self.set_dirty_flags(ObjectDirtyFlags::LAYERS);
        self.notify_renderer_need_redraw();
    }

    /// Rebuild the layer buckets from the region list.
    ///
    /// Within a layer, regions keep their insertion order, except that font
    /// strings always come after every other region so that text is drawn on
    /// top of the artwork of the same layer.
    pub(super) fn rebuild_layers(&self) {
        let (font_strings, others): (Vec<HRegion>, Vec<HRegion>) = self
            .regions()
            .into_iter()
            .partition(|r| r.object_type() == ObjectType::FontString);

        {
            let mut layers = self.state().layers.borrow_mut();
            for bucket in layers.iter_mut() {
                bucket.regions.clear();
            }
            for region in others.into_iter().chain(font_strings) {
                layers[region.draw_layer().index()].regions.push(region);
            }
        }

        self.clear_dirty_flags(ObjectDirtyFlags::LAYERS);
        debug!("{}: layers rebuilt", self.name());
    }

    /// Get the regions drawn in `layer`, in drawing order, as of the last
    /// layer rebuild.
    pub fn layer_regions(&self, layer: Layer) -> Vec<HRegion> {
        self.state().layers.borrow()[layer.index()].regions.clone()
    }

    /// Stop drawing the regions of `layer`.
    pub fn disable_draw_layer(&self, layer: Layer) {
        let changed = {
            let mut layers = self.state().layers.borrow_mut();
            !std::mem::replace(&mut layers[layer.index()].disabled, true)
        };
        if changed {
            self.notify_renderer_need_redraw();
        }
    }

    pub fn enable_draw_layer(&self, layer: Layer) {
        let changed = {
            let mut layers = self.state().layers.borrow_mut();
            std::mem::replace(&mut layers[layer.index()].disabled, false)
        };
        if changed {
            self.notify_renderer_need_redraw();
        }
    }

    /// `disable_draw_layer`/`enable_draw_layer` with a layer name. Unknown
    /// names are logged and ignored.
    pub fn set_draw_layer_enabled_str(&self, name: &str, enabled: bool) {
        match name.parse() {
            Ok(layer) if enabled => self.enable_draw_layer(layer),
            Ok(layer) => self.disable_draw_layer(layer),
            Err(e) => warn!("{}: {}", self.name(), e),
        }
    }

    pub fn is_draw_layer_enabled(&self, layer: Layer) -> bool {
        !self.state().layers.borrow()[layer.index()].disabled
    }

    pub(super) fn render_layers(&self, backend: &mut dyn RenderBackend) {
        let layers: Vec<Vec<HRegion>> = self
            .state()
            .layers
            .borrow()
            .iter()
            .filter(|bucket| !bucket.disabled)
            .map(|bucket| bucket.regions.clone())
            .collect();

        for region in layers.into_iter().flatten() {
            // Skip regions removed since the last rebuild
            if region.parent().as_ref() != Some(self) {
                continue;
            }
            region.render(backend);
        }
    }
}
