use log::warn;

use super::{HRegion, Layer, ObjectType, RenderBackend};

impl HRegion {
    pub fn draw_layer(&self) -> Layer {
        self.obj.obj.draw_layer.get()
    }

    /// Move the region to another draw layer of its parent.
    pub fn set_draw_layer(&self, layer: Layer) {
        if self.obj.obj.draw_layer.replace(layer) == layer {
            return;
        }
        if let Some(parent) = self.parent() {
            parent.notify_layers_need_update();
        }
    }

    /// `set_draw_layer` with a layer name. Unknown names are logged and
    /// ignored.
    pub fn set_draw_layer_str(&self, name: &str) {
        match name.parse() {
            Ok(layer) => self.set_draw_layer(layer),
            Err(e) => warn!("{}: {}", self.name(), e),
        }
    }

    pub fn is_font_string(&self) -> bool {
        self.object_type() == ObjectType::FontString
    }

    /// Advance the region by `delta` seconds.
    pub fn update(&self, _delta: f32) {
        self.update_borders();
    }

    /// Hand the region to `backend` if it is visible and ready.
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        if self.is_visible() && self.is_ready() {
            backend.draw_region(self);
        }
    }
}
