use crate::assets::{AssetRegistry, TextureHandle};
use std::collections::HashMap;

/// egui copies of registry textures, keyed by registry handle.
#[derive(Default)]
pub struct EguiTextures {
    uploaded: HashMap<TextureHandle, egui::TextureHandle>,
}

impl EguiTextures {
    /// Uploads every image the registry decoded since the last call. Returns how many were uploaded.
    pub fn sync(&mut self, ctx: &egui::Context, registry: &mut AssetRegistry) -> usize {
        let mut uploaded = 0;
        for upload in registry.take_pending_uploads() {
            let size = [upload.image.width as usize, upload.image.height as usize];
            if upload.image.rgba.len() != size[0] * size[1] * 4 {
                log::warn!(
                    "[editor] texture '{}' has {} bytes of pixels for {}x{}; skipped",
                    upload.short_name,
                    upload.image.rgba.len(),
                    size[0],
                    size[1]
                );
                continue;
            }
            let image = egui::ColorImage::from_rgba_unmultiplied(size, &upload.image.rgba);
            let handle = ctx.load_texture(upload.short_name, image, egui::TextureOptions::LINEAR);
            self.uploaded.insert(upload.handle, handle);
            uploaded += 1;
        }
        uploaded
    }

    pub fn id(&self, handle: TextureHandle) -> Option<egui::TextureId> {
        self.uploaded.get(&handle).map(egui::TextureHandle::id)
    }

    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }
}
