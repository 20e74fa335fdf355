use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle referencing a decoded texture. Renderers consume textures by
/// handle and upload them lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// Decoded RGBA8 image plus sampling hints.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Texels are sRGB-encoded (color maps) rather than linear data.
    pub srgb: bool,
    pub anisotropy: u16,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
            srgb: false,
            anisotropy: 1,
        }
    }

    /// 1x1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, rgba.to_vec())
    }

    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

/// Textures referenced by materials in one scene.
#[derive(Debug, Clone, Default)]
pub struct TextureStore {
    textures: BTreeMap<TextureId, Arc<TextureImage>>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TextureId, image: TextureImage) {
        self.textures.insert(id, Arc::new(image));
    }

    /// Insert an image already shared with an asset registry.
    pub fn insert_shared(&mut self, id: TextureId, image: Arc<TextureImage>) {
        self.textures.insert(id, image);
    }

    pub fn get(&self, id: TextureId) -> Option<&Arc<TextureImage>> {
        self.textures.get(&id)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_texture_is_well_formed() {
        let t = TextureImage::solid([255, 255, 255, 255]);
        assert!(t.is_well_formed());
        assert!(!TextureImage::new(2, 2, vec![0; 4]).is_well_formed());
    }

    #[test]
    fn store_insert_and_get() {
        let mut store = TextureStore::new();
        assert!(store.is_empty());
        store.insert(TextureId(1), TextureImage::solid([0, 0, 0, 255]));
        assert!(store.contains(TextureId(1)));
        assert_eq!(store.get(TextureId(1)).unwrap().width, 1);
        assert_eq!(store.len(), 1);

        let shared = Arc::new(TextureImage::solid([1, 2, 3, 255]));
        store.insert_shared(TextureId(2), Arc::clone(&shared));
        assert!(Arc::ptr_eq(store.get(TextureId(2)).unwrap(), &shared));
    }
}
