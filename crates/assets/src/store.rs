use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tableau_scene::{TextureId, TextureImage};
use tracing::debug;

use crate::error::AssetError;
use crate::loader::Loaded;
use crate::typeface::Typeface;

/// Content-addressed asset ID: the first eight bytes of the SHA-256 of the
/// source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[..8]);
        AssetId(u64::from_le_bytes(id))
    }

    /// Texture handle for a texture asset.
    pub fn texture_id(self) -> TextureId {
        TextureId(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Font,
    Texture,
}

/// Manifest entry describing one registered asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub kind: AssetKind,
    pub path: String,
    pub bytes: usize,
}

/// Registry of loaded assets keyed by content hash. Registering identical
/// bytes twice returns the already stored value.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    records: BTreeMap<AssetId, AssetRecord>,
    fonts: BTreeMap<AssetId, Arc<Typeface>>,
    textures: BTreeMap<AssetId, Arc<TextureImage>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_font(&mut self, loaded: Loaded<Typeface>) -> Arc<Typeface> {
        if let Some(existing) = self.fonts.get(&loaded.id) {
            debug!(id = loaded.id.0, "font already registered");
            return Arc::clone(existing);
        }
        self.record(&loaded, AssetKind::Font);
        let font = Arc::new(loaded.value);
        self.fonts.insert(loaded.id, Arc::clone(&font));
        font
    }

    pub fn register_texture(&mut self, loaded: Loaded<TextureImage>) -> Arc<TextureImage> {
        if let Some(existing) = self.textures.get(&loaded.id) {
            debug!(id = loaded.id.0, "texture already registered");
            return Arc::clone(existing);
        }
        self.record(&loaded, AssetKind::Texture);
        let texture = Arc::new(loaded.value);
        self.textures.insert(loaded.id, Arc::clone(&texture));
        texture
    }

    fn record<T>(&mut self, loaded: &Loaded<T>, kind: AssetKind) {
        self.records.insert(
            loaded.id,
            AssetRecord {
                id: loaded.id,
                kind,
                path: loaded.path.display().to_string(),
                bytes: loaded.bytes,
            },
        );
    }

    pub fn font(&self, id: AssetId) -> Result<&Arc<Typeface>, AssetError> {
        self.fonts.get(&id).ok_or(AssetError::NotFound(id))
    }

    pub fn texture(&self, id: AssetId) -> Result<&Arc<TextureImage>, AssetError> {
        self.textures.get(&id).ok_or(AssetError::NotFound(id))
    }

    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the manifest (records only, not asset data) as JSON.
    pub fn save_manifest(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        let records: Vec<&AssetRecord> = self.records.values().collect();
        serde_json::to_writer_pretty(file, &records)?;
        Ok(())
    }

    pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<AssetRecord>, AssetError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn texture(bytes: &[u8]) -> Loaded<TextureImage> {
        Loaded {
            id: AssetId::of(bytes),
            path: PathBuf::from("textures/test.png"),
            bytes: bytes.len(),
            value: TextureImage::solid([1, 2, 3, 4]),
        }
    }

    #[test]
    fn id_is_content_addressed() {
        assert_eq!(AssetId::of(b"abc"), AssetId::of(b"abc"));
        assert_ne!(AssetId::of(b"abc"), AssetId::of(b"abd"));
        assert_eq!(AssetId::of(b"abc").texture_id().0, AssetId::of(b"abc").0);
    }

    #[test]
    fn identical_bytes_dedupe() {
        let mut store = AssetStore::new();
        let a = store.register_texture(texture(b"png bytes"));
        let b = store.register_texture(texture(b"png bytes"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);
        store.register_texture(texture(b"other bytes"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn missing_asset_is_not_found() {
        let store = AssetStore::new();
        assert!(matches!(
            store.font(AssetId(7)),
            Err(AssetError::NotFound(AssetId(7)))
        ));
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut store = AssetStore::new();
        store.register_texture(texture(b"png bytes"));
        store.save_manifest(tmp.path()).unwrap();

        let records = AssetStore::load_manifest(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, AssetKind::Texture);
        assert_eq!(records[0].path, "textures/test.png");
        assert_eq!(records[0].bytes, 9);
    }
}
