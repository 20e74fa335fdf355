use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use tableau_scene::TextureImage;
use tracing::{debug, warn};

use crate::error::AssetError;
use crate::store::AssetId;
use crate::texture::decode_png;
use crate::typeface::Typeface;

/// A decoded asset together with where it came from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub id: AssetId,
    /// Path relative to the loader's asset root.
    pub path: PathBuf,
    /// Size of the source bytes.
    pub bytes: usize,
    pub value: T,
}

pub type LoadResult<T> = Result<Loaded<T>, AssetError>;

/// Result of an asynchronous load, produced exactly once.
///
/// Hosts either poll it without blocking through [`Pending::poll_ready`]
/// once per frame, or await it as a `Future`.
#[derive(Debug)]
pub struct Pending<T> {
    rx: Option<oneshot::Receiver<LoadResult<T>>>,
}

/// Completes the matching [`Pending`]. Dropping it unresolved settles the
/// pending value with [`AssetError::Cancelled`].
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<LoadResult<T>>,
}

impl<T> Resolver<T> {
    /// Returns `false` if the pending side was already dropped.
    pub fn resolve(self, result: LoadResult<T>) -> bool {
        self.tx.send(result).is_ok()
    }
}

impl<T> Pending<T> {
    pub fn channel() -> (Resolver<T>, Pending<T>) {
        let (tx, rx) = oneshot::channel();
        (Resolver { tx }, Pending { rx: Some(rx) })
    }

    /// An already settled value.
    pub fn ready(result: LoadResult<T>) -> Self {
        let (resolver, pending) = Self::channel();
        resolver.resolve(result);
        pending
    }

    /// Take the result if it has arrived. Yields `Some` at most once.
    pub fn poll_ready(&mut self) -> Option<LoadResult<T>> {
        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(Some(result)) => {
                self.rx = None;
                Some(result)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                self.rx = None;
                Some(Err(AssetError::Cancelled))
            }
        }
    }

    /// The result has been handed out.
    pub fn is_settled(&self) -> bool {
        self.rx.is_none()
    }
}

impl<T> Future for Pending<T> {
    type Output = LoadResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Err(AssetError::Cancelled));
        };
        match rx.poll_unpin(cx) {
            Poll::Ready(result) => {
                self.rx = None;
                Poll::Ready(result.unwrap_or(Err(AssetError::Cancelled)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Source of fonts and textures, addressed by paths relative to an asset
/// root.
pub trait AssetLoader {
    fn load_font(&self, path: &str) -> Pending<Typeface>;
    fn load_texture(&self, path: &str) -> Pending<TextureImage>;
}

/// Loads from the filesystem, one worker thread per request.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn spawn<T, F>(&self, rel: &str, decode: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&[u8]) -> Result<T, AssetError> + Send + 'static,
    {
        let (resolver, pending) = Pending::channel();
        let full = self.root.join(rel);
        let rel = PathBuf::from(rel);
        let spawned = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = read_and_decode(&full, rel, decode);
                if let Err(e) = &result {
                    debug!(path = %full.display(), error = %e, "asset load failed");
                }
                resolver.resolve(result);
            });
        if let Err(e) = spawned {
            warn!(error = %e, "could not start asset loader thread");
        }
        pending
    }
}

fn read_and_decode<T>(
    full: &Path,
    rel: PathBuf,
    decode: impl FnOnce(&[u8]) -> Result<T, AssetError>,
) -> LoadResult<T> {
    let bytes = std::fs::read(full).map_err(|source| AssetError::Io {
        path: full.to_path_buf(),
        source,
    })?;
    let value = decode(&bytes)?;
    debug!(path = %full.display(), bytes = bytes.len(), "asset loaded");
    Ok(Loaded {
        id: AssetId::of(&bytes),
        path: rel,
        bytes: bytes.len(),
        value,
    })
}

impl AssetLoader for FsLoader {
    fn load_font(&self, path: &str) -> Pending<Typeface> {
        self.spawn(path, Typeface::from_slice)
    }

    fn load_texture(&self, path: &str) -> Pending<TextureImage> {
        self.spawn(path, decode_png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait<T>(pending: &mut Pending<T>) -> LoadResult<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = pending.poll_ready() {
                return result;
            }
            assert!(Instant::now() < deadline, "load did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn manual_channel_yields_once() {
        let (resolver, mut pending) = Pending::<u32>::channel();
        assert!(pending.poll_ready().is_none());
        assert!(!pending.is_settled());
        resolver.resolve(Ok(Loaded {
            id: AssetId(1),
            path: "x".into(),
            bytes: 0,
            value: 42,
        }));
        assert_eq!(pending.poll_ready().unwrap().unwrap().value, 42);
        assert!(pending.is_settled());
        assert!(pending.poll_ready().is_none());
    }

    #[test]
    fn dropped_resolver_cancels() {
        let (resolver, mut pending) = Pending::<u32>::channel();
        drop(resolver);
        assert!(matches!(pending.poll_ready(), Some(Err(AssetError::Cancelled))));
    }

    #[test]
    fn pending_is_a_future() {
        let pending = Pending::ready(Ok(Loaded {
            id: AssetId(2),
            path: "y".into(),
            bytes: 3,
            value: "ok",
        }));
        let loaded = futures::executor::block_on(pending).unwrap();
        assert_eq!(loaded.value, "ok");
    }

    #[test]
    fn fs_loader_reads_font_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fonts")).unwrap();
        let json = r#"{"glyphs":{"?":{"ha":500}},"resolution":1000,"boundingBox":{"yMin":0,"yMax":1000}}"#;
        std::fs::write(dir.path().join("fonts/test.json"), json).unwrap();

        let loader = FsLoader::new(dir.path());
        let loaded = wait(&mut loader.load_font("fonts/test.json")).unwrap();
        assert_eq!(loaded.path, PathBuf::from("fonts/test.json"));
        assert_eq!(loaded.id, AssetId::of(json.as_bytes()));
        assert_eq!(loaded.value.resolution, 1000.0);
    }

    #[test]
    fn fs_loader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(dir.path());
        let err = wait(&mut loader.load_texture("textures/none.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn fs_loader_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let png = crate::texture::encode_png(1, 1, &[10, 20, 30, 255]);
        std::fs::write(dir.path().join("t.png"), &png).unwrap();
        let loader = FsLoader::new(dir.path());
        let loaded = wait(&mut loader.load_texture("t.png")).unwrap();
        assert_eq!(loaded.value.rgba, vec![10, 20, 30, 255]);
        assert_eq!(loaded.bytes, png.len());
    }
}
