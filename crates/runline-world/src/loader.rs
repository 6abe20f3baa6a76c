//! Asynchronous asset resolution.
//!
//! The streamer and prop pooler only know asset keys. Loaders turn a key
//! into a blueprint, asynchronously and fallibly.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use runline_common::{AssetKey, LoadError};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Resolves asset keys to assets of type `A`.
pub trait AssetLoader<A> {
    /// Loads the asset addressed by `key`.
    fn load(&self, key: &AssetKey) -> impl Future<Output = Result<A, LoadError>> + Send;
}

/// In-memory loader backed by a key map.
#[derive(Debug, Clone)]
pub struct MemoryLoader<A> {
    /// Registered assets
    assets: HashMap<AssetKey, A>,
    /// Artificial per-key latency
    latency: HashMap<AssetKey, Duration>,
}

impl<A> Default for MemoryLoader<A> {
    fn default() -> Self {
        Self {
            assets: HashMap::new(),
            latency: HashMap::new(),
        }
    }
}

impl<A> MemoryLoader<A> {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset under `key`.
    pub fn insert(&mut self, key: impl Into<AssetKey>, asset: A) {
        self.assets.insert(key.into(), asset);
    }

    /// Registers an asset, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<AssetKey>, asset: A) -> Self {
        self.insert(key, asset);
        self
    }

    /// Delays every load of `key` by `delay`.
    #[must_use]
    pub fn with_latency(mut self, key: impl Into<AssetKey>, delay: Duration) -> Self {
        self.latency.insert(key.into(), delay);
        self
    }

    /// Returns the number of registered assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if no assets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl<A: Clone + Send> AssetLoader<A> for MemoryLoader<A> {
    fn load(&self, key: &AssetKey) -> impl Future<Output = Result<A, LoadError>> + Send {
        let result = self
            .assets
            .get(key)
            .cloned()
            .ok_or_else(|| LoadError::NotFound { key: key.clone() });
        let delay = self.latency.get(key).copied();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

/// Loads assets from `<root>/<key>.toml` files.
#[derive(Debug, Clone)]
pub struct TomlDirLoader<A> {
    /// Asset directory
    root: PathBuf,
    _asset: PhantomData<fn() -> A>,
}

impl<A> TomlDirLoader<A> {
    /// Creates a loader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _asset: PhantomData,
        }
    }

    /// Returns the asset directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file an asset key maps to.
    #[must_use]
    pub fn path_for(&self, key: &AssetKey) -> PathBuf {
        self.root.join(format!("{key}.toml"))
    }
}

impl<A: DeserializeOwned + Send> AssetLoader<A> for TomlDirLoader<A> {
    fn load(&self, key: &AssetKey) -> impl Future<Output = Result<A, LoadError>> + Send {
        let path = self.path_for(key);
        let key = key.clone();
        async move {
            debug!("Reading asset {key} from {}", path.display());
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(LoadError::NotFound { key });
                },
                Err(source) => return Err(LoadError::Io { key, source }),
            };
            toml::from_str(&contents).map_err(|e| LoadError::Parse {
                key,
                message: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SegmentBlueprint;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_loader_hit_and_miss() {
        let loader = MemoryLoader::new().with("flat", SegmentBlueprint::straight("flat", 10.0));
        let hit = loader.load(&AssetKey::from("flat")).await.expect("load failed");
        assert_eq!(hit.name, "flat");

        let miss = loader.load(&AssetKey::from("ramp")).await;
        assert!(matches!(miss, Err(LoadError::NotFound { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_loader_latency() {
        let loader = MemoryLoader::new()
            .with("slow", 1u32)
            .with_latency("slow", Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        let value = loader.load(&AssetKey::from("slow")).await.expect("load failed");
        assert_eq!(value, 1);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_toml_dir_loader_reads_blueprint() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            temp_dir.path().join("ramp.toml"),
            "name = \"ramp\"\nentry = [0.0, 0.0, 0.0]\nexit = [0.0, 2.0, 15.0]\n",
        )
        .expect("write failed");

        let loader = TomlDirLoader::<SegmentBlueprint>::new(temp_dir.path());
        let blueprint = loader.load(&AssetKey::from("ramp")).await.expect("load failed");
        assert_eq!(blueprint.name, "ramp");
        assert!((blueprint.exit.y - 2.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_toml_dir_loader_missing_and_corrupt() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(temp_dir.path().join("broken.toml"), "entry = \"nope\"").expect("write failed");

        let loader = TomlDirLoader::<SegmentBlueprint>::new(temp_dir.path());
        let missing = loader.load(&AssetKey::from("absent")).await;
        assert!(matches!(missing, Err(LoadError::NotFound { .. })));

        let corrupt = loader.load(&AssetKey::from("broken")).await;
        match corrupt {
            Err(err @ LoadError::Parse { .. }) => assert_eq!(err.key().as_str(), "broken"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
