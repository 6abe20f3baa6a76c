//! Asset source selection.
//!
//! Levels either ship as TOML files on disk or fall back to the built-in
//! demo set held in memory.

use std::future::Future;
use std::path::Path;

use runline_common::{AssetKey, LoadError};
use runline_world::{AssetLoader, MemoryLoader, TomlDirLoader};
use serde::de::DeserializeOwned;
use tracing::info;

/// Where assets of type `A` come from.
#[derive(Debug, Clone)]
pub enum AssetSource<A> {
    /// Assets held in memory
    Memory(MemoryLoader<A>),
    /// One TOML file per asset key
    Directory(TomlDirLoader<A>),
}

impl<A> AssetSource<A> {
    /// Reads from `dir` when given, otherwise from `fallback`.
    pub fn resolve(dir: Option<&Path>, fallback: impl FnOnce() -> MemoryLoader<A>) -> Self {
        match dir {
            Some(dir) => {
                info!("Loading assets from {}", dir.display());
                Self::Directory(TomlDirLoader::new(dir))
            },
            None => Self::Memory(fallback()),
        }
    }

    /// Returns the asset directory, if any.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        match self {
            Self::Memory(_) => None,
            Self::Directory(loader) => Some(loader.root()),
        }
    }
}

impl<A> AssetLoader<A> for AssetSource<A>
where
    A: Clone + DeserializeOwned + Send + Sync,
{
    fn load(&self, key: &AssetKey) -> impl Future<Output = Result<A, LoadError>> + Send {
        let key = key.clone();
        async move {
            match self {
                Self::Memory(loader) => loader.load(&key).await,
                Self::Directory(loader) => loader.load(&key).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runline_world::SegmentBlueprint;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_fallback() {
        let source = AssetSource::resolve(None, || {
            MemoryLoader::new().with("flat", SegmentBlueprint::straight("flat", 12.0))
        });
        assert!(source.directory().is_none());
        let blueprint = source.load(&AssetKey::from("flat")).await.expect("load failed");
        assert_eq!(blueprint.name, "flat");
    }

    #[tokio::test]
    async fn test_directory_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            temp_dir.path().join("dip.toml"),
            "name = \"dip\"\nentry = [0.0, 0.0, 0.0]\nexit = [0.0, -1.0, 20.0]\n",
        )
        .expect("write failed");

        let source: AssetSource<SegmentBlueprint> =
            AssetSource::resolve(Some(temp_dir.path()), MemoryLoader::new);
        assert_eq!(source.directory(), Some(temp_dir.path()));
        let blueprint = source.load(&AssetKey::from("dip")).await.expect("load failed");
        assert_eq!(blueprint.name, "dip");
        let missing = source.load(&AssetKey::from("hill")).await;
        assert!(matches!(missing, Err(LoadError::NotFound { .. })));
    }
}
