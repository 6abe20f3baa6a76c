//! Application driver.
//!
//! Resolves the level, starts a session and runs the fixed-rate tick loop
//! until the configured duration elapses or Ctrl-C arrives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use runline_world::{PropBlueprint, SegmentBlueprint, SegmentCatalog};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::assets::AssetSource;
use crate::config::EngineConfig;
use crate::demo;
use crate::session::{Session, SessionSummary};

/// Level assets resolved from the configuration.
pub struct Level {
    /// Segment catalog
    pub catalog: SegmentCatalog,
    /// Segment loader
    pub segments: AssetSource<SegmentBlueprint>,
    /// Prop loader
    pub props: AssetSource<PropBlueprint>,
}

/// Resolves the level and fills in demo props when none are configured.
pub fn resolve_level(config: &mut EngineConfig) -> Result<Level> {
    let catalog = match &config.level_path {
        Some(path) => SegmentCatalog::load(path)
            .with_context(|| format!("Failed to load level {}", path.display()))?,
        None => {
            info!("No level configured, using the demo level");
            demo::segment_catalog()
        },
    };

    if config.props.catalog.is_empty() && config.prop_dir.is_none() {
        config.props.catalog = demo::prop_catalog();
    }

    Ok(Level {
        catalog,
        segments: AssetSource::resolve(config.segment_dir.as_deref(), demo::segment_loader),
        props: AssetSource::resolve(config.prop_dir.as_deref(), demo::prop_loader),
    })
}

/// Runs one session to completion.
pub async fn run(mut config: EngineConfig) -> Result<Option<SessionSummary>> {
    let level = resolve_level(&mut config)?;
    info!(
        "Level has {} segments, {} prop assets",
        level.catalog.len(),
        config.props.catalog.len()
    );

    let start = Session::start(&config, level.catalog, Arc::new(level.segments), &level.props);
    let mut session = tokio::select! {
        session = start => session.context("Failed to start session")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted during warm-up");
            return Ok(None);
        },
    };

    let dt = config.tick_seconds();
    let mut interval = time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = config
        .run_seconds
        .map(|seconds| Instant::now() + Duration::from_secs_f32(seconds));
    let stats_interval = u64::from(config.stats_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {},
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            },
        }

        session.tick(dt);

        let stats = session.stats();
        if stats_interval > 0 && stats.ticks % stats_interval == 0 {
            info!(
                "t={:.1}s pos={:.1} active={} pooled={} props={}",
                stats.ticks as f32 * dt,
                session.agent().position().z,
                session.streamer().active_count(),
                session.streamer().pooled_count(),
                session.live_props()
            );
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            info!("Run time elapsed");
            break;
        }
    }

    let summary = session.end();
    info!(
        "Travelled {:.1} units; {} activated, {} trimmed, {} evicted; {} props created",
        summary.distance,
        summary.stats.activated,
        summary.stats.trimmed,
        summary.stats.evicted,
        summary.props_created
    );
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_demo_level() {
        let mut config = EngineConfig::default();
        let level = resolve_level(&mut config).expect("resolve failed");
        assert_eq!(level.catalog.len(), demo::DEMO_SEGMENTS.len());
        assert!(level.segments.directory().is_none());
        assert_eq!(config.props.catalog, demo::prop_catalog());
    }

    #[test]
    fn test_resolve_level_from_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let level_path = temp_dir.path().join("level.toml");
        std::fs::write(&level_path, "segments = [\"a\", \"b\", \"c\"]\n").expect("write failed");

        let mut config = EngineConfig::default();
        config.level_path = Some(level_path);
        config.segment_dir = Some(temp_dir.path().to_path_buf());
        config.prop_dir = Some(temp_dir.path().to_path_buf());

        let level = resolve_level(&mut config).expect("resolve failed");
        assert_eq!(level.catalog.len(), 3);
        assert_eq!(level.segments.directory(), Some(temp_dir.path()));
        assert!(config.props.catalog.is_empty());
    }

    #[test]
    fn test_resolve_missing_level_fails() {
        let mut config = EngineConfig::default();
        config.level_path = Some("/nonexistent/level.toml".into());
        assert!(resolve_level(&mut config).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_for_configured_time() {
        let mut config = EngineConfig::default();
        config.tick_rate = 20;
        config.run_seconds = Some(2.0);
        config.props.seed = Some(3);

        let summary = run(config).await.expect("run failed").expect("not interrupted");
        assert!(summary.stats.ticks >= 39);
        assert!(summary.distance > 20.0);
    }
}
