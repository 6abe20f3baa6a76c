//! Segment streaming around a moving agent.
//!
//! ## Overview
//!
//! The streamer owns a fixed set of segment instances, one per catalog
//! entry, partitioned between two containers:
//! - the active window, ordered oldest to newest along the track
//! - a [`RingPool`] of idle instances
//!
//! Instances are never created after warm-up and never destroyed, so the
//! number of live segments is bounded by the catalog size no matter how far
//! the agent runs.
//!
//! Each tick:
//! 1. If the agent is within `activation_distance` of the newest segment's
//!    exit anchor, `activation_batch` more segments are placed ahead.
//! 2. Segments far enough behind the agent are recycled, but never below
//!    the `window_size` floor.
//!
//! Every activation also trims the oldest segments once the window exceeds
//! `max_active_segments`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use runline_common::{
    distance_behind, AssetKey, LoadError, Point3, PoolError, RingPool, SegmentId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::catalog::{SegmentBlueprint, SegmentCatalog};
use crate::loader::AssetLoader;
use crate::segment::Segment;

/// Default number of segments placed at start-up, and the eviction floor.
pub const DEFAULT_WINDOW_SIZE: usize = 2;

/// Default look-ahead trigger distance.
pub const DEFAULT_ACTIVATION_DISTANCE: f32 = 20.0;

/// Default trailing eviction distance.
pub const DEFAULT_MAX_DISTANCE_BEHIND: f32 = 50.0;

/// Default number of segments placed per look-ahead trigger.
pub const DEFAULT_ACTIVATION_BATCH: usize = 2;

/// Streaming errors.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Pool misconfiguration
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Invalid streaming configuration
    #[error("Invalid streaming config: {0}")]
    InvalidConfig(String),

    /// A catalog entry could not be loaded during warm-up
    #[error("Warm-up failed to load segment {key}: {source}")]
    WarmupLoadFailure {
        /// Key that failed
        key: AssetKey,
        /// Loader error
        #[source]
        source: LoadError,
    },

    /// A warm-up load task panicked or was cancelled
    #[error("Warm-up task aborted: {0}")]
    WarmupAborted(#[from] JoinError),

    /// Operation not allowed in the current phase
    #[error("Invalid streaming phase: expected {expected}, found {actual}")]
    InvalidPhase {
        /// Phase the operation requires
        expected: StreamPhase,
        /// Current phase
        actual: StreamPhase,
    },
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Streaming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Segments placed at start-up; distance eviction never goes below this
    pub window_size: usize,
    /// Hard cap on the active window (defaults to `window_size`)
    pub max_active_segments: Option<usize>,
    /// Look-ahead trigger: distance from the agent to the newest exit anchor
    pub activation_distance: f32,
    /// Trailing eviction distance along the agent's forward axis
    pub max_distance_behind: f32,
    /// Segments placed per look-ahead trigger
    pub activation_batch: usize,
    /// Expected pool capacity; must match the catalog size when set
    pub pool_capacity: Option<usize>,
    /// Where the first segment's entry anchor is placed
    pub origin: Vec3,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_active_segments: None,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            max_distance_behind: DEFAULT_MAX_DISTANCE_BEHIND,
            activation_batch: DEFAULT_ACTIVATION_BATCH,
            pool_capacity: None,
            origin: Vec3::ZERO,
        }
    }
}

impl StreamingConfig {
    /// Maximum number of active segments.
    #[must_use]
    pub fn window_cap(&self) -> usize {
        self.max_active_segments.unwrap_or(self.window_size)
    }

    /// Checks the configuration against a catalog size.
    pub fn validate(&self, catalog_len: usize) -> StreamResult<()> {
        if self.window_size == 0 {
            return Err(StreamError::InvalidConfig("window_size must be at least 1".into()));
        }
        if self.window_cap() < self.window_size {
            return Err(StreamError::InvalidConfig(format!(
                "max_active_segments ({}) is below window_size ({})",
                self.window_cap(),
                self.window_size
            )));
        }
        if self.activation_batch == 0 {
            return Err(StreamError::InvalidConfig(
                "activation_batch must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("activation_distance", self.activation_distance),
            ("max_distance_behind", self.max_distance_behind),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StreamError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if let Some(capacity) = self.pool_capacity {
            if capacity != catalog_len {
                return Err(StreamError::InvalidConfig(format!(
                    "pool_capacity ({capacity}) must equal the catalog size ({catalog_len})"
                )));
            }
        }
        Ok(())
    }
}

/// Lifecycle phase of a [`TrackStreamer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamPhase {
    /// Nothing instantiated
    Uninitialized,
    /// Catalog loading, or loaded and waiting for the initial window
    Warming,
    /// Streaming around the agent
    SteadyState,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Warming => "warming",
            Self::SteadyState => "steady-state",
        };
        f.write_str(name)
    }
}

/// Agent state sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSample {
    /// World position
    pub position: Point3,
    /// Normalized forward direction
    pub forward: Vec3,
}

impl AgentSample {
    /// Creates a sample, normalizing `forward`.
    #[must_use]
    pub fn new(position: Point3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
        }
    }
}

/// Source of agent samples, polled by the streamer.
pub trait AgentFeed {
    /// Returns the agent's current position and heading.
    fn sample(&self) -> AgentSample;
}

impl AgentFeed for AgentSample {
    fn sample(&self) -> AgentSample {
        *self
    }
}

/// Why a segment left the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// Window exceeded `max_active_segments` after an activation
    WindowCap,
    /// Segment fell more than `max_distance_behind` behind the agent
    DistanceBehind,
    /// Streamer shut down
    Shutdown,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WindowCap => "window cap",
            Self::DistanceBehind => "distance behind",
            Self::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Window transition, queued for collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEvent {
    /// Segment placed and made visible
    Activated {
        /// Segment ID
        id: SegmentId,
    },
    /// Segment hidden and returned to the pool
    Deactivated {
        /// Segment ID
        id: SegmentId,
        /// Cause
        reason: EvictionReason,
    },
}

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Segments placed by the look-ahead trigger
    pub activated: usize,
    /// Segments trimmed by the window cap
    pub trimmed: usize,
    /// Segments recycled for falling behind
    pub evicted: usize,
}

/// Streams a bounded window of pooled segments along the track.
pub struct TrackStreamer {
    /// Configuration
    config: StreamingConfig,
    /// Level catalog
    catalog: SegmentCatalog,
    /// Placed segments, oldest first
    active: VecDeque<Segment>,
    /// Idle segments
    pool: RingPool<Segment>,
    /// Where the next entry anchor lands
    next_placement: Point3,
    /// Lifecycle phase
    phase: StreamPhase,
    /// Undrained window transitions; the oldest are overwritten when full
    events: RingPool<SegmentEvent>,
}

impl TrackStreamer {
    /// Creates an uninitialized streamer for `catalog`.
    pub fn new(config: StreamingConfig, catalog: SegmentCatalog) -> StreamResult<Self> {
        let pool = RingPool::new(catalog.len())?;
        config.validate(catalog.len())?;
        // Room for a shutdown plus a full tick of activations, trims and evictions.
        let events = RingPool::new(2 * (catalog.len() + config.activation_batch))?;
        if config.window_size >= catalog.len() {
            warn!(
                "Window size {} leaves no spare segments in a catalog of {}; look-ahead will starve",
                config.window_size,
                catalog.len()
            );
        }
        Ok(Self {
            next_placement: config.origin,
            active: VecDeque::with_capacity(catalog.len()),
            config,
            catalog,
            pool,
            phase: StreamPhase::Uninitialized,
            events,
        })
    }

    /// Loads the catalog and places the initial window.
    pub async fn warm<L>(&mut self, loader: Arc<L>) -> StreamResult<()>
    where
        L: AssetLoader<SegmentBlueprint> + Send + Sync + 'static,
    {
        self.preload(loader).await?;
        self.start()
    }

    /// Materializes one idle instance per catalog entry.
    ///
    /// Loads run concurrently and must all succeed. On failure, or if this
    /// future is dropped, in-flight loads are aborted and the streamer stays
    /// uninitialized.
    pub async fn preload<L>(&mut self, loader: Arc<L>) -> StreamResult<()>
    where
        L: AssetLoader<SegmentBlueprint> + Send + Sync + 'static,
    {
        if self.phase != StreamPhase::Uninitialized {
            return Err(StreamError::InvalidPhase {
                expected: StreamPhase::Uninitialized,
                actual: self.phase,
            });
        }

        info!("Warming {} segment templates", self.catalog.len());
        let started = Instant::now();
        let guard = WarmingGuard::enter(&mut self.phase);
        let blueprints = load_all(self.catalog.keys(), loader).await?;
        guard.commit();

        for (key, blueprint) in self.catalog.keys().iter().zip(&blueprints) {
            let segment = Segment::from_blueprint(key.clone(), blueprint);
            debug!("Pooled segment {} from {key}", segment.id());
            self.pool.enqueue(segment);
        }
        info!(
            "Warmed {} segments in {:.1}ms",
            self.pool.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        self.check_closed_system();
        Ok(())
    }

    /// Places the initial window at the origin and enters steady state.
    pub fn start(&mut self) -> StreamResult<()> {
        if self.phase != StreamPhase::Warming {
            return Err(StreamError::InvalidPhase {
                expected: StreamPhase::Warming,
                actual: self.phase,
            });
        }
        self.next_placement = self.config.origin;
        for _ in 0..self.config.window_size {
            self.activate_next();
        }
        self.phase = StreamPhase::SteadyState;
        info!(
            "Streaming started with {} active, {} pooled",
            self.active.len(),
            self.pool.len()
        );
        Ok(())
    }

    /// Runs one streaming step against the agent's current state.
    ///
    /// Does nothing outside steady state.
    pub fn tick(&mut self, feed: &impl AgentFeed) -> TickReport {
        let mut report = TickReport::default();
        if self.phase != StreamPhase::SteadyState {
            return report;
        }

        let agent = feed.sample();
        let before = self.active.len();
        if self.look_ahead_triggered(&agent) {
            for _ in 0..self.config.activation_batch {
                if self.activate_next().is_some() {
                    report.activated += 1;
                }
            }
        }
        report.trimmed = before + report.activated - self.active.len();
        report.evicted = self.evict_distant(&agent);
        report
    }

    /// Places the next idle segment at the end of the track.
    ///
    /// Returns `None` without side effects when the pool is empty. Trims the
    /// oldest segments afterwards if the window exceeds its cap.
    pub fn activate_next(&mut self) -> Option<SegmentId> {
        if self.pool.is_empty() {
            debug!("No idle segment available, activation skipped");
            return None;
        }
        let mut segment = match self.pool.dequeue() {
            Ok(segment) => segment,
            Err(e) => {
                warn!("Pool dequeue failed: {e}");
                return None;
            },
        };

        segment.place_at_entry(self.next_placement);
        segment.set_active(true);
        self.next_placement = segment.exit_anchor();
        let id = segment.id();
        debug!(
            "Activated segment {id} ({}) at {:?}",
            segment.key(),
            segment.entry_anchor()
        );
        self.active.push_back(segment);
        self.push_event(SegmentEvent::Activated { id });

        while self.active.len() > self.config.window_cap() {
            if let Some(oldest) = self.active.pop_front() {
                self.recycle(oldest, EvictionReason::WindowCap);
            }
        }
        self.check_closed_system();
        Some(id)
    }

    /// Manually activates one segment (diagnostics and tests).
    pub fn force_activate(&mut self) -> Option<SegmentId> {
        let id = self.activate_next();
        if id.is_none() {
            warn!("Forced activation skipped: pool is empty");
        }
        id
    }

    /// Recycles segments that fell more than `max_distance_behind` behind the agent.
    ///
    /// Only the ends of the window are eligible, so the remaining segments
    /// stay chained. The window never shrinks below `window_size`.
    pub fn evict_distant(&mut self, agent: &AgentSample) -> usize {
        let mut evicted = 0;
        while self.active.len() > self.config.window_size
            && self.active.front().is_some_and(|s| self.is_far_behind(s, agent))
        {
            if let Some(segment) = self.active.pop_front() {
                self.recycle(segment, EvictionReason::DistanceBehind);
                evicted += 1;
            }
        }
        while self.active.len() > self.config.window_size
            && self.active.back().is_some_and(|s| self.is_far_behind(s, agent))
        {
            if let Some(segment) = self.active.pop_back() {
                self.recycle(segment, EvictionReason::DistanceBehind);
                evicted += 1;
            }
        }
        if evicted > 0 {
            // Placement continues from the newest survivor.
            if let Some(newest) = self.active.back() {
                self.next_placement = newest.exit_anchor();
            }
            self.check_closed_system();
        }
        evicted
    }

    /// Returns every segment to the pool, drops the pool and resets to uninitialized.
    pub fn shutdown(&mut self) {
        while let Some(segment) = self.active.pop_back() {
            self.recycle(segment, EvictionReason::Shutdown);
        }
        let released = self.pool.len();
        self.pool.clear();
        self.next_placement = self.config.origin;
        self.phase = StreamPhase::Uninitialized;
        info!("Streaming shut down, released {released} segments");
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Returns the number of active segments.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns the number of idle segments.
    #[must_use]
    pub const fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// Returns the catalog size.
    #[must_use]
    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    /// Returns where the next segment's entry anchor will be placed.
    #[must_use]
    pub const fn next_placement_point(&self) -> Point3 {
        self.next_placement
    }

    /// Iterates active segments, oldest first.
    pub fn active_segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.active.iter()
    }

    /// Iterates idle segments in the order they will be reused.
    pub fn pooled_segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.pool.iter()
    }

    /// Looks up an active segment.
    #[must_use]
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.active.iter().find(|segment| segment.id() == id)
    }

    /// Takes all queued window transitions, in order.
    ///
    /// The queue holds at most [`event_capacity`](Self::event_capacity)
    /// transitions; undrained ones are overwritten oldest first.
    pub fn drain_events(&mut self) -> Vec<SegmentEvent> {
        std::iter::from_fn(|| self.events.dequeue().ok()).collect()
    }

    /// Returns the number of undrained transitions.
    #[must_use]
    pub const fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Returns how many undrained transitions are kept.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.events.capacity()
    }

    fn look_ahead_triggered(&self, agent: &AgentSample) -> bool {
        self.active.back().is_some_and(|newest| {
            agent.position.distance(newest.exit_anchor()) <= self.config.activation_distance
        })
    }

    fn is_far_behind(&self, segment: &Segment, agent: &AgentSample) -> bool {
        distance_behind(agent.position, segment.origin(), agent.forward)
            > self.config.max_distance_behind
    }

    fn recycle(&mut self, mut segment: Segment, reason: EvictionReason) {
        debug_assert!(!self.pool.is_full(), "recycling into a full pool");
        segment.set_active(false);
        let id = segment.id();
        debug!("Recycled segment {id} ({reason})");
        self.pool.enqueue(segment);
        self.push_event(SegmentEvent::Deactivated { id, reason });
    }

    fn push_event(&mut self, event: SegmentEvent) {
        if self.events.is_full() {
            debug!("Event queue full, dropping oldest undrained transition");
        }
        self.events.enqueue(event);
    }

    fn check_closed_system(&self) {
        debug_assert_eq!(
            self.active.len() + self.pool.len(),
            self.catalog.len(),
            "segment instances leaked or duplicated"
        );
    }
}

impl fmt::Debug for TrackStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackStreamer")
            .field("phase", &self.phase)
            .field("active", &self.active.len())
            .field("pooled", &self.pool.len())
            .field("next_placement", &self.next_placement)
            .finish_non_exhaustive()
    }
}

/// Holds the phase at `Warming` and reverts it unless committed.
struct WarmingGuard<'a> {
    phase: &'a mut StreamPhase,
    committed: bool,
}

impl<'a> WarmingGuard<'a> {
    fn enter(phase: &'a mut StreamPhase) -> Self {
        *phase = StreamPhase::Warming;
        Self {
            phase,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for WarmingGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            *self.phase = StreamPhase::Uninitialized;
        }
    }
}

/// Loads every key concurrently; results are returned in key order.
async fn load_all<L>(keys: &[AssetKey], loader: Arc<L>) -> StreamResult<Vec<SegmentBlueprint>>
where
    L: AssetLoader<SegmentBlueprint> + Send + Sync + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, key) in keys.iter().cloned().enumerate() {
        let loader = Arc::clone(&loader);
        tasks.spawn(async move {
            let result = loader.load(&key).await;
            (index, key, result)
        });
    }

    let mut loaded: Vec<Option<SegmentBlueprint>> = vec![None; keys.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, key, result) = joined?;
        match result {
            Ok(blueprint) => {
                debug!("Loaded segment template {key}");
                loaded[index] = Some(blueprint);
            },
            Err(source) => {
                tasks.abort_all();
                return Err(StreamError::WarmupLoadFailure { key, source });
            },
        }
    }

    loaded
        .into_iter()
        .zip(keys)
        .map(|(blueprint, key)| {
            blueprint.ok_or_else(|| StreamError::WarmupLoadFailure {
                key: key.clone(),
                source: LoadError::NotFound { key: key.clone() },
            })
        })
        .collect()
}
