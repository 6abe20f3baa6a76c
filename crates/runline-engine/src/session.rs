//! A single run: warm-up, per-tick streaming and teardown.

use std::sync::Arc;

use runline_common::LoadError;
use runline_world::{
    AgentFeed, AssetLoader, PropBlueprint, PropPooler, PropSpawner, SegmentBlueprint,
    SegmentCatalog, StreamError, StreamPhase, TickReport, TrackStreamer,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::agent::RunnerAgent;
use crate::config::EngineConfig;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Segment streaming failed
    #[error("Streaming error: {0}")]
    Stream(#[from] StreamError),

    /// A prop asset failed to load
    #[error("Prop warm-up failed: {0}")]
    Props(#[source] LoadError),
}

/// Counters accumulated over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    /// Ticks run
    pub ticks: u64,
    /// Segments placed by look-ahead
    pub activated: usize,
    /// Segments recycled for exceeding the window cap
    pub trimmed: usize,
    /// Segments recycled for falling behind
    pub evicted: usize,
    /// Props recycled for falling behind
    pub props_despawned: usize,
    /// Most props live at once
    pub peak_props: usize,
}

impl SessionStats {
    fn record(&mut self, report: TickReport, props_despawned: usize, live_props: usize) {
        self.ticks += 1;
        self.activated += report.activated;
        self.trimmed += report.trimmed;
        self.evicted += report.evicted;
        self.props_despawned += props_despawned;
        self.peak_props = self.peak_props.max(live_props);
    }
}

/// Final report of an ended session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    /// Accumulated counters
    pub stats: SessionStats,
    /// Distance the agent covered
    pub distance: f32,
    /// Prop instances created, including warm-up
    pub props_created: usize,
}

/// A running session.
#[derive(Debug)]
pub struct Session {
    streamer: TrackStreamer,
    pooler: PropPooler,
    spawner: PropSpawner,
    agent: RunnerAgent,
    stats: SessionStats,
}

impl Session {
    /// Warms props, then segments, and places the initial window.
    ///
    /// Dropping the returned future cancels any loads still in flight.
    pub async fn start<SL, PL>(
        config: &EngineConfig,
        catalog: SegmentCatalog,
        segments: Arc<SL>,
        props: &PL,
    ) -> Result<Self, SessionError>
    where
        SL: AssetLoader<SegmentBlueprint> + Send + Sync + 'static,
        PL: AssetLoader<PropBlueprint>,
    {
        let mut streamer = TrackStreamer::new(config.streaming.clone(), catalog)?;

        let pooler = if config.props.enabled {
            PropPooler::warm(&config.props.catalog, &config.props.warmup, props)
                .await
                .map_err(SessionError::Props)?
        } else {
            info!("Props disabled");
            PropPooler::default()
        };

        streamer.warm(segments).await?;

        let mut session = Self {
            streamer,
            pooler,
            spawner: PropSpawner::new(config.props.despawn_distance, config.props.seed),
            agent: RunnerAgent::new(config.agent_start, config.agent_forward, config.agent_speed),
            stats: SessionStats::default(),
        };
        session.sync_props();
        info!(
            "Session started: {} segments active, {} props live, agent heading {:?} at {:.1} u/s",
            session.streamer.active_count(),
            session.spawner.live_count(),
            session.agent.forward(),
            session.agent.speed()
        );
        Ok(session)
    }

    /// Advances the agent by `dt` seconds and runs one streaming step.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        self.agent.advance(dt);
        let report = self.streamer.tick(&self.agent);
        self.sync_props();
        let despawned = self
            .spawner
            .despawn_behind(&self.agent.sample(), &mut self.pooler);
        self.stats
            .record(report, despawned, self.spawner.live_count());
        if report != TickReport::default() {
            debug!(
                "Tick {}: +{} segments, -{} trimmed, -{} behind",
                self.stats.ticks, report.activated, report.trimmed, report.evicted
            );
        }
        report
    }

    /// Shuts streaming down and returns every prop to its pool.
    pub fn end(mut self) -> SessionSummary {
        self.streamer.shutdown();
        self.sync_props();
        let released = self.spawner.release_all(&mut self.pooler);
        info!(
            "Session ended after {} ticks, {:.1} units, released {released} props",
            self.stats.ticks,
            self.agent.travelled()
        );
        SessionSummary {
            stats: self.stats,
            distance: self.agent.travelled(),
            props_created: self.pooler.created_count(),
        }
    }

    /// Returns the streamer.
    #[must_use]
    pub const fn streamer(&self) -> &TrackStreamer {
        &self.streamer
    }

    /// Returns the agent.
    #[must_use]
    pub const fn agent(&self) -> &RunnerAgent {
        &self.agent
    }

    /// Returns the counters so far.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Returns the number of live props.
    #[must_use]
    pub fn live_props(&self) -> usize {
        self.spawner.live_count()
    }

    /// Returns the number of idle props.
    #[must_use]
    pub fn idle_props(&self) -> usize {
        self.pooler.idle_count()
    }

    /// Returns whether streaming is running.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streamer.phase() == StreamPhase::SteadyState
    }

    fn sync_props(&mut self) {
        let events = self.streamer.drain_events();
        self.spawner
            .apply_events(&events, &self.streamer, &mut self.pooler);
    }
}
