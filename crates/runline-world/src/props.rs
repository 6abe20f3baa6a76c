//! Pooled set-dressing props.
//!
//! Segments carry prop slots (buildings, vegetation, road blocks, small
//! props). While a segment is active each slot is filled with a random
//! instance of its kind, drawn from per-asset pools that are warmed before
//! streaming starts. Props are returned when their segment is recycled or
//! when they fall far enough behind the agent.

use std::collections::HashMap;

use futures::future::try_join_all;
use glam::Vec3;
use runline_common::{distance_behind, AssetKey, LoadError, Point3, PropId, SegmentId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::loader::AssetLoader;
use crate::segment::Segment;
use crate::streaming::{AgentSample, SegmentEvent, TrackStreamer};

/// Default distance behind the agent at which props despawn.
pub const DEFAULT_DESPAWN_DISTANCE: f32 = 50.0;

/// Category of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    /// Roadside buildings
    Building,
    /// Trees and bushes
    Vegetation,
    /// Obstacles on the track
    RoadBlock,
    /// Small clutter
    Prop,
}

impl PropKind {
    /// All kinds, in warm-up order.
    pub const ALL: [Self; 4] = [Self::Building, Self::Vegetation, Self::RoadBlock, Self::Prop];

    /// Footprint used when a blueprint does not specify one.
    #[must_use]
    pub const fn default_extent(self) -> Vec3 {
        match self {
            Self::Building => Vec3::splat(10.0),
            Self::Vegetation => Vec3::splat(3.0),
            Self::RoadBlock => Vec3::splat(5.0),
            Self::Prop => Vec3::splat(2.0),
        }
    }
}

/// A place on a segment where a prop of some kind is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropSlot {
    /// Kind of prop to spawn
    pub kind: PropKind,
    /// Position relative to the segment origin
    #[serde(default)]
    pub offset: Vec3,
}

impl PropSlot {
    /// Creates a slot.
    #[must_use]
    pub const fn new(kind: PropKind, offset: Vec3) -> Self {
        Self { kind, offset }
    }
}

/// Resolved prop asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropBlueprint {
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Footprint; falls back to the kind's default
    #[serde(default)]
    pub extent: Option<Vec3>,
}

/// Prop asset keys per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropCatalog {
    /// Building keys
    pub buildings: Vec<AssetKey>,
    /// Vegetation keys
    pub vegetation: Vec<AssetKey>,
    /// Road block keys
    pub road_blocks: Vec<AssetKey>,
    /// Small prop keys
    pub props: Vec<AssetKey>,
}

impl PropCatalog {
    /// Returns the keys of one kind.
    #[must_use]
    pub fn keys(&self, kind: PropKind) -> &[AssetKey] {
        match kind {
            PropKind::Building => &self.buildings,
            PropKind::Vegetation => &self.vegetation,
            PropKind::RoadBlock => &self.road_blocks,
            PropKind::Prop => &self.props,
        }
    }

    /// Returns the total number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        PropKind::ALL.into_iter().map(|kind| self.keys(kind).len()).sum()
    }

    /// Returns true if no kind has any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Instances pre-created per asset key, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropWarmup {
    /// Per building key
    pub building: usize,
    /// Per vegetation key
    pub vegetation: usize,
    /// Per road block key
    pub road_block: usize,
    /// Per small prop key
    pub prop: usize,
}

impl Default for PropWarmup {
    fn default() -> Self {
        Self {
            building: 4,
            vegetation: 8,
            road_block: 4,
            prop: 8,
        }
    }
}

impl PropWarmup {
    /// Returns the warm-up count for a kind.
    #[must_use]
    pub const fn count(&self, kind: PropKind) -> usize {
        match kind {
            PropKind::Building => self.building,
            PropKind::Vegetation => self.vegetation,
            PropKind::RoadBlock => self.road_block,
            PropKind::Prop => self.prop,
        }
    }
}

/// A spawned prop.
#[derive(Debug, Clone, PartialEq)]
pub struct PropInstance {
    /// Instance ID
    id: PropId,
    /// Asset the instance came from
    key: AssetKey,
    /// Prop kind
    kind: PropKind,
    /// World position
    position: Point3,
    /// Footprint
    extent: Vec3,
}

impl PropInstance {
    /// Returns the instance ID.
    #[must_use]
    pub const fn id(&self) -> PropId {
        self.id
    }

    /// Returns the asset key.
    #[must_use]
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> PropKind {
        self.kind
    }

    /// Returns the world position.
    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position
    }

    /// Returns the footprint.
    #[must_use]
    pub const fn extent(&self) -> Vec3 {
        self.extent
    }
}

/// Idle instances of one prop asset. Grows when drained.
#[derive(Debug)]
struct PropPool {
    key: AssetKey,
    kind: PropKind,
    extent: Vec3,
    idle: Vec<PropInstance>,
    created: usize,
}

impl PropPool {
    fn new(key: AssetKey, kind: PropKind, blueprint: &PropBlueprint) -> Self {
        Self {
            key,
            kind,
            extent: blueprint.extent.unwrap_or_else(|| kind.default_extent()),
            idle: Vec::new(),
            created: 0,
        }
    }

    fn instantiate(&mut self) -> PropInstance {
        self.created += 1;
        PropInstance {
            id: PropId::next(),
            key: self.key.clone(),
            kind: self.kind,
            position: Point3::ZERO,
            extent: self.extent,
        }
    }

    fn prewarm(&mut self, count: usize) {
        for _ in 0..count {
            let instance = self.instantiate();
            self.idle.push(instance);
        }
    }

    fn take(&mut self) -> PropInstance {
        match self.idle.pop() {
            Some(instance) => instance,
            None => self.instantiate(),
        }
    }
}

/// Per-kind collection of prop pools.
#[derive(Debug, Default)]
pub struct PropPooler {
    /// Pools per kind
    pools: HashMap<PropKind, Vec<PropPool>>,
    /// Pool location by asset key
    index: HashMap<AssetKey, (PropKind, usize)>,
}

impl PropPooler {
    /// Loads every prop blueprint concurrently and pre-creates instances.
    ///
    /// All loads must succeed; the first failure is returned.
    pub async fn warm<L>(
        catalog: &PropCatalog,
        warmup: &PropWarmup,
        loader: &L,
    ) -> Result<Self, LoadError>
    where
        L: AssetLoader<PropBlueprint>,
    {
        info!("Warming {} prop pools", catalog.len());
        let loads = PropKind::ALL.into_iter().flat_map(|kind| {
            catalog.keys(kind).iter().map(move |key| async move {
                let blueprint = loader.load(key).await?;
                Ok::<_, LoadError>((kind, key.clone(), blueprint))
            })
        });
        let loaded = try_join_all(loads).await?;

        let mut pooler = Self::default();
        for (kind, key, blueprint) in loaded {
            let mut pool = PropPool::new(key.clone(), kind, &blueprint);
            pool.prewarm(warmup.count(kind));
            let pools = pooler.pools.entry(kind).or_default();
            pooler.index.insert(key, (kind, pools.len()));
            pools.push(pool);
        }
        info!("Prop pools warm: {} instances", pooler.idle_count());
        Ok(pooler)
    }

    /// Takes an instance from a random pool of `kind` and places it.
    ///
    /// Returns `None` if the catalog has no assets of that kind.
    pub fn spawn_random(
        &mut self,
        kind: PropKind,
        position: Point3,
        rng: &mut fastrand::Rng,
    ) -> Option<PropInstance> {
        let pools = self.pools.get_mut(&kind).filter(|pools| !pools.is_empty())?;
        let pick = rng.usize(..pools.len());
        let mut instance = pools[pick].take();
        instance.position = position;
        Some(instance)
    }

    /// Returns an instance to its pool.
    pub fn release(&mut self, instance: PropInstance) {
        match self.index.get(&instance.key) {
            Some(&(kind, slot)) => {
                if let Some(pool) = self.pools.get_mut(&kind).and_then(|pools| pools.get_mut(slot)) {
                    pool.idle.push(instance);
                }
            },
            None => warn!("Released prop {} from unknown asset {}", instance.id.raw(), instance.key),
        }
    }

    /// Returns the number of idle instances across all pools.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.pools.values().flatten().map(|pool| pool.idle.len()).sum()
    }

    /// Returns the number of instances ever created across all pools.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.pools.values().flatten().map(|pool| pool.created).sum()
    }

    /// Returns the number of pools of a kind.
    #[must_use]
    pub fn pool_count(&self, kind: PropKind) -> usize {
        self.pools.get(&kind).map_or(0, Vec::len)
    }
}

/// Fills the prop slots of active segments and recycles their props.
#[derive(Debug)]
pub struct PropSpawner {
    /// Distance behind the agent at which a prop despawns
    despawn_distance: f32,
    /// Pool selection
    rng: fastrand::Rng,
    /// Live props per owning segment
    placed: HashMap<SegmentId, Vec<PropInstance>>,
}

impl PropSpawner {
    /// Creates a spawner. A `seed` makes pool selection reproducible.
    #[must_use]
    pub fn new(despawn_distance: f32, seed: Option<u64>) -> Self {
        Self {
            despawn_distance,
            rng: seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
            placed: HashMap::new(),
        }
    }

    /// Applies drained streaming events in order.
    pub fn apply_events(
        &mut self,
        events: &[SegmentEvent],
        streamer: &TrackStreamer,
        pooler: &mut PropPooler,
    ) {
        for event in events {
            match *event {
                SegmentEvent::Activated { id } => {
                    if let Some(segment) = streamer.segment(id) {
                        self.segment_activated(segment, pooler);
                    }
                },
                SegmentEvent::Deactivated { id, .. } => {
                    self.segment_deactivated(id, pooler);
                },
            }
        }
    }

    /// Spawns props into every slot of `segment`.
    pub fn segment_activated(&mut self, segment: &Segment, pooler: &mut PropPooler) -> usize {
        let props: Vec<PropInstance> = segment
            .prop_slots()
            .iter()
            .filter_map(|slot| {
                pooler.spawn_random(slot.kind, segment.origin() + slot.offset, &mut self.rng)
            })
            .collect();
        // A segment reactivated before its old props were released keeps
        // only the new set.
        if let Some(stale) = self.placed.remove(&segment.id()) {
            for prop in stale {
                pooler.release(prop);
            }
        }
        let spawned = props.len();
        if spawned > 0 {
            debug!("Spawned {spawned} props on segment {}", segment.id());
            self.placed.insert(segment.id(), props);
        }
        spawned
    }

    /// Returns the props of a recycled segment to their pools.
    pub fn segment_deactivated(&mut self, id: SegmentId, pooler: &mut PropPooler) -> usize {
        let Some(props) = self.placed.remove(&id) else {
            return 0;
        };
        let released = props.len();
        for prop in props {
            pooler.release(prop);
        }
        released
    }

    /// Despawns props at or beyond `despawn_distance` behind the agent.
    pub fn despawn_behind(&mut self, agent: &AgentSample, pooler: &mut PropPooler) -> usize {
        let mut despawned = 0;
        for props in self.placed.values_mut() {
            let mut index = 0;
            while index < props.len() {
                let behind = distance_behind(agent.position, props[index].position, agent.forward);
                if behind >= self.despawn_distance {
                    pooler.release(props.swap_remove(index));
                    despawned += 1;
                } else {
                    index += 1;
                }
            }
        }
        self.placed.retain(|_, props| !props.is_empty());
        despawned
    }

    /// Returns every live prop to its pool.
    pub fn release_all(&mut self, pooler: &mut PropPooler) -> usize {
        let mut released = 0;
        for (_, props) in self.placed.drain() {
            released += props.len();
            for prop in props {
                pooler.release(prop);
            }
        }
        released
    }

    /// Returns the number of live props.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.placed.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SegmentBlueprint, SegmentCatalog};
    use crate::loader::MemoryLoader;
    use crate::streaming::StreamingConfig;
    use std::sync::Arc;

    fn prop_catalog() -> PropCatalog {
        PropCatalog {
            buildings: vec!["house".into(), "shop".into()],
            vegetation: vec!["tree".into()],
            road_blocks: vec!["barrier".into()],
            props: Vec::new(),
        }
    }

    fn prop_loader() -> MemoryLoader<PropBlueprint> {
        let blueprint = |name: &str| PropBlueprint {
            name: name.to_string(),
            extent: None,
        };
        MemoryLoader::new()
            .with("house", blueprint("house"))
            .with("shop", blueprint("shop"))
            .with("tree", PropBlueprint {
                name: "tree".into(),
                extent: Some(Vec3::new(1.0, 6.0, 1.0)),
            })
            .with("barrier", blueprint("barrier"))
    }

    fn warmup() -> PropWarmup {
        PropWarmup {
            building: 2,
            vegetation: 3,
            road_block: 1,
            prop: 5,
        }
    }

    async fn pooler() -> PropPooler {
        PropPooler::warm(&prop_catalog(), &warmup(), &prop_loader())
            .await
            .expect("warm failed")
    }

    #[tokio::test]
    async fn test_warm_prefills_pools() {
        let pooler = pooler().await;
        assert_eq!(pooler.pool_count(PropKind::Building), 2);
        assert_eq!(pooler.pool_count(PropKind::Prop), 0);
        // 2 buildings x 2 + 1 tree x 3 + 1 barrier x 1
        assert_eq!(pooler.idle_count(), 8);
        assert_eq!(pooler.created_count(), 8);
    }

    #[tokio::test]
    async fn test_warm_failure_propagates() {
        let mut catalog = prop_catalog();
        catalog.props.push("missing".into());
        let result = PropPooler::warm(&catalog, &warmup(), &prop_loader()).await;
        match result {
            Err(err) => assert_eq!(err.key().as_str(), "missing"),
            Ok(_) => panic!("expected load failure"),
        }
    }

    #[tokio::test]
    async fn test_spawn_and_release_reuse_instances() {
        let mut pooler = pooler().await;
        let mut rng = fastrand::Rng::with_seed(7);

        let tree = pooler
            .spawn_random(PropKind::Vegetation, Point3::new(3.0, 0.0, 9.0), &mut rng)
            .expect("tree");
        assert_eq!(tree.kind(), PropKind::Vegetation);
        assert_eq!(tree.extent(), Vec3::new(1.0, 6.0, 1.0));
        assert_eq!(tree.position(), Point3::new(3.0, 0.0, 9.0));
        assert_eq!(pooler.idle_count(), 7);

        pooler.release(tree);
        assert_eq!(pooler.idle_count(), 8);
        assert_eq!(pooler.created_count(), 8);

        assert!(pooler
            .spawn_random(PropKind::Prop, Point3::ZERO, &mut rng)
            .is_none());
    }

    #[tokio::test]
    async fn test_drained_pool_grows() {
        let mut pooler = pooler().await;
        let mut rng = fastrand::Rng::with_seed(1);
        let barriers: Vec<PropInstance> = (0..3)
            .filter_map(|_| pooler.spawn_random(PropKind::RoadBlock, Point3::ZERO, &mut rng))
            .collect();
        assert_eq!(barriers.len(), 3);
        assert_eq!(pooler.created_count(), 10);
        assert!(barriers.iter().all(|b| b.extent() == PropKind::RoadBlock.default_extent()));
    }

    #[tokio::test]
    async fn test_reactivation_releases_stale_props_when_nothing_spawns() {
        let mut pooler = pooler().await;
        let mut spawner = PropSpawner::new(DEFAULT_DESPAWN_DISTANCE, Some(5));
        // no small-prop pools exist, so this slot can never be filled
        let blueprint = SegmentBlueprint::straight("bare", 10.0)
            .with_prop(PropSlot::new(PropKind::Prop, Vec3::new(1.0, 0.0, 1.0)));
        let segment = Segment::from_blueprint("bare".into(), &blueprint);

        let mut rng = fastrand::Rng::with_seed(2);
        let leftover = pooler
            .spawn_random(PropKind::Vegetation, Point3::ZERO, &mut rng)
            .expect("tree");
        spawner.placed.insert(segment.id(), vec![leftover]);
        assert_eq!(pooler.idle_count(), 7);

        assert_eq!(spawner.segment_activated(&segment, &mut pooler), 0);
        assert_eq!(spawner.live_count(), 0);
        assert_eq!(pooler.idle_count(), 8);
    }

    #[tokio::test]
    async fn test_spawner_follows_streaming_events() {
        let mut pooler = pooler().await;
        let blueprint = SegmentBlueprint::straight("street", 10.0)
            .with_prop(PropSlot::new(PropKind::Building, Vec3::new(6.0, 0.0, 5.0)))
            .with_prop(PropSlot::new(PropKind::Vegetation, Vec3::new(-4.0, 0.0, 2.0)));
        let segment_loader = MemoryLoader::new()
            .with("a", blueprint.clone())
            .with("b", blueprint.clone())
            .with("c", blueprint);
        let catalog = SegmentCatalog::new(vec!["a".into(), "b".into(), "c".into()]);
        let mut streamer = TrackStreamer::new(StreamingConfig::default(), catalog).expect("streamer");
        streamer.warm(Arc::new(segment_loader)).await.expect("warm failed");

        let mut spawner = PropSpawner::new(DEFAULT_DESPAWN_DISTANCE, Some(3));
        let events = streamer.drain_events();
        spawner.apply_events(&events, &streamer, &mut pooler);
        assert_eq!(spawner.live_count(), 4);

        let first = streamer.active_segments().next().expect("segment");
        let building = spawner.placed[&first.id()]
            .iter()
            .find(|p| p.kind() == PropKind::Building)
            .expect("building");
        assert_eq!(building.position(), first.origin() + Vec3::new(6.0, 0.0, 5.0));

        // look-ahead cycles both segments out
        streamer.tick(&AgentSample::new(Point3::new(0.0, 0.0, 5.0), Vec3::Z));
        let events = streamer.drain_events();
        spawner.apply_events(&events, &streamer, &mut pooler);
        assert_eq!(spawner.live_count(), 4);
        assert_eq!(pooler.created_count() - pooler.idle_count(), 4);

        assert_eq!(spawner.release_all(&mut pooler), 4);
        assert_eq!(pooler.idle_count(), pooler.created_count());
    }

    #[tokio::test]
    async fn test_props_despawn_behind_agent() {
        let mut pooler = pooler().await;
        let blueprint = SegmentBlueprint::straight("s", 10.0)
            .with_prop(PropSlot::new(PropKind::RoadBlock, Vec3::ZERO))
            .with_prop(PropSlot::new(PropKind::Building, Vec3::new(0.0, 0.0, 80.0)));
        let segment = Segment::from_blueprint("s".into(), &blueprint);

        let mut spawner = PropSpawner::new(50.0, Some(11));
        assert_eq!(spawner.segment_activated(&segment, &mut pooler), 2);

        let agent = AgentSample::new(Point3::new(0.0, 0.0, 50.0), Vec3::Z);
        assert_eq!(spawner.despawn_behind(&agent, &mut pooler), 1);
        assert_eq!(spawner.live_count(), 1);

        assert_eq!(spawner.segment_deactivated(segment.id(), &mut pooler), 1);
        assert_eq!(spawner.live_count(), 0);
        assert_eq!(pooler.idle_count(), pooler.created_count());
    }
}
