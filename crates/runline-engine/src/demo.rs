//! Built-in demo level.
//!
//! Used when no level file is configured, so the runner works out of the box.

use glam::Vec3;
use runline_common::AssetKey;
use runline_world::{
    MemoryLoader, PropBlueprint, PropCatalog, PropKind, PropSlot, SegmentBlueprint, SegmentCatalog,
};

/// Segment keys of the demo level, in catalog order.
pub const DEMO_SEGMENTS: [&str; 6] = [
    "street_straight",
    "street_rise",
    "plaza",
    "street_dip",
    "bridge",
    "underpass",
];

fn slot(kind: PropKind, x: f32, z: f32) -> PropSlot {
    PropSlot::new(kind, Vec3::new(x, 0.0, z))
}

fn blueprint(key: &str) -> SegmentBlueprint {
    match key {
        "street_rise" => SegmentBlueprint::new(key, Vec3::ZERO, Vec3::new(0.0, 3.0, 28.0))
            .with_prop(slot(PropKind::Vegetation, -6.0, 8.0))
            .with_prop(slot(PropKind::Prop, 4.0, 20.0)),
        "plaza" => SegmentBlueprint::new(key, Vec3::new(0.0, 0.0, -2.0), Vec3::new(4.0, 0.0, 38.0))
            .with_prop(slot(PropKind::Building, -14.0, 10.0))
            .with_prop(slot(PropKind::Building, 16.0, 24.0))
            .with_prop(slot(PropKind::Prop, 2.0, 18.0)),
        "street_dip" => SegmentBlueprint::new(key, Vec3::ZERO, Vec3::new(0.0, -3.0, 28.0))
            .with_prop(slot(PropKind::RoadBlock, 2.5, 14.0)),
        "bridge" => SegmentBlueprint::straight(key, 45.0)
            .with_prop(slot(PropKind::Prop, -5.0, 5.0))
            .with_prop(slot(PropKind::Prop, 5.0, 40.0)),
        "underpass" => SegmentBlueprint::new(key, Vec3::ZERO, Vec3::new(-4.0, 0.0, 32.0))
            .with_prop(slot(PropKind::Building, 0.0, 16.0))
            .with_prop(slot(PropKind::Vegetation, 8.0, 28.0)),
        _ => SegmentBlueprint::straight(key, 30.0)
            .with_prop(slot(PropKind::Building, -12.0, 15.0))
            .with_prop(slot(PropKind::Vegetation, 7.0, 6.0))
            .with_prop(slot(PropKind::Vegetation, 7.0, 24.0)),
    }
}

/// Returns the demo level catalog.
#[must_use]
pub fn segment_catalog() -> SegmentCatalog {
    SegmentCatalog::new(DEMO_SEGMENTS.iter().map(|&key| AssetKey::from(key)).collect())
}

/// Returns an in-memory loader holding every demo segment.
#[must_use]
pub fn segment_loader() -> MemoryLoader<SegmentBlueprint> {
    DEMO_SEGMENTS
        .iter()
        .fold(MemoryLoader::new(), |loader, &key| loader.with(key, blueprint(key)))
}

/// Returns the demo prop catalog.
#[must_use]
pub fn prop_catalog() -> PropCatalog {
    PropCatalog {
        buildings: vec!["shop".into(), "apartment".into()],
        vegetation: vec!["oak".into(), "hedge".into()],
        road_blocks: vec!["barrier".into()],
        props: vec!["bench".into(), "lamp".into(), "bin".into()],
    }
}

/// Returns an in-memory loader holding every demo prop.
#[must_use]
pub fn prop_loader() -> MemoryLoader<PropBlueprint> {
    let named = |name: &str, extent: Option<Vec3>| PropBlueprint {
        name: name.to_string(),
        extent,
    };
    MemoryLoader::new()
        .with("shop", named("shop", None))
        .with("apartment", named("apartment", Some(Vec3::new(12.0, 24.0, 12.0))))
        .with("oak", named("oak", None))
        .with("hedge", named("hedge", Some(Vec3::new(4.0, 1.5, 1.0))))
        .with("barrier", named("barrier", None))
        .with("bench", named("bench", None))
        .with("lamp", named("lamp", Some(Vec3::new(0.5, 4.0, 0.5))))
        .with("bin", named("bin", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_assets_cover_catalogs() {
        let segments = segment_catalog();
        assert_eq!(segments.len(), DEMO_SEGMENTS.len());
        assert_eq!(segment_loader().len(), segments.len());

        let props = prop_catalog();
        assert_eq!(prop_loader().len(), props.len());
    }

    #[test]
    fn test_demo_segments_have_length() {
        for key in DEMO_SEGMENTS {
            let blueprint = blueprint(key);
            assert_eq!(blueprint.name, key);
            assert!(blueprint.entry.distance(blueprint.exit) > 20.0);
        }
    }
}
