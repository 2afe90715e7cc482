//! Wall segment map
//!
//! Static per-match geometry. Loaded once from a map key and read-only for the
//! rest of the match.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::segment::WallSegment;
use crate::consts::MIN_SEGMENT_LENGTH;
use crate::error::MapLoadError;

pub const MAP1_KEY: &str = "map1";
pub const MAP2_KEY: &str = "map2";

/// Raw map geometry as delivered by a map source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    /// Walls as `[x1, y1, x2, y2]`
    pub walls: Vec<[f32; 4]>,
    pub hunter_spawn: [f32; 2],
    #[serde(default)]
    pub hidden_spawns: Vec<[f32; 2]>,
}

/// Something that can resolve a map key to geometry
pub trait MapSource {
    fn load(&self, key: &str) -> Result<MapData, MapLoadError>;
}

/// Maps compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMaps;

impl MapSource for BuiltinMaps {
    fn load(&self, key: &str) -> Result<MapData, MapLoadError> {
        match key {
            MAP1_KEY => Ok(map1()),
            MAP2_KEY => Ok(map2()),
            _ => Err(MapLoadError::UnknownMap(key.to_string())),
        }
    }
}

/// Maps parsed from a JSON object keyed by map key
#[derive(Debug, Clone, Default)]
pub struct JsonMaps {
    maps: HashMap<String, MapData>,
}

impl JsonMaps {
    pub fn from_json(json: &str) -> Result<Self, MapLoadError> {
        let maps = serde_json::from_str(json).map_err(|e| MapLoadError::Parse(e.to_string()))?;
        Ok(Self { maps })
    }
}

impl MapSource for JsonMaps {
    fn load(&self, key: &str) -> Result<MapData, MapLoadError> {
        self.maps
            .get(key)
            .cloned()
            .ok_or_else(|| MapLoadError::UnknownMap(key.to_string()))
    }
}

/// Validated wall geometry for one match
#[derive(Debug, Clone)]
pub struct SegmentMap {
    key: String,
    segments: Vec<WallSegment>,
    hunter_spawn: Vec2,
    hidden_spawns: Vec<Vec2>,
    bounds_min: Vec2,
    bounds_max: Vec2,
}

impl SegmentMap {
    /// Load and validate the map registered under `key`
    pub fn load(source: &dyn MapSource, key: &str) -> Result<Self, MapLoadError> {
        let data = source.load(key)?;
        Self::from_data(key, data)
    }

    pub fn from_data(key: &str, data: MapData) -> Result<Self, MapLoadError> {
        if data.walls.is_empty() {
            return Err(MapLoadError::Empty(key.to_string()));
        }

        let mut segments = Vec::with_capacity(data.walls.len());
        for (index, [x1, y1, x2, y2]) in data.walls.iter().copied().enumerate() {
            let segment = WallSegment::new(Vec2::new(x1, y1), Vec2::new(x2, y2));
            if !segment.is_finite() {
                return Err(MapLoadError::NonFinite {
                    map: key.to_string(),
                    index,
                });
            }
            if segment.length() < MIN_SEGMENT_LENGTH {
                return Err(MapLoadError::DegenerateSegment {
                    map: key.to_string(),
                    index,
                });
            }
            segments.push(segment);
        }

        let (bounds_min, bounds_max) = segments.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(lo, hi), s| (lo.min(s.a).min(s.b), hi.max(s.a).max(s.b)),
        );

        let hunter_spawn = Vec2::from(data.hunter_spawn);
        let hidden_spawns = data.hidden_spawns.iter().copied().map(Vec2::from).collect();

        log::info!("Loaded map `{}` with {} wall segments", key, segments.len());

        Ok(Self {
            key: key.to_string(),
            segments,
            hunter_spawn,
            hidden_spawns,
            bounds_min,
            bounds_max,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn segments(&self) -> &[WallSegment] {
        &self.segments
    }

    pub fn hunter_spawn(&self) -> Vec2 {
        self.hunter_spawn
    }

    /// Hidden spawns; falls back to the hunter spawn when the map lists none
    pub fn hidden_spawns(&self) -> &[Vec2] {
        if self.hidden_spawns.is_empty() {
            std::slice::from_ref(&self.hunter_spawn)
        } else {
            &self.hidden_spawns
        }
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.bounds_min, self.bounds_max)
    }

    /// Largest radius a wave can usefully reach: the diagonal of the map bounds
    pub fn max_radius(&self) -> f32 {
        self.bounds_min.distance(self.bounds_max)
    }

    /// Distance to the nearest wall along a ray, limited to `max_radius`
    pub fn first_intersection(&self, origin: Vec2, dir: Vec2, max_radius: f32) -> Option<f32> {
        self.segments
            .iter()
            .filter_map(|s| s.ray_hit(origin, dir))
            .filter(|&t| t <= max_radius)
            .min_by(f32::total_cmp)
    }

    /// True if a wall blocks the straight line from `origin` to `target`
    pub fn intersects(&self, origin: Vec2, target: Vec2) -> bool {
        let delta = target - origin;
        let dist = delta.length();
        if dist <= f32::EPSILON {
            return false;
        }
        self.first_intersection(origin, delta / dist, dist).is_some()
    }
}

fn rect(min: [f32; 2], max: [f32; 2]) -> [[f32; 4]; 4] {
    let [x0, y0] = min;
    let [x1, y1] = max;
    [
        [x0, y0, x1, y0],
        [x1, y0, x1, y1],
        [x1, y1, x0, y1],
        [x0, y1, x0, y0],
    ]
}

fn map1() -> MapData {
    let mut walls = rect([0.0, 0.0], [1920.0, 1080.0]).to_vec();
    walls.extend_from_slice(&[
        [400.0, 0.0, 400.0, 700.0],
        [800.0, 380.0, 800.0, 1080.0],
        [1200.0, 0.0, 1200.0, 600.0],
        [1200.0, 600.0, 1500.0, 600.0],
        [1500.0, 850.0, 1920.0, 850.0],
    ]);
    walls.extend_from_slice(&rect([950.0, 760.0], [1050.0, 860.0]));
    MapData {
        walls,
        hunter_spawn: [1700.0, 300.0],
        hidden_spawns: vec![[150.0, 150.0], [600.0, 900.0], [1000.0, 200.0]],
    }
}

fn map2() -> MapData {
    let mut walls = rect([0.0, 0.0], [1600.0, 1600.0]).to_vec();
    walls.extend_from_slice(&rect([600.0, 600.0], [1000.0, 1000.0]));
    walls.extend_from_slice(&[
        [300.0, 300.0, 300.0, 1300.0],
        [1300.0, 300.0, 1300.0, 1300.0],
        [300.0, 1300.0, 700.0, 1300.0],
        [900.0, 300.0, 1300.0, 300.0],
    ]);
    MapData {
        walls,
        hunter_spawn: [800.0, 150.0],
        hidden_spawns: vec![[150.0, 1450.0], [1450.0, 1450.0], [450.0, 800.0]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_wall() -> SegmentMap {
        SegmentMap::from_data(
            "test",
            MapData {
                walls: vec![[10.0, -50.0, 10.0, 50.0]],
                hunter_spawn: [0.0, 0.0],
                hidden_spawns: vec![],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_load_builtin_maps() {
        for key in [MAP1_KEY, MAP2_KEY] {
            let map = SegmentMap::load(&BuiltinMaps, key).unwrap();
            assert_eq!(map.key(), key);
            assert!(!map.segments().is_empty());
            assert!(map.max_radius() > 1000.0);
        }
    }

    #[test]
    fn test_unknown_key() {
        let err = SegmentMap::load(&BuiltinMaps, "nowhere").unwrap_err();
        assert_eq!(err, MapLoadError::UnknownMap("nowhere".into()));
    }

    #[test]
    fn test_degenerate_segment_rejected() {
        let data = MapData {
            walls: vec![[0.0, 0.0, 10.0, 0.0], [5.0, 5.0, 5.0, 5.0]],
            hunter_spawn: [0.0, 0.0],
            hidden_spawns: vec![],
        };
        let err = SegmentMap::from_data("bad", data).unwrap_err();
        assert_eq!(
            err,
            MapLoadError::DegenerateSegment {
                map: "bad".into(),
                index: 1
            }
        );
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        let empty = MapData {
            walls: vec![],
            hunter_spawn: [0.0, 0.0],
            hidden_spawns: vec![],
        };
        assert!(matches!(
            SegmentMap::from_data("e", empty),
            Err(MapLoadError::Empty(_))
        ));

        let nan = MapData {
            walls: vec![[0.0, 0.0, f32::NAN, 1.0]],
            hunter_spawn: [0.0, 0.0],
            hidden_spawns: vec![],
        };
        assert!(matches!(
            SegmentMap::from_data("n", nan),
            Err(MapLoadError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn test_json_maps() {
        let json = r#"{"arena": {"walls": [[0,0,100,0]], "hunter_spawn": [50, 50]}}"#;
        let maps = JsonMaps::from_json(json).unwrap();
        let map = SegmentMap::load(&maps, "arena").unwrap();
        assert_eq!(map.segments().len(), 1);
        assert_eq!(map.hidden_spawns(), &[Vec2::new(50.0, 50.0)]);
        assert!(matches!(
            JsonMaps::from_json("{not json"),
            Err(MapLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_intersects() {
        let map = single_wall();
        assert!(map.intersects(Vec2::ZERO, Vec2::new(20.0, 0.0)));
        assert!(!map.intersects(Vec2::ZERO, Vec2::new(5.0, 0.0)));
        assert!(!map.intersects(Vec2::ZERO, Vec2::new(20.0, 200.0)));
    }

    #[test]
    fn test_first_intersection_respects_max_radius() {
        let map = single_wall();
        let hit = map.first_intersection(Vec2::ZERO, Vec2::X, 100.0);
        assert!((hit.unwrap() - 10.0).abs() < 1e-4);
        assert!(map.first_intersection(Vec2::ZERO, Vec2::X, 5.0).is_none());
    }
}
