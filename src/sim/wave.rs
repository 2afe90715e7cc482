//! Wave expansion engine
//!
//! Every burst spawns an expanding probe: a circle of rays sampled at a fixed
//! angular step, growing from the burst origin until it is too old or larger
//! than the map. Each ray stops at the first wall it meets. A target is
//! detected when one of these clipped rays passes within a tolerance of it.

use std::collections::BTreeSet;
use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::map::SegmentMap;
use super::segment::distance_to_segment;
use crate::PeerId;
use crate::settings::WaveSettings;

/// Identity of the player that triggered a burst
pub type EmitterId = PeerId;

/// What the network carries about a burst
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeDescriptor {
    pub emitter: EmitterId,
    pub origin: Vec2,
}

/// One expanding detection pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandingProbe {
    pub id: u32,
    pub emitter: EmitterId,
    pub origin: Vec2,
    radius: f32,
    age: f32,
    rays: usize,
}

impl ExpandingProbe {
    fn new(id: u32, desc: ProbeDescriptor, rays: usize) -> Self {
        Self {
            id,
            emitter: desc.emitter,
            origin: desc.origin,
            radius: 0.0,
            age: 0.0,
            rays: rays.max(1),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn ray_count(&self) -> usize {
        self.rays
    }

    pub fn is_valid(&self, max_lifetime: f32, max_radius: f32) -> bool {
        self.age <= max_lifetime && self.radius <= max_radius
    }

    /// Unit direction of ray `index`
    pub fn ray_direction(&self, index: usize) -> Vec2 {
        Vec2::from_angle(index as f32 * TAU / self.rays as f32)
    }

    /// How far ray `index` currently reaches before a wall stops it
    pub fn ray_reach(&self, map: &SegmentMap, index: usize) -> f32 {
        map.first_intersection(self.origin, self.ray_direction(index), self.radius)
            .unwrap_or(self.radius)
    }

    /// End points of every clipped ray (for rendering the wave)
    pub fn ray_ends(&self, map: &SegmentMap) -> Vec<Vec2> {
        (0..self.rays)
            .map(|i| self.origin + self.ray_direction(i) * self.ray_reach(map, i))
            .collect()
    }

    /// Whether any clipped ray passes within `tolerance` of `target`
    pub fn reaches(&self, map: &SegmentMap, target: Vec2, tolerance: f32) -> bool {
        let to_target = target - self.origin;
        let dist = to_target.length();
        if dist - tolerance > self.radius {
            return false;
        }
        if map.intersects(self.origin, target) {
            return false;
        }
        if dist <= tolerance {
            return true;
        }

        // Only rays whose direction is within `window` of the target can pass
        // within tolerance of it
        let step = TAU / self.rays as f32;
        let theta = to_target.y.atan2(to_target.x);
        let window = (tolerance / dist).min(1.0).asin();
        let lo = ((theta - window) / step).floor() as i64;
        let hi = ((theta + window) / step).ceil() as i64;
        let hi = hi.min(lo + self.rays as i64 - 1);

        (lo..=hi).any(|k| {
            let index = k.rem_euclid(self.rays as i64) as usize;
            let end = self.origin + self.ray_direction(index) * self.ray_reach(map, index);
            distance_to_segment(target, self.origin, end) <= tolerance
        })
    }
}

/// Owns every active probe of the match
#[derive(Debug, Clone)]
pub struct WaveEngine {
    settings: WaveSettings,
    max_radius: f32,
    probes: Vec<ExpandingProbe>,
    next_id: u32,
    burst_clock: f32,
}

impl WaveEngine {
    pub fn new(settings: WaveSettings, max_radius: f32) -> Self {
        Self {
            settings,
            max_radius,
            probes: Vec::new(),
            next_id: 1,
            burst_clock: 0.0,
        }
    }

    pub fn settings(&self) -> &WaveSettings {
        &self.settings
    }

    pub fn probes(&self) -> &[ExpandingProbe] {
        &self.probes
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Grow every probe and age it by `dt`
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let growth = self.settings.speed * dt;
        for probe in &mut self.probes {
            probe.radius += growth;
            probe.age += dt;
        }
    }

    /// Drop probes that are too old or have outgrown the map.
    ///
    /// Must run every tick, otherwise the active set grows without bound.
    pub fn prune(&mut self) -> usize {
        let before = self.probes.len();
        let (max_lifetime, max_radius) = (self.settings.max_lifetime, self.max_radius);
        self.probes.retain(|p| p.is_valid(max_lifetime, max_radius));
        before - self.probes.len()
    }

    fn spawn(&mut self, desc: ProbeDescriptor) {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.probes
            .push(ExpandingProbe::new(id, desc, self.settings.ray_count()));
    }

    /// Start a burst at the local player's position
    pub fn spawn_local(&mut self, emitter: EmitterId, origin: Vec2) -> ProbeDescriptor {
        let desc = ProbeDescriptor { emitter, origin };
        self.spawn(desc);
        desc
    }

    /// Start a burst reported by another player
    pub fn ingest_remote(&mut self, desc: ProbeDescriptor) {
        self.spawn(desc);
    }

    /// Advance the timed-burst clock, true when a local burst is due
    pub fn burst_due(&mut self, dt: f32) -> bool {
        self.burst_clock += dt.max(0.0);
        if self.burst_clock >= self.settings.burst_interval {
            self.burst_clock -= self.settings.burst_interval;
            true
        } else {
            false
        }
    }

    /// Emitters whose probes currently reach `observer`
    pub fn query_detection(&self, map: &SegmentMap, observer: Vec2) -> BTreeSet<EmitterId> {
        let (max_lifetime, max_radius) = (self.settings.max_lifetime, self.max_radius);
        self.probes
            .iter()
            .filter(|p| p.is_valid(max_lifetime, max_radius))
            .filter(|p| p.reaches(map, observer, self.settings.detection_tolerance))
            .map(|p| p.emitter)
            .collect()
    }

    /// Stop every probe and reset the burst clock
    pub fn clear(&mut self) {
        self.probes.clear();
        self.burst_clock = 0.0;
    }
}
