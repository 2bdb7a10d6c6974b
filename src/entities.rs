// entities.rs - Reads one entity's fields and decides whether it is a real unit.
//
// The entity table also holds projectiles, buildings being torn down,
// half-initialized objects and stale slots. A fixed set of sanity checks
// filters those out:
//   1. health / max health must look like real vitals
//   2. team must be a playing side (0/1 are unassigned/spectator)
//   3. a scene node must be attached
//   4. the node must have been placed somewhere other than the origin
// Mana is optional: a failed read zeroes it instead of rejecting the unit.

use crate::config::{Heuristics, Layout};
use crate::error::Result;
use crate::math::Vec3;
use crate::platform::MemoryReader;

/// One unit as seen during one refresh cycle. No identity across cycles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    pub position: Vec3,
    pub health: i32,
    pub max_health: i32,
    pub mana: f32,
    pub max_mana: f32,
    pub team: u8,
    pub is_hero: bool,
    pub is_ally: bool,
}

impl EntitySnapshot {
    /// health / max_health, clamped to [0, 1].
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    /// mana / max_mana, clamped to [0, 1]; 0 without a mana pool.
    pub fn mana_fraction(&self) -> f32 {
        if self.max_mana <= 0.0 {
            return 0.0;
        }
        (self.mana / self.max_mana).clamp(0.0, 1.0)
    }
}

/// Applies the layout and heuristics to raw entity memory.
#[derive(Clone, Copy, Debug)]
pub struct Classifier<'a> {
    layout: &'a Layout,
    heuristics: &'a Heuristics,
}

impl<'a> Classifier<'a> {
    pub fn new(layout: &'a Layout, heuristics: &'a Heuristics) -> Self {
        Self { layout, heuristics }
    }

    /// Snapshot of the entity at `entity`, or `None` if any mandatory read
    /// fails or any check rejects it. Never touches other entities.
    pub fn classify<R: MemoryReader>(&self, reader: &R, entity: usize, local_team: u8) -> Option<EntitySnapshot> {
        let l = self.layout;
        let at = |offset: usize| entity.wrapping_add(offset);

        let health = reader.read_i32(at(l.health)).ok()?;
        let max_health = reader.read_i32(at(l.max_health)).ok()?;
        if !self.plausible_health(health, max_health) {
            return None;
        }

        let team = reader.read_u8(at(l.team)).ok()?;
        if team < self.heuristics.min_team {
            return None;
        }

        let node = reader.read_ptr(at(l.scene_node)).ok()?;
        if node == 0 {
            return None;
        }

        let position = reader.read_vec3(node.wrapping_add(l.abs_origin)).ok()?;
        if position.is_zero() {
            return None;
        }

        let resources = || -> Result<(f32, f32)> {
            Ok((reader.read_f32(at(l.mana))?, reader.read_f32(at(l.max_mana))?))
        };
        let (mana, max_mana) = resources().unwrap_or((0.0, 0.0));

        Some(EntitySnapshot {
            position,
            health,
            max_health,
            mana,
            max_mana,
            team,
            is_hero: self.is_hero(max_health, max_mana),
            is_ally: team == local_team,
        })
    }

    /// Alive, with a positive max and no more than the tolerated overshoot.
    pub fn plausible_health(&self, health: i32, max_health: i32) -> bool {
        max_health > 0
            && health > 0
            && i64::from(health) <= i64::from(max_health) + i64::from(self.heuristics.health_tolerance)
    }

    /// Heroes are the only units with a mana pool and a large health pool.
    pub fn is_hero(&self, max_health: i32, max_mana: f32) -> bool {
        max_mana > 0.0 && max_health > self.heuristics.hero_min_max_health
    }
}
