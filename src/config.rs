// config.rs - Memory layout contract and tunables, loadable from TOML.
//
// Every offset here is specific to one build of the target and is expected to
// move between patches, so none of them is baked into the walker or the
// classifier. The defaults are the layout the overlay was calibrated against.
//
// Example file (any key may be omitted):
//
//     process_name = "dota2.exe"
//     poll_interval_ms = 50
//
//     [layout]
//     entity_list = 0x5EE3018
//     health = 0x354
//
//     [heuristics]
//     health_tolerance = 1000

use crate::error::Result;
use crate::projection::Viewport;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================
// Layout Offsets
// ============================================================

/// Byte offsets that define where the target keeps its entity table,
/// camera and per-entity fields.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    /// module + this = pointer to the chunk-pointer table.
    pub entity_list: usize,
    /// module + this = pointer to the local viewer control structure.
    pub local_players: usize,
    /// module + this = 12 consecutive f32 camera coefficients.
    pub view_matrix: usize,

    pub health: usize,     // i32
    pub max_health: usize, // i32
    pub team: usize,       // u8
    pub scene_node: usize, // pointer
    pub abs_origin: usize, // node-relative, 3 x f32
    pub mana: usize,       // f32
    pub max_mana: usize,   // f32

    /// Controller-relative handle of the entity the viewer controls (u32).
    pub assigned_entity: usize,
    /// Distance between consecutive slots inside one chunk.
    pub slot_stride: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            entity_list: 0x5EE_3018,
            local_players: 0x60F_DC68,
            view_matrix: 0x611_32D0,
            health: 0x354,
            max_health: 0x350,
            team: 0x3F3,
            scene_node: 0x338,
            abs_origin: 0xD0,
            mana: 0xCBC,
            max_mana: 0xCC0,
            assigned_entity: 0x90C,
            slot_stride: 112,
        }
    }
}

// ============================================================
// Classification Heuristics
// ============================================================

/// Calibration constants used to reject garbage reads and to tell heroes apart.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Heuristics {
    /// Accepted overshoot of health above max health.
    pub health_tolerance: i32,
    /// Max health a unit must exceed (together with a mana pool) to be a hero.
    pub hero_min_max_health: i32,
    /// Lowest team id that belongs to a playing side.
    pub min_team: u8,
    /// Highest slot index visited by enumeration (index 0 is never used).
    pub max_entity_index: u32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            health_tolerance: 1000,
            hero_min_max_health: 400,
            min_team: 2,
            max_entity_index: 2047,
        }
    }
}

// ============================================================
// Session Configuration
// ============================================================

/// Everything a session needs besides the live process.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Executable name of the target.
    pub process_name: String,
    /// Module whose base the layout offsets are relative to.
    pub module_name: String,
    /// Delay between refresh cycles.
    pub poll_interval_ms: u64,
    /// Window titles tried, in order, when looking up the game viewport.
    pub window_titles: Vec<String>,
    /// Viewport used when no game window can be found.
    pub fallback_viewport: Viewport,
    pub layout: Layout,
    pub heuristics: Heuristics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_name: "dota2.exe".to_string(),
            module_name: "client.dll".to_string(),
            poll_interval_ms: 50,
            window_titles: vec!["Dota 2".to_string(), "DOTA 2".to_string()],
            fallback_viewport: Viewport::new(0, 0, 1920, 1080),
            layout: Layout::default(),
            heuristics: Heuristics::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
