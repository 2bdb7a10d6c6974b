// overlay.rs - Turns a Frame into screen-space marker geometry.
//
// Painting is left to whatever renderer consumes the markers. This module
// only decides where things go:
//   - a health bar 30 px above the unit's projected position
//   - a mana bar right below it (heroes with a mana pool only)
//   - "health/max" above the bars and the unit's world X/Y below them
// Units that do not project, or that land outside the drawing surface, are
// culled.

use crate::entities::EntitySnapshot;
use crate::projection::{ViewTransform, Viewport};
use crate::scanner::Frame;

// ============================================================
// Configuration Constants
// ============================================================

const HERO_BAR: (i32, i32) = (60, 6);  // width, height
const UNIT_BAR: (i32, i32) = (40, 4);
const BAR_LIFT: i32 = 30;              // bar top sits this far above the unit
const BAR_GAP: i32 = 2;                // between health and mana bars
const LABEL_LIFT: i32 = 3;             // health text baseline above the bar
const HERO_COORD_DROP: i32 = 14;
const UNIT_COORD_DROP: i32 = 8;

// ============================================================
// Colors
// ============================================================

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

pub const ALLY: Rgba = Rgba(0, 255, 100, 255);
pub const ENEMY: Rgba = Rgba(255, 60, 60, 255);
pub const BAR_BACKGROUND: Rgba = Rgba(30, 30, 30, 180);
pub const MANA: Rgba = Rgba(80, 150, 255, 255);
pub const TEXT: Rgba = Rgba(255, 255, 255, 255);
pub const COORD_TEXT: Rgba = Rgba(200, 200, 200, 255);
pub const SHADOW: Rgba = Rgba(0, 0, 0, 255);

// ============================================================
// Marker Geometry
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// A filled bar: background one pixel larger on every side, then the fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bar {
    pub background: Rect,
    pub fill: Rect,
    pub color: Rgba,
}

impl Bar {
    fn new(x: i32, y: i32, (w, h): (i32, i32), fraction: f32, color: Rgba) -> Self {
        Self {
            background: Rect { x: x - 1, y: y - 1, w: w + 2, h: h + 2 },
            fill: Rect { x, y, w: (w as f32 * fraction) as i32, h },
            color,
        }
    }
}

/// Text drawn at `(x, y)` over a copy in `shadow` at `(x + 1, y + 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub color: Rgba,
    pub shadow: Rgba,
}

/// Everything drawn for one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    /// Projected unit position.
    pub anchor: (i32, i32),
    pub health: Bar,
    pub mana: Option<Bar>,
    pub health_label: Label,
    pub coord_label: Label,
}

impl Marker {
    fn new(snap: &EntitySnapshot, (sx, sy): (i32, i32)) -> Self {
        let size = if snap.is_hero { HERO_BAR } else { UNIT_BAR };
        let x = sx - size.0 / 2;
        let y = sy - BAR_LIFT;
        let color = if snap.is_ally { ALLY } else { ENEMY };

        let health = Bar::new(x, y, size, snap.health_fraction(), color);
        let mana = (snap.is_hero && snap.max_mana > 0.0)
            .then(|| Bar::new(x, y + size.1 + BAR_GAP, size, snap.mana_fraction(), MANA));

        let coord_drop = if snap.is_hero { HERO_COORD_DROP } else { UNIT_COORD_DROP };

        Self {
            anchor: (sx, sy),
            health,
            mana,
            health_label: Label {
                x,
                y: y - LABEL_LIFT,
                text: format!("{}/{}", snap.health, snap.max_health),
                color: TEXT,
                shadow: SHADOW,
            },
            coord_label: Label {
                x,
                y: y + size.1 + coord_drop,
                text: format!("({}, {})", snap.position.x as i32, snap.position.y as i32),
                color: COORD_TEXT,
                shadow: SHADOW,
            },
        }
    }
}

/// Lay out every unit of `frame` that projects inside `surface` (width, height).
pub fn layout_markers(frame: &Frame, viewport: Viewport, surface: (i32, i32)) -> Vec<Marker> {
    let Some(view) = frame.view else { return Vec::new() };
    frame
        .entities
        .iter()
        .filter_map(|snap| place(&view, snap, viewport, surface))
        .collect()
}

fn place(view: &ViewTransform, snap: &EntitySnapshot, viewport: Viewport, (w, h): (i32, i32)) -> Option<Marker> {
    let (sx, sy) = view.project(snap.position, viewport)?;
    if sx < 0 || sx > w || sy < 0 || sy > h {
        return None;
    }
    Some(Marker::new(snap, (sx, sy)))
}

// ============================================================
// Renderer Boundary
// ============================================================

/// Receives the laid-out markers once per cycle.
pub trait FrameSink {
    fn present(&mut self, viewport: Viewport, markers: &[Marker]);
}
