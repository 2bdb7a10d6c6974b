// lib.rs - External diagnostic overlay core for Dota 2.
//
// Runs as a separate process next to the game. Every refresh cycle it:
//   1. Checks the bound game process is still alive
//   2. Walks the game's chunked entity table through read-only memory reads
//   3. Filters and classifies each entity into a snapshot (vitals, team, hero?)
//   4. Reads the camera matrix so snapshots can be projected to the screen
//
// Nothing is ever written to the target. Painting is left to the caller;
// `overlay` only computes where markers go.

pub mod config;      // Memory layout offsets + heuristics, TOML loading
pub mod entities;    // Entity classification and snapshots
pub mod entity_list; // Chunked entity table walker
pub mod error;       // Error kinds
pub mod math;        // Vector math (Vec3)
pub mod overlay;     // Marker geometry for the renderer
pub mod platform;    // Process binding and raw memory reads
pub mod projection;  // World-to-screen projection
pub mod scanner;     // One refresh cycle end to end
pub mod team;        // Cached local-team lookup

pub use config::{Config, Heuristics, Layout};
pub use entities::{Classifier, EntitySnapshot};
pub use entity_list::{EntityHandle, EntityList};
pub use error::{Error, Result};
pub use math::Vec3;
pub use overlay::{layout_markers, FrameSink, Marker};
pub use platform::{bind, MemoryReader, Platform, ProcessHandle};
pub use projection::{ViewTransform, Viewport};
pub use scanner::{Frame, Scanner};
pub use team::{LocalTeam, TeamState};

use std::ffi::OsStr;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Install the global subscriber: stderr always, plus `log_file` if given.
///
/// The filter defaults to `dota_diag_overlay=info` and follows `RUST_LOG`.
/// Keep the returned guard alive for the session or buffered file lines are lost.
pub fn init_logging(log_file: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dota_diag_overlay=info"));
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("overlay_debug.log"));
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init();
    guard
}
