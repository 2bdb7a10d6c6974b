// main.rs - Polling loop: bind once, then refresh at a fixed cadence and hand
// the laid-out markers to the sink until the game exits.

use anyhow::Context;
use clap::Parser;
use dota_diag_overlay::platform::{screen_size, window_viewport};
use dota_diag_overlay::{bind, init_logging, layout_markers, Config, FrameSink, Marker, Scanner, Viewport};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(version, about = "Read-only entity overlay feed for Dota 2")]
struct Args {
    /// TOML file with layout offsets and tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target executable name
    #[arg(long)]
    process: Option<String>,

    /// Module the layout offsets are relative to
    #[arg(long)]
    module: Option<String>,

    /// Milliseconds between refresh cycles
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Stand-in renderer: reports when the number of visible markers changes.
#[derive(Default)]
struct TraceSink {
    last: Option<usize>,
}

impl FrameSink for TraceSink {
    fn present(&mut self, viewport: Viewport, markers: &[Marker]) {
        if self.last != Some(markers.len()) {
            debug!(markers = markers.len(), ?viewport, "visible markers changed");
            self.last = Some(markers.len());
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_file.as_deref());

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(process) = args.process {
        config.process_name = process;
    }
    if let Some(module) = args.module {
        config.module_name = module;
    }
    if let Some(ms) = args.interval_ms {
        config.poll_interval_ms = ms;
    }

    // A failed bind ends the session; there is nothing to poll
    let target = bind(&config.process_name, &config.module_name)
        .with_context(|| format!("attaching to {}", config.process_name))?;
    let scanner = Scanner::new(target, &config);
    let mut sink = TraceSink::default();

    let mut cycle = 0u64;
    while args.cycles.map_or(true, |n| cycle < n) {
        let viewport = window_viewport(&config.window_titles).unwrap_or(config.fallback_viewport);
        let surface = screen_size().unwrap_or((viewport.x + viewport.width, viewport.y + viewport.height));

        let frame = scanner.refresh();
        sink.present(viewport, &layout_markers(&frame, viewport, surface));

        if frame.aborted {
            info!(cycles = cycle + 1, "target exited, stopping");
            break;
        }
        cycle += 1;
        std::thread::sleep(config.poll_interval());
    }

    Ok(())
}
