// scanner.rs - One refresh cycle: target alive? -> local team -> walk the
// entity table -> classify every candidate -> read the camera.
//
// A cycle never fails. Anything that goes wrong shrinks the result instead:
// an unreadable entity list gives an empty list, a target that exits mid-scan
// stops the walk at the next chunk boundary and keeps what was collected.
// Per-entity failures are never logged; only availability changes are.

use crate::config::{Config, Heuristics, Layout};
use crate::entities::{Classifier, EntitySnapshot};
use crate::entity_list::EntityList;
use crate::platform::{Platform, ProcessHandle};
use crate::projection::ViewTransform;
use crate::team::LocalTeam;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, trace, warn};

/// Everything handed to the renderer for one cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Accepted entities in table order.
    pub entities: Vec<EntitySnapshot>,
    /// Camera for this cycle, if one could be read.
    pub view: Option<ViewTransform>,
    /// Local team used to tag allies (0 while unresolved).
    pub local_team: u8,
    /// The target exited during this cycle.
    pub aborted: bool,
}

/// Owns the bound target and the per-session state.
pub struct Scanner<P> {
    target: ProcessHandle<P>,
    layout: Layout,
    heuristics: Heuristics,
    local_team: LocalTeam,
    /// Whether the previous cycle found the entity list (edge-triggered logging).
    list_available: AtomicBool,
    /// Whether target exit has already been reported.
    exit_reported: AtomicBool,
}

impl<P: Platform> Scanner<P> {
    pub fn new(target: ProcessHandle<P>, config: &Config) -> Self {
        Self {
            target,
            layout: config.layout.clone(),
            heuristics: config.heuristics.clone(),
            local_team: LocalTeam::new(),
            list_available: AtomicBool::new(true),
            exit_reported: AtomicBool::new(false),
        }
    }

    pub fn local_team(&self) -> &LocalTeam {
        &self.local_team
    }

    pub fn is_alive(&self) -> bool {
        self.target.is_alive()
    }

    /// Run one full cycle.
    pub fn refresh(&self) -> Frame {
        if !self.check_alive() {
            return Frame { aborted: true, ..Frame::default() };
        }

        let local_team = self.local_team.get_or_resolve(&self.target, &self.layout);
        let (entities, aborted) = self.collect_entities(local_team);
        let view = if aborted { None } else { ViewTransform::read(&self.target, &self.layout) };

        trace!(
            entities = entities.len(),
            local_team,
            camera = view.is_some(),
            aborted,
            "cycle done"
        );

        Frame { entities, view, local_team, aborted }
    }

    /// Walk the table chunk by chunk. Returns the snapshots and whether the
    /// walk was cut short by the target exiting.
    fn collect_entities(&self, local_team: u8) -> (Vec<EntitySnapshot>, bool) {
        let mut entities = Vec::new();

        let Some(list) = EntityList::locate(&self.target, &self.layout) else {
            if self.list_available.swap(false, Ordering::Relaxed) {
                warn!("entity list unavailable");
            }
            return (entities, false);
        };
        if !self.list_available.swap(true, Ordering::Relaxed) {
            info!(base = format_args!("0x{:X}", list.base()), "entity list available");
        }

        let classifier = Classifier::new(&self.layout, &self.heuristics);
        let reader = self.target.reader();

        for chunk in list.chunks(self.heuristics.max_entity_index) {
            entities.extend(chunk.filter_map(|(_, entity)| classifier.classify(reader, entity, local_team)));

            if !self.check_alive() {
                return (entities, true);
            }
        }

        (entities, false)
    }

    fn check_alive(&self) -> bool {
        let alive = self.target.is_alive();
        if !alive && !self.exit_reported.swap(true, Ordering::Relaxed) {
            warn!(module = self.target.module_name(), "target process exited");
        }
        alive
    }
}
