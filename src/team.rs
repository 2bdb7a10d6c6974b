// team.rs - Which team the local viewer plays on, resolved once per session.
//
// Chain: module + local_players -> controller -> assigned entity handle
//        -> entity table -> entity -> team byte
//
// Until the viewer has been given a unit (loading screen, hero pick) the chain
// ends early and the answer is 0 = "unresolved". Unresolved is retried on the
// next cycle. The first non-zero answer is frozen for the rest of the session.

use crate::config::Layout;
use crate::entity_list::{EntityHandle, EntityList};
use crate::error::{Error, Result};
use crate::platform::{Platform, ProcessHandle};
use once_cell::sync::OnceCell;
use tracing::info;

/// Observable state of the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeamState {
    /// Nothing frozen yet; the next lookup walks the chain.
    Unresolved,
    /// Frozen for the session.
    Resolved(u8),
}

/// Lazily resolved, write-once local team.
///
/// Concurrent callers may both walk the chain while unresolved; only the first
/// store wins and both stored the same value anyway.
#[derive(Debug, Default)]
pub struct LocalTeam {
    resolved: OnceCell<u8>,
}

impl LocalTeam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TeamState {
        match self.resolved.get() {
            Some(&team) => TeamState::Resolved(team),
            None => TeamState::Unresolved,
        }
    }

    /// Cached team, or a fresh walk of the chain while unresolved.
    /// Returns 0 while the chain cannot be completed.
    pub fn get_or_resolve<P: Platform>(&self, target: &ProcessHandle<P>, layout: &Layout) -> u8 {
        if let Some(&team) = self.resolved.get() {
            return team;
        }
        match Self::try_resolve(target, layout) {
            Ok(team) => {
                if self.resolved.set(team).is_ok() {
                    info!(team, "local team resolved");
                }
                team
            }
            Err(_) => 0,
        }
    }

    /// Walk the chain once, without touching the cache.
    pub fn try_resolve<P: Platform>(target: &ProcessHandle<P>, layout: &Layout) -> Result<u8> {
        let reader = target.reader();

        let controller = reader.read_ptr(target.address(layout.local_players))?;
        if controller == 0 {
            return Err(Error::UnresolvedTeam);
        }

        let handle = EntityHandle(reader.read_u32(controller.wrapping_add(layout.assigned_entity))?);
        if !handle.is_assigned() {
            return Err(Error::UnresolvedTeam);
        }

        let list = EntityList::locate(target, layout).ok_or(Error::UnresolvedTeam)?;
        let entity = list.resolve(handle).ok_or(Error::UnresolvedTeam)?;

        match reader.read_u8(entity.wrapping_add(layout.team))? {
            0 => Err(Error::UnresolvedTeam),
            team => Ok(team),
        }
    }
}
