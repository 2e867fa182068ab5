//! Session host - many independent tables on one shared map
//!
//! Sessions share nothing mutable, so batches for different sessions are
//! processed in parallel. Events within one batch run strictly in order.

use ahash::AHashMap;
use rayon::prelude::*;
use std::sync::Arc;

use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, RejectionReason, Result};
use crate::core::types::SessionId;
use crate::event::PlacementEvent;
use crate::map::MapModel;
use crate::session::game::{AppliedEvent, GameSession, SessionStatus};

/// Result of running one batch against one session
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub session: SessionId,
    pub applied: Vec<AppliedEvent>,
    /// Index into the batch and the reason it was refused
    pub rejected: Vec<(usize, RejectionReason)>,
    /// Events never looked at because the session was corrupted first
    pub skipped: usize,
    pub status: SessionStatus,
}

pub struct SessionHost {
    map: Arc<MapModel>,
    rules: RulesConfig,
    sessions: AHashMap<SessionId, GameSession>,
}

impl SessionHost {
    pub fn new(map: Arc<MapModel>, rules: RulesConfig) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            map,
            rules,
            sessions: AHashMap::new(),
        })
    }

    /// Host on the bundled map with the global rules
    pub fn standard() -> Result<Self> {
        let map = Arc::new(MapModel::standard()?);
        Self::new(map, crate::core::config::config().clone())
    }

    pub fn map(&self) -> &Arc<MapModel> {
        &self.map
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn open_session(&mut self) -> Result<SessionId> {
        let session = GameSession::new(self.map.clone(), &self.rules)?;
        let id = session.id();
        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn session(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    pub fn close_session(&mut self, id: SessionId) -> Option<GameSession> {
        let closed = self.sessions.remove(&id);
        if closed.is_some() {
            tracing::info!("Closed session {}", id);
        }
        closed
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Submit a single event to one session
    pub fn submit(&mut self, id: SessionId, event: &PlacementEvent) -> Result<AppliedEvent> {
        self.sessions
            .get_mut(&id)
            .ok_or(EngineError::SessionNotFound(id))?
            .submit(event)
    }

    /// Run event batches against their sessions in parallel
    ///
    /// Batches for unknown sessions are dropped with a warning. Reports come
    /// back sorted by session id.
    pub fn process_batches(&mut self, batches: AHashMap<SessionId, Vec<PlacementEvent>>) -> Vec<BatchReport> {
        for id in batches.keys().filter(|id| !self.sessions.contains_key(*id)) {
            tracing::warn!("Dropping batch for unknown session {}", id);
        }

        let work: Vec<(&mut GameSession, &Vec<PlacementEvent>)> = self
            .sessions
            .iter_mut()
            .filter_map(|(id, session)| batches.get(id).map(|events| (session, events)))
            .collect();
        let mut reports: Vec<BatchReport> = work
            .into_par_iter()
            .map(|(session, events)| run_batch(session, events))
            .collect();
        reports.sort_by_key(|r| r.session);
        reports
    }
}

fn run_batch(session: &mut GameSession, events: &[PlacementEvent]) -> BatchReport {
    let mut report = BatchReport {
        session: session.id(),
        applied: Vec::new(),
        rejected: Vec::new(),
        skipped: 0,
        status: SessionStatus::Active,
    };

    for (index, event) in events.iter().enumerate() {
        match session.submit(event) {
            Ok(applied) => report.applied.push(applied),
            Err(EngineError::Rejected(reason)) => report.rejected.push((index, reason)),
            Err(EngineError::SessionCorrupted(_)) => {
                report.skipped = events.len() - index;
                break;
            }
            Err(_) => {
                report.skipped = events.len() - index - 1;
                break;
            }
        }
    }

    report.status = session.status().clone();
    tracing::debug!(
        "Session {}: batch of {} -> {} applied, {} rejected",
        report.session,
        events.len(),
        report.applied.len(),
        report.rejected.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Faction;
    use crate::event::Shipment;
    use crate::forces::Battalion;

    fn host() -> SessionHost {
        let map = Arc::new(MapModel::standard().unwrap());
        SessionHost::new(map, RulesConfig::default()).unwrap()
    }

    fn ship(host: &SessionHost, faction: Faction, key: &str, amount: u32) -> PlacementEvent {
        let to = host.map().id_of(key).unwrap();
        Shipment::single(faction, to, Battalion::regular(faction, amount)).into()
    }

    #[test]
    fn test_open_and_close_sessions() {
        let mut host = host();
        let a = host.open_session().unwrap();
        let b = host.open_session().unwrap();
        assert_ne!(a, b);
        assert_eq!(host.len(), 2);

        assert!(host.close_session(a).is_some());
        assert!(host.session(a).is_none());
        assert_eq!(host.session_ids(), vec![b]);
    }

    #[test]
    fn test_submit_to_unknown_session() {
        let mut host = host();
        let event = ship(&host, Faction::Atreides, "arrakeen", 1);
        let missing = SessionId::new();
        assert!(matches!(host.submit(missing, &event), Err(EngineError::SessionNotFound(id)) if id == missing));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut host = host();
        let a = host.open_session().unwrap();
        let b = host.open_session().unwrap();

        let event = ship(&host, Faction::Atreides, "arrakeen", 4);
        host.submit(a, &event).unwrap();

        assert_eq!(host.session(a).unwrap().ledger().reserve_of(Faction::Atreides).strength(), 6);
        assert_eq!(host.session(b).unwrap().ledger().reserve_of(Faction::Atreides).strength(), 10);
    }

    #[test]
    fn test_process_batches_in_parallel() {
        let mut host = host();
        let ids: Vec<_> = (0..8).map(|_| host.open_session().unwrap()).collect();

        let mut batches = AHashMap::new();
        for id in &ids {
            batches.insert(
                *id,
                vec![
                    ship(&host, Faction::Atreides, "caladan", 3),
                    // Board edge without cross entry
                    ship(&host, Faction::Harkonnen, "meridian_west", 2),
                    ship(&host, Faction::Atreides, "arrakeen", 7),
                    // Reserve now empty
                    ship(&host, Faction::Atreides, "arrakeen", 1),
                ],
            );
        }
        batches.insert(SessionId::new(), vec![ship(&host, Faction::Guild, "arrakeen", 1)]);

        let reports = host.process_batches(batches);

        assert_eq!(reports.len(), 8);
        assert!(reports.windows(2).all(|w| w[0].session < w[1].session));
        for report in &reports {
            assert_eq!(report.applied.len(), 2);
            let indices: Vec<_> = report.rejected.iter().map(|(i, _)| *i).collect();
            assert_eq!(indices, vec![1, 3]);
            assert!(matches!(report.rejected[1].1, RejectionReason::InsufficientForces { .. }));
            assert_eq!(report.status, SessionStatus::Active);
        }
        for id in ids {
            let session = host.session(id).unwrap();
            assert_eq!(session.ledger().reserve_of(Faction::Atreides).strength(), 0);
            assert!(session.conservation_holds());
        }
    }
}
