//! Session manager holding many independent schedule sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use rotaforge_config::EngineConfig;
use rotaforge_core::{ProblemSpecification, Result, RotaForgeError, Translator};
use tracing::info;
use uuid::Uuid;

use crate::driver::SolveReport;
use crate::session::ScheduleSession;

type SharedSession = Arc<Mutex<ScheduleSession>>;

/// Sessions keyed by id. Each session is mutated by one caller at a time; different
/// sessions proceed concurrently.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session and returns its id.
    pub fn create(
        &self,
        spec: ProblemSpecification,
        config: EngineConfig,
        translator: Arc<dyn Translator>,
    ) -> Result<Uuid> {
        let session = ScheduleSession::new(spec, config, translator)?;
        self.insert(session)
    }

    pub fn insert(&self, session: ScheduleSession) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.lock_sessions()?
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "session created");
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<SharedSession> {
        self.lock_sessions()?
            .get(&id)
            .cloned()
            .ok_or_else(|| RotaForgeError::InvalidState(format!("unknown session {}", id)))
    }

    /// Runs `f` with exclusive access to session `id`.
    pub fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut ScheduleSession) -> R) -> Result<R> {
        let session = self.get(id)?;
        let mut guard = lock_session(&session)?;
        Ok(f(&mut guard))
    }

    /// Solves session `id` on a background thread.
    pub fn solve_in_background(&self, id: Uuid) -> Result<JoinHandle<Result<SolveReport>>> {
        let session = self.get(id)?;
        Ok(thread::spawn(move || {
            let mut guard = lock_session(&session)?;
            Ok(guard.solve().clone())
        }))
    }

    pub fn remove(&self, id: Uuid) -> Result<bool> {
        Ok(self.lock_sessions()?.remove(&id).is_some())
    }

    pub fn ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.lock_sessions()?.keys().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.lock_sessions().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, HashMap<Uuid, SharedSession>>> {
        self.sessions
            .lock()
            .map_err(|_| RotaForgeError::InvalidState("session table lock poisoned".into()))
    }
}

fn lock_session(session: &Mutex<ScheduleSession>) -> Result<MutexGuard<'_, ScheduleSession>> {
    session
        .lock()
        .map_err(|_| RotaForgeError::InvalidState("session lock poisoned".into()))
}
