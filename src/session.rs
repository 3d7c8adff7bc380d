//! Session: runs the editor core against a [`MarinaApi`].
//!
//! DESIGN
//! ======
//! The engine is synchronous and never performs I/O; it hands out
//! [`SyncRequest`] tickets. `Session` executes them and feeds the outcome
//! back through [`EngineCore::complete`], then keeps going with whatever
//! follow-up requests that completion produced.
//!
//! The engine sits behind a `tokio::sync::Mutex` that is only held for the
//! synchronous step, never across a network await, so input keeps flowing
//! while calls are in flight.
//!
//! Updates are debounced and coalesced: after the quiet period a ticket
//! whose revision has been superseded locally is dropped, since a later
//! ticket carries the newer value. Remote calls for one position are
//! single-flight in FIFO order, so the last PUT the service sees carries
//! the final local value.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use canvas::config::EditorConfig;
use canvas::doc::MapId;
use canvas::engine::{Action, EngineCore, Notice};
use canvas::error::{LoadError, SyncError};
use canvas::render::Scene;
use canvas::store::{BindingChange, SyncRequest, SyncResult, UpdateTicket};
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::MarinaApi;
use crate::config::Config;

pub struct Session<A: MarinaApi> {
    api: Arc<A>,
    engine: Mutex<EngineCore>,
    /// Per-position locks serialising remote calls. Kept across loads: a
    /// PUT from before a reload still holds its lock.
    flights: std::sync::Mutex<HashMap<i64, Arc<Mutex<()>>>>,
    debounce: Duration,
}

impl<A: MarinaApi> Session<A> {
    #[must_use]
    pub fn new(api: Arc<A>, editor: EditorConfig, debounce: Duration) -> Self {
        Self {
            api,
            engine: Mutex::new(EngineCore::new(editor)),
            flights: std::sync::Mutex::new(HashMap::new()),
            debounce,
        }
    }

    #[must_use]
    pub fn from_config(api: Arc<A>, config: &Config) -> Self {
        let mut engine = EngineCore::new(config.editor());
        engine.set_viewport(config.viewport_width, config.viewport_height);
        Self {
            api,
            engine: Mutex::new(engine),
            flights: std::sync::Mutex::new(HashMap::new()),
            debounce: config.sync_debounce,
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run a synchronous step against the engine.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut EngineCore) -> R) -> R {
        let mut engine = self.engine.lock().await;
        f(&mut engine)
    }

    /// Run an engine command and carry out the remote calls it produces.
    /// Returns the notices raised along the way.
    pub async fn handle(&self, f: impl FnOnce(&mut EngineCore) -> Vec<Action>) -> Vec<Notice> {
        let actions = self.with_engine(f).await;
        self.dispatch(actions).await
    }

    pub async fn scene(&self) -> Scene {
        self.with_engine(|engine| engine.scene()).await
    }

    /// Load a map, replacing the current one.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`]; the previous map, if any, stays loaded.
    pub async fn load(&self, map_id: MapId) -> Result<(), LoadError> {
        let ticket = self.with_engine(|engine| engine.begin_load(map_id)).await;
        let result = self.api.get_map_with_boats(map_id).await.map_err(|e| e.into_load_error(map_id));

        let mut engine = self.engine.lock().await;
        engine.complete_load(&ticket, result)?;
        info!(map_id, placements = engine.store.len(), "session: map loaded");
        Ok(())
    }

    /// Unload the current map. Calls still in flight finish against the
    /// service but their outcomes are discarded.
    pub async fn close(&self) {
        self.with_engine(EngineCore::close_map).await;
        info!("session: map closed");
    }

    /// Execute every sync request in `actions`, including follow-ups, and
    /// collect the notices.
    pub async fn dispatch(&self, actions: Vec<Action>) -> Vec<Notice> {
        let mut notices = Vec::new();
        let mut pending = actions;
        while !pending.is_empty() {
            let mut requests = Vec::new();
            for action in pending.drain(..) {
                match action {
                    Action::Sync(request) => requests.push(request),
                    Action::Notice(notice) => notices.push(notice),
                    Action::RenderNeeded | Action::SetCursor(_) => {}
                }
            }
            let completed = join_all(requests.into_iter().map(|request| self.execute(request))).await;
            pending = completed.into_iter().flatten().collect();
        }
        notices
    }

    async fn execute(&self, request: SyncRequest) -> Vec<Action> {
        let kind = request.kind();
        let result = match request {
            SyncRequest::Update(ticket) => return self.execute_update(ticket).await,
            SyncRequest::Create(ticket) => {
                let result = self.api.create_position(&ticket.body).await.map_err(SyncError::from);
                SyncResult::Created(ticket, result)
            }
            SyncRequest::Remove(ticket) => {
                let flight = self.flight(ticket.position_id);
                let _guard = flight.lock().await;
                let result = self.api.delete_position(ticket.position_id).await.map_err(SyncError::from);
                SyncResult::Removed(ticket, result)
            }
            SyncRequest::Binding(ticket) => {
                let result = match ticket.change {
                    BindingChange::Assign { position_id } => self.api.assign_boat(ticket.boat_id, position_id).await,
                    BindingChange::Unassign => self.api.unassign_boat(ticket.boat_id).await,
                };
                SyncResult::Bound(ticket, result.map_err(SyncError::from))
            }
        };
        debug!(kind, "session: sync finished");
        self.engine.lock().await.complete(result)
    }

    async fn execute_update(&self, ticket: UpdateTicket) -> Vec<Action> {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        let flight = self.flight(ticket.position_id);
        let _guard = flight.lock().await;

        if !self.engine.lock().await.store.is_latest(&ticket) {
            debug!(position_id = ticket.position_id, revision = ticket.revision(), "session: update superseded");
            return Vec::new();
        }
        let result = self.api.update_position(ticket.position_id, &ticket.patch).await.map_err(SyncError::from);
        self.engine.lock().await.complete(SyncResult::Updated(ticket, result))
    }

    fn flight(&self, position_id: i64) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        flights.entry(position_id).or_default().clone()
    }
}
