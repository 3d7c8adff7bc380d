//! Position store: the in-memory placements of the loaded map and the
//! bookkeeping that reconciles optimistic local edits with the server.
//!
//! DESIGN
//! ======
//! Every mutating call applies its change locally and synchronously, then
//! returns a *ticket* describing the remote call the host must make. The host
//! later hands the ticket back together with the server's answer through
//! [`PositionStore::complete`]. The store never performs I/O itself.
//!
//! Two policies apply on failure:
//! - create, remove, assign and unassign roll back, so a placement or binding
//!   the server does not have never lingers locally;
//! - geometry/style updates keep the local value and only report the error.
//!
//! STALENESS
//! =========
//! Each placement carries a revision counter bumped on every local change.
//! Update tickets record the revision they were taken at; a response for an
//! older revision is discarded instead of overwriting newer local state. A
//! map generation counter, bumped on every load, cancels anything still in
//! flight for the previous map.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::camera::Size;
use crate::doc::{
    BoatId, BoatRecord, EntityBinding, Geometry, MapDocument, MapId, MapWithBoatsRecord, NewPosition, Placement,
    PlacementId, PlacementPatch, PlacementWithBinding, PositionRecord, Style,
};
use crate::error::{LoadError, StoreError, SyncError};

// =============================================================
// Tickets
// =============================================================

/// An in-progress map load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub map_id: MapId,
    seq: u64,
}

/// Remote create for an optimistically inserted placement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTicket {
    generation: u64,
    /// Temporary id of the local placement.
    pub local_id: PlacementId,
    pub body: NewPosition,
}

/// Remote update carrying a full snapshot of the placement at `revision`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTicket {
    generation: u64,
    revision: u64,
    pub position_id: i64,
    pub patch: PlacementPatch,
}

impl UpdateTicket {
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Remote delete, remembering where the placement sat for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveTicket {
    generation: u64,
    index: usize,
    entry: PlacementWithBinding,
    pub position_id: i64,
}

/// Which binding change a [`BindingTicket`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingChange {
    Assign { position_id: i64 },
    Unassign,
}

/// Remote assign/unassign of a boat, with the bindings to restore on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingTicket {
    generation: u64,
    restore: Vec<(PlacementId, Option<EntityBinding>)>,
    pub boat_id: BoatId,
    pub change: BindingChange,
}

/// A remote call the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRequest {
    Create(CreateTicket),
    Update(UpdateTicket),
    Remove(RemoveTicket),
    Binding(BindingTicket),
}

impl SyncRequest {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Remove(_) => "remove",
            Self::Binding(t) => match t.change {
                BindingChange::Assign { .. } => "assign",
                BindingChange::Unassign => "unassign",
            },
        }
    }
}

/// A ticket paired with the server's answer.
#[derive(Debug, Clone)]
pub enum SyncResult {
    Created(CreateTicket, Result<PositionRecord, SyncError>),
    Updated(UpdateTicket, Result<PositionRecord, SyncError>),
    Removed(RemoveTicket, Result<(), SyncError>),
    Bound(BindingTicket, Result<BoatRecord, SyncError>),
}

impl SyncResult {
    /// Short label for logs and notices.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(..) => "create",
            Self::Updated(..) => "update",
            Self::Removed(..) => "remove",
            Self::Bound(t, _) => match t.change {
                BindingChange::Assign { .. } => "assign",
                BindingChange::Unassign => "unassign",
            },
        }
    }
}

/// How a completed sync affected local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// The response was reconciled into local state.
    Applied,
    /// A newer local change exists; the response was discarded.
    Stale,
    /// The map was switched while the call was in flight.
    Cancelled,
}

/// Result of a successful [`PositionStore::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub resolved: Resolved,
    /// `(pending, server)` when a create replaced a temporary id.
    pub confirmed: Option<(PlacementId, PlacementId)>,
    /// Remote calls this completion made necessary.
    pub follow_up: Vec<SyncRequest>,
}

impl Completion {
    fn resolved(resolved: Resolved) -> Self {
        Self { resolved, confirmed: None, follow_up: Vec::new() }
    }
}

// =============================================================
// Store
// =============================================================

/// The map being edited and its placements in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    pub map: MapDocument,
    pub placements: Vec<PlacementWithBinding>,
}

/// Sole owner and mutator of placement data for one editing session.
#[derive(Debug)]
pub struct PositionStore {
    min_size: Size,
    current: Option<LoadedMap>,
    generation: u64,
    load_seq: u64,
    revisions: HashMap<PlacementId, u64>,
    next_pending: u64,
    /// Pending placements removed locally before their create was confirmed.
    orphaned: HashSet<PlacementId>,
}

impl PositionStore {
    /// Empty store; `min_size` is the floor applied to every resize.
    #[must_use]
    pub fn new(min_size: Size) -> Self {
        Self {
            min_size,
            current: None,
            generation: 0,
            load_seq: 0,
            revisions: HashMap::new(),
            next_pending: 0,
            orphaned: HashSet::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn current(&self) -> Option<&LoadedMap> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn map(&self) -> Option<&MapDocument> {
        self.current.as_ref().map(|c| &c.map)
    }

    /// Placements in draw order (bottom first). Empty when no map is loaded.
    #[must_use]
    pub fn placements(&self) -> &[PlacementWithBinding] {
        self.current.as_ref().map_or(&[], |c| c.placements.as_slice())
    }

    #[must_use]
    pub fn get(&self, id: PlacementId) -> Option<&PlacementWithBinding> {
        self.placements().iter().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: PlacementId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.placements().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements().is_empty()
    }

    /// Local revision of a placement; 0 if never changed.
    #[must_use]
    pub fn revision(&self, id: PlacementId) -> u64 {
        self.revisions.get(&id).copied().unwrap_or(0)
    }

    /// Counter bumped on every successful load.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn min_size(&self) -> Size {
        self.min_size
    }

    // --- Load ---

    /// Start loading `map_id`. Only the most recently started load may complete.
    pub fn begin_load(&mut self, map_id: MapId) -> LoadTicket {
        self.load_seq += 1;
        LoadTicket { map_id, seq: self.load_seq }
    }

    /// Finish a load. On success the session is replaced wholesale and every
    /// in-flight ticket for the previous map is invalidated. On failure
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`LoadError`], [`LoadError::Superseded`] if a
    /// newer load was started, or [`LoadError::NotFound`] if the server
    /// answered with a different map.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<MapWithBoatsRecord, LoadError>,
    ) -> Result<&LoadedMap, LoadError> {
        if ticket.seq != self.load_seq {
            return Err(LoadError::Superseded(ticket.map_id));
        }
        let record = result?;
        if record.map.id != ticket.map_id {
            warn!(requested = ticket.map_id, returned = record.map.id, "server returned a different map");
            return Err(LoadError::NotFound(ticket.map_id));
        }

        let map = MapDocument::from(record.map);
        let mut placements = Vec::with_capacity(record.boats.len());
        for entry in record.boats {
            if entry.position.map_id == map.id {
                placements.push(PlacementWithBinding::from(entry));
            } else {
                warn!(
                    map_id = map.id,
                    position_id = entry.position.id,
                    position_map_id = entry.position.map_id,
                    "dropping placement that belongs to another map"
                );
            }
        }

        self.generation += 1;
        self.revisions.clear();
        self.orphaned.clear();
        debug!(map_id = map.id, placements = placements.len(), generation = self.generation, "map loaded");
        Ok(&*self.current.insert(LoadedMap { map, placements }))
    }

    /// Drop the current map without touching the server.
    pub fn close(&mut self) {
        self.current = None;
        self.generation += 1;
        self.revisions.clear();
        self.orphaned.clear();
    }

    // --- Create ---

    /// Insert a new placement under a temporary id and describe the remote create.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoMapLoaded`] when there is no current map.
    pub fn create(&mut self, geometry: Geometry, style: Style) -> Result<CreateTicket, StoreError> {
        let floor = self.min_size;
        let current = self.current.as_mut().ok_or(StoreError::NoMapLoaded)?;
        let local_id = PlacementId::Pending(self.next_pending);
        self.next_pending += 1;

        let placement = Placement {
            id: local_id,
            map_id: current.map.id,
            geometry: geometry.clamped(current.map.size(), floor),
            style,
            visible: true,
        };
        let body = placement.to_new_position();
        current.placements.push(PlacementWithBinding { placement, binding: None });
        self.revisions.insert(local_id, 0);

        Ok(CreateTicket { generation: self.generation, local_id, body })
    }

    // --- Update ---

    /// Apply `patch` locally and describe the remote update.
    ///
    /// Returns `None` for a placement that is still pending: its create
    /// completion carries the change instead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPlacement`] if `id` is not in the session.
    pub fn update(&mut self, id: PlacementId, patch: &PlacementPatch) -> Result<Option<UpdateTicket>, StoreError> {
        self.update_local(id, patch)?;
        Ok(self.update_ticket(id))
    }

    /// Apply `patch` locally without producing a ticket. Used for drag
    /// motion, which is committed once on release.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPlacement`] if `id` is not in the session.
    pub fn update_local(&mut self, id: PlacementId, patch: &PlacementPatch) -> Result<u64, StoreError> {
        let floor = self.min_size;
        let current = self.current.as_mut().ok_or(StoreError::NoMapLoaded)?;
        let bounds = current.map.size();
        let entry = current
            .placements
            .iter_mut()
            .find(|p| p.placement.id == id)
            .ok_or(StoreError::UnknownPlacement(id))?;

        let placement = &mut entry.placement;
        placement.geometry = patch.apply_geometry(placement.geometry).clamped(bounds, floor);
        placement.apply_style(patch);

        let revision = self.revisions.entry(id).or_insert(0);
        *revision += 1;
        Ok(*revision)
    }

    /// Whether `ticket` still describes the newest local state of its placement.
    /// A superseded ticket need not be sent: a later one carries the newer value.
    #[must_use]
    pub fn is_latest(&self, ticket: &UpdateTicket) -> bool {
        let id = PlacementId::Server(ticket.position_id);
        ticket.generation == self.generation && self.contains(id) && self.revision(id) == ticket.revision
    }

    fn update_ticket(&self, id: PlacementId) -> Option<UpdateTicket> {
        let position_id = id.server()?;
        let entry = self.get(id)?;
        Some(UpdateTicket {
            generation: self.generation,
            revision: self.revision(id),
            position_id,
            patch: PlacementPatch::snapshot(&entry.placement),
        })
    }

    // --- Remove ---

    /// Remove a placement locally and describe the remote delete.
    ///
    /// Returns `None` for a pending placement; if its create later succeeds
    /// the completion issues the delete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPlacement`] if `id` is not in the session.
    pub fn remove(&mut self, id: PlacementId) -> Result<Option<RemoveTicket>, StoreError> {
        let current = self.current.as_mut().ok_or(StoreError::NoMapLoaded)?;
        let index = current
            .placements
            .iter()
            .position(|p| p.placement.id == id)
            .ok_or(StoreError::UnknownPlacement(id))?;
        let entry = current.placements.remove(index);

        match id {
            PlacementId::Server(position_id) => {
                Ok(Some(RemoveTicket { generation: self.generation, index, entry, position_id }))
            }
            PlacementId::Pending(_) => {
                self.orphaned.insert(id);
                self.revisions.remove(&id);
                Ok(None)
            }
        }
    }

    // --- Bindings ---

    /// Bind a boat to a placement, detaching it from any other placement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPlacement`] if `id` is not in the session
    /// or [`StoreError::PendingPlacement`] if it has no server id yet.
    pub fn assign(&mut self, binding: EntityBinding, id: PlacementId) -> Result<BindingTicket, StoreError> {
        let current = self.current.as_mut().ok_or(StoreError::NoMapLoaded)?;
        if !current.placements.iter().any(|p| p.placement.id == id) {
            return Err(StoreError::UnknownPlacement(id));
        }
        let position_id = id.server().ok_or(StoreError::PendingPlacement(id))?;

        let mut restore = Vec::new();
        for entry in &mut current.placements {
            let holds_boat = entry.binding.as_ref().is_some_and(|b| b.id == binding.id);
            if entry.placement.id == id {
                restore.push((id, entry.binding.replace(binding.clone())));
            } else if holds_boat {
                restore.push((entry.placement.id, entry.binding.take()));
            }
        }

        Ok(BindingTicket {
            generation: self.generation,
            restore,
            boat_id: binding.id,
            change: BindingChange::Assign { position_id },
        })
    }

    /// Detach the boat bound to a placement. Returns `None` if it is unbound.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPlacement`] if `id` is not in the session.
    pub fn unassign(&mut self, id: PlacementId) -> Result<Option<BindingTicket>, StoreError> {
        let current = self.current.as_mut().ok_or(StoreError::NoMapLoaded)?;
        let entry = current
            .placements
            .iter_mut()
            .find(|p| p.placement.id == id)
            .ok_or(StoreError::UnknownPlacement(id))?;
        let Some(binding) = entry.binding.take() else {
            return Ok(None);
        };
        let boat_id = binding.id;
        Ok(Some(BindingTicket {
            generation: self.generation,
            restore: vec![(id, Some(binding))],
            boat_id,
            change: BindingChange::Unassign,
        }))
    }

    // --- Completion ---

    /// Reconcile a finished remote call.
    ///
    /// # Errors
    ///
    /// Returns the call's [`SyncError`] after applying the rollback policy for
    /// its kind. Errors for a previous map or a superseded revision are
    /// swallowed and reported as [`Resolved::Cancelled`] / [`Resolved::Stale`].
    pub fn complete(&mut self, result: SyncResult) -> Result<Completion, SyncError> {
        match result {
            SyncResult::Created(ticket, result) => self.complete_create(ticket, result),
            SyncResult::Updated(ticket, result) => self.complete_update(&ticket, result).map(Completion::resolved),
            SyncResult::Removed(ticket, result) => self.complete_remove(ticket, result).map(Completion::resolved),
            SyncResult::Bound(ticket, result) => self.complete_binding(ticket, result).map(Completion::resolved),
        }
    }

    fn complete_create(
        &mut self,
        ticket: CreateTicket,
        result: Result<PositionRecord, SyncError>,
    ) -> Result<Completion, SyncError> {
        if ticket.generation != self.generation {
            debug!(local_id = %ticket.local_id, "create finished after map switch; ignoring");
            return Ok(Completion::resolved(Resolved::Cancelled));
        }
        let local_id = ticket.local_id;
        let orphaned = self.orphaned.remove(&local_id);

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if !orphaned {
                    self.drop_placement(local_id);
                }
                self.revisions.remove(&local_id);
                return Err(e);
            }
        };
        let position_id = record.id;
        let server_id = PlacementId::Server(position_id);

        if orphaned {
            // Removed locally while the create was in flight; delete it remotely too.
            let entry = PlacementWithBinding { placement: Placement::from(record), binding: None };
            let follow_up = SyncRequest::Remove(RemoveTicket {
                generation: self.generation,
                index: self.len(),
                entry,
                position_id,
            });
            return Ok(Completion { resolved: Resolved::Applied, confirmed: None, follow_up: vec![follow_up] });
        }

        let edited = self.revisions.remove(&local_id).unwrap_or(0) > 0;
        let floor = self.min_size;
        let Some(current) = self.current.as_mut() else {
            return Ok(Completion::resolved(Resolved::Cancelled));
        };
        let bounds = current.map.size();
        let Some(entry) = current.placements.iter_mut().find(|p| p.placement.id == local_id) else {
            return Ok(Completion::resolved(Resolved::Stale));
        };

        entry.placement.id = server_id;
        if !edited {
            let mut adopted = Placement::from(record);
            adopted.geometry = adopted.geometry.clamped(bounds, floor);
            entry.placement = adopted;
        }

        let mut follow_up = Vec::new();
        if edited {
            self.revisions.insert(server_id, 1);
            if let Some(t) = self.update_ticket(server_id) {
                follow_up.push(SyncRequest::Update(t));
            }
        } else {
            self.revisions.insert(server_id, 0);
        }

        Ok(Completion { resolved: Resolved::Applied, confirmed: Some((local_id, server_id)), follow_up })
    }

    fn complete_update(
        &mut self,
        ticket: &UpdateTicket,
        result: Result<PositionRecord, SyncError>,
    ) -> Result<Resolved, SyncError> {
        if ticket.generation != self.generation {
            debug!(position_id = ticket.position_id, "update finished after map switch; ignoring");
            return Ok(Resolved::Cancelled);
        }
        if !self.is_latest(ticket) {
            debug!(
                position_id = ticket.position_id,
                revision = ticket.revision,
                latest = self.revision(PlacementId::Server(ticket.position_id)),
                "discarding stale update response"
            );
            return Ok(Resolved::Stale);
        }
        let record = result?;

        let floor = self.min_size;
        let Some(current) = self.current.as_mut() else {
            return Ok(Resolved::Cancelled);
        };
        let bounds = current.map.size();
        if let Some(entry) = current.placements.iter_mut().find(|p| p.placement.id.server() == Some(record.id)) {
            let mut adopted = Placement::from(record);
            adopted.geometry = adopted.geometry.clamped(bounds, floor);
            entry.placement = adopted;
        }
        Ok(Resolved::Applied)
    }

    fn complete_remove(&mut self, ticket: RemoveTicket, result: Result<(), SyncError>) -> Result<Resolved, SyncError> {
        if ticket.generation != self.generation {
            debug!(position_id = ticket.position_id, "remove finished after map switch; ignoring");
            return Ok(Resolved::Cancelled);
        }
        match result {
            Ok(()) | Err(SyncError::NotFound) => {
                self.revisions.remove(&PlacementId::Server(ticket.position_id));
                Ok(Resolved::Applied)
            }
            Err(e) => {
                if let Some(current) = self.current.as_mut() {
                    let index = ticket.index.min(current.placements.len());
                    current.placements.insert(index, ticket.entry);
                }
                Err(e)
            }
        }
    }

    fn complete_binding(
        &mut self,
        ticket: BindingTicket,
        result: Result<BoatRecord, SyncError>,
    ) -> Result<Resolved, SyncError> {
        if ticket.generation != self.generation {
            debug!(boat_id = ticket.boat_id, "binding change finished after map switch; ignoring");
            return Ok(Resolved::Cancelled);
        }
        let Some(current) = self.current.as_mut() else {
            return Ok(Resolved::Cancelled);
        };
        match result {
            Ok(record) => {
                if let BindingChange::Assign { position_id } = ticket.change {
                    let target = PlacementId::Server(position_id);
                    if let Some(entry) = current.placements.iter_mut().find(|p| p.placement.id == target) {
                        entry.binding = Some(EntityBinding::from(&record));
                    }
                }
                Ok(Resolved::Applied)
            }
            Err(e) => {
                for (id, binding) in ticket.restore {
                    if let Some(entry) = current.placements.iter_mut().find(|p| p.placement.id == id) {
                        entry.binding = binding;
                    }
                }
                Err(e)
            }
        }
    }

    fn drop_placement(&mut self, id: PlacementId) {
        if let Some(current) = self.current.as_mut() {
            current.placements.retain(|p| p.placement.id != id);
        }
    }
}
