//! Input dispatch for the position editor.
//!
//! `EngineCore` ties the store, the interaction state and the viewport
//! together. Host events (pointer, keyboard, toolbar, completed network
//! calls) go in; [`Action`]s come out. The engine never performs I/O: remote
//! persistence leaves as [`Action::Sync`] and comes back through
//! [`EngineCore::complete`].

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, warn};

use crate::camera::{Camera, Point, Size};
use crate::config::EditorConfig;
use crate::consts::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use crate::doc::{
    EntityBinding, Geometry, MapDocument, MapId, MapWithBoatsRecord, PlacementId, PlacementPatch, PlacementWithBinding,
};
use crate::error::{LoadError, StoreError};
use crate::hit;
use crate::input::{Gesture, Interaction, InteractionState, KeyCommand};
use crate::render::{self, Scene};
use crate::store::{LoadTicket, PositionStore, Resolved, SyncRequest, SyncResult};

const CURSOR_DEFAULT: &str = "default";
const CURSOR_CANVAS: &str = "crosshair";
const CURSOR_HOVER: &str = "pointer";
const CURSOR_DRAGGING: &str = "grabbing";

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    SetCursor(String),
    /// A remote call to execute; feed the outcome back through [`EngineCore::complete`].
    Sync(SyncRequest),
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Stable `E_*` code of the underlying error, if any.
    pub code: Option<&'static str>,
    pub message: String,
}

impl Notice {
    fn warning(err: StoreError) -> Self {
        let code = match err {
            StoreError::NoMapLoaded => "E_NO_MAP",
            StoreError::UnknownPlacement(_) => "E_UNKNOWN_PLACEMENT",
            StoreError::PendingPlacement(_) => "E_PENDING_PLACEMENT",
        };
        Self { level: NoticeLevel::Warning, code: Some(code), message: err.to_string() }
    }
}

/// Core engine state.
pub struct EngineCore {
    pub store: PositionStore,
    pub interaction: InteractionState,
    pub gesture: Gesture,
    pub config: EditorConfig,
    pub viewport: Size,
    cursor: &'static str,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: PositionStore::new(config.min_size),
            interaction: InteractionState::new(&config),
            gesture: Gesture::Idle,
            config,
            viewport: Size::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            cursor: CURSOR_DEFAULT,
        }
    }

    // --- Queries ---

    /// The current view transform. Without a map the fit scale is 1.
    #[must_use]
    pub fn camera(&self) -> Camera {
        let zoom = self.interaction.zoom();
        match self.store.map() {
            Some(map) => Camera::fitted(map.size(), self.viewport, zoom),
            None => Camera { fit: 1.0, zoom },
        }
    }

    #[must_use]
    pub fn selection(&self) -> Option<PlacementId> {
        self.interaction.selected()
    }

    #[must_use]
    pub fn placement(&self, id: PlacementId) -> Option<&PlacementWithBinding> {
        self.store.get(id)
    }

    /// Display list for the current state.
    #[must_use]
    pub fn scene(&self) -> Scene {
        render::scene(&self.store, &self.interaction, self.viewport, &self.config)
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport = Size::new(width, height);
        vec![Action::RenderNeeded]
    }

    fn accepts_input(&self) -> bool {
        self.interaction.interactive() && self.store.map().is_some()
    }

    // --- Map loading ---

    pub fn begin_load(&mut self, map_id: MapId) -> LoadTicket {
        self.store.begin_load(map_id)
    }

    /// Finish a load started with [`Self::begin_load`]. A successful load
    /// resets selection, gesture and zoom.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`]; the previous map stays in place.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<MapWithBoatsRecord, LoadError>,
    ) -> Result<Vec<Action>, LoadError> {
        self.store.complete_load(ticket, result)?;
        self.interaction.clear();
        self.interaction.reset_zoom();
        self.gesture = Gesture::Idle;
        Ok(vec![Action::RenderNeeded])
    }

    pub fn close_map(&mut self) -> Vec<Action> {
        self.store.close();
        self.interaction.clear();
        self.gesture = Gesture::Idle;
        vec![Action::RenderNeeded]
    }

    // --- Pointer ---

    /// Pointer pressed at a viewport position. Selects the placement under it
    /// or, on empty canvas, clears the selection. A drag whose release was
    /// never seen is committed first.
    pub fn on_pointer_down(&mut self, screen_pt: Point) -> Vec<Action> {
        if !self.accepts_input() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if let Gesture::Dragging { id, .. } = std::mem::take(&mut self.gesture) {
            debug!(%id, "press during drag; committing");
            actions.extend(self.commit_drag(id));
        }
        actions.extend(self.press(screen_pt));
        actions
    }

    fn press(&mut self, screen_pt: Point) -> Vec<Action> {
        let camera = self.camera();
        let image_pt = camera.viewport_to_image(screen_pt);

        let Some(id) = hit::hit_test(self.store.placements(), image_pt, &camera) else {
            self.gesture = Gesture::Idle;
            return if self.interaction.clear() { vec![Action::RenderNeeded] } else { Vec::new() };
        };
        let Some(entry) = self.store.get(id) else {
            return Vec::new();
        };
        let origin = entry.placement.geometry;
        if let Err(e) = self.interaction.select(id, &self.store) {
            debug!(error = %e, "select failed");
            return vec![Action::RenderNeeded];
        }
        let grab = Point::new(image_pt.x - origin.x, image_pt.y - origin.y);
        self.gesture = Gesture::Pressed { id, start: screen_pt, grab };
        vec![Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        if !self.accepts_input() {
            return Vec::new();
        }
        match self.gesture {
            Gesture::Idle => self.hover(screen_pt),
            Gesture::Pressed { id, start, grab } => {
                if screen_pt.distance(start) <= self.config.drag_slop {
                    return Vec::new();
                }
                if !self.interaction.begin_drag() {
                    self.gesture = Gesture::Idle;
                    return Vec::new();
                }
                self.gesture = Gesture::Dragging { id, grab };
                let mut actions = self.drag_to(id, grab, screen_pt);
                actions.extend(self.set_cursor(CURSOR_DRAGGING));
                actions
            }
            Gesture::Dragging { id, grab } => self.drag_to(id, grab, screen_pt),
        }
    }

    /// Pointer released. A drag is committed with a single update; a press
    /// without motion was a click and needs nothing more.
    pub fn on_pointer_up(&mut self, screen_pt: Point) -> Vec<Action> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Pressed { .. } => Vec::new(),
            Gesture::Dragging { id, grab } => {
                let mut actions = self.drag_to(id, grab, screen_pt);
                actions.extend(self.commit_drag(id));
                actions.extend(self.set_cursor(CURSOR_HOVER));
                actions
            }
        }
    }

    /// Double-click on empty canvas creates a placement centred on the click.
    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        if !self.accepts_input() {
            return Vec::new();
        }
        let camera = self.camera();
        let image_pt = camera.viewport_to_image(screen_pt);
        if hit::hit_test(self.store.placements(), image_pt, &camera).is_some() {
            return Vec::new();
        }
        self.create_at(image_pt)
    }

    fn hover(&mut self, screen_pt: Point) -> Vec<Action> {
        let camera = self.camera();
        let image_pt = camera.viewport_to_image(screen_pt);
        let cursor = match hit::hit_test(self.store.placements(), image_pt, &camera) {
            Some(_) => CURSOR_HOVER,
            None => CURSOR_CANVAS,
        };
        self.set_cursor(cursor).into_iter().collect()
    }

    fn drag_to(&mut self, id: PlacementId, grab: Point, screen_pt: Point) -> Vec<Action> {
        let image_pt = self.camera().viewport_to_image(screen_pt);
        let patch = PlacementPatch::position(image_pt.x - grab.x, image_pt.y - grab.y);
        match self.store.update_local(id, &patch) {
            Ok(_) => vec![Action::RenderNeeded],
            Err(e) => {
                // The placement vanished mid-drag (rollback or map switch).
                debug!(%id, error = %e, "drag target gone");
                self.gesture = Gesture::Idle;
                self.interaction.retain(&self.store);
                vec![Action::RenderNeeded]
            }
        }
    }

    fn commit_drag(&mut self, id: PlacementId) -> Vec<Action> {
        self.interaction.end_drag();
        let Some(entry) = self.store.get(id) else {
            return Vec::new();
        };
        let g = entry.placement.geometry;
        self.update(id, &PlacementPatch::position(g.x, g.y))
    }

    fn set_cursor(&mut self, cursor: &'static str) -> Option<Action> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor;
        Some(Action::SetCursor(cursor.to_owned()))
    }

    // --- Keyboard ---

    /// Key pressed. Ignored while a text input has focus, while input is
    /// disabled, and unless a placement is selected (not dragged).
    pub fn on_key_down(&mut self, key: &str, text_input_focused: bool) -> Vec<Action> {
        if text_input_focused || !self.accepts_input() {
            return Vec::new();
        }
        let Some(cmd) = KeyCommand::parse(key) else {
            return Vec::new();
        };
        let Interaction::Selected(id) = self.interaction.state() else {
            return Vec::new();
        };

        match cmd {
            KeyCommand::ClearSelection => {
                self.interaction.clear();
                vec![Action::RenderNeeded]
            }
            KeyCommand::Delete => self.remove(id),
            _ => {
                let Some(entry) = self.store.get(id) else {
                    return Vec::new();
                };
                match cmd.patch(&entry.placement.geometry, &self.config) {
                    Some(patch) => self.update(id, &patch),
                    None => Vec::new(),
                }
            }
        }
    }

    // --- Mutations ---

    /// Apply `patch` to a placement and emit the remote update.
    pub fn update(&mut self, id: PlacementId, patch: &PlacementPatch) -> Vec<Action> {
        match self.store.update(id, patch) {
            Ok(Some(ticket)) => vec![Action::RenderNeeded, Action::Sync(SyncRequest::Update(ticket))],
            Ok(None) => vec![Action::RenderNeeded],
            Err(e) => vec![Action::Notice(Notice::warning(e))],
        }
    }

    /// Remove a placement and emit the remote delete.
    pub fn remove(&mut self, id: PlacementId) -> Vec<Action> {
        match self.store.remove(id) {
            Ok(ticket) => {
                self.interaction.on_removed(id);
                if self.gesture.id() == Some(id) {
                    self.gesture = Gesture::Idle;
                }
                let mut actions = vec![Action::RenderNeeded];
                actions.extend(ticket.map(|t| Action::Sync(SyncRequest::Remove(t))));
                actions
            }
            Err(e) => vec![Action::Notice(Notice::warning(e))],
        }
    }

    /// Bind a boat to a placement.
    pub fn assign(&mut self, binding: EntityBinding, id: PlacementId) -> Vec<Action> {
        match self.store.assign(binding, id) {
            Ok(ticket) => vec![Action::RenderNeeded, Action::Sync(SyncRequest::Binding(ticket))],
            Err(e) => vec![Action::Notice(Notice::warning(e))],
        }
    }

    /// Detach the boat bound to a placement.
    pub fn unassign(&mut self, id: PlacementId) -> Vec<Action> {
        match self.store.unassign(id) {
            Ok(Some(ticket)) => vec![Action::RenderNeeded, Action::Sync(SyncRequest::Binding(ticket))],
            Ok(None) => Vec::new(),
            Err(e) => vec![Action::Notice(Notice::warning(e))],
        }
    }

    fn create_at(&mut self, center: Point) -> Vec<Action> {
        let size = self.config.default_size;
        let geometry = Geometry::centered_at(center, size.width, size.height);
        match self.store.create(geometry, self.config.default_style.clone()) {
            Ok(ticket) => vec![Action::RenderNeeded, Action::Sync(SyncRequest::Create(ticket))],
            Err(e) => vec![Action::Notice(Notice::warning(e))],
        }
    }

    // --- Toolbar ---

    /// Add a placement in the middle of the map.
    pub fn add_at_center(&mut self) -> Vec<Action> {
        match self.store.map().map(MapDocument::center) {
            Some(center) => self.add_at(center),
            None => vec![Action::Notice(Notice::warning(StoreError::NoMapLoaded))],
        }
    }

    /// Add a placement centred on an image-space point.
    pub fn add_at(&mut self, center: Point) -> Vec<Action> {
        if !self.interaction.interactive() {
            return Vec::new();
        }
        self.create_at(center)
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        if !self.interaction.interactive() {
            return Vec::new();
        }
        match self.interaction.selected() {
            Some(id) => self.remove(id),
            None => Vec::new(),
        }
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        render_if(self.interaction.zoom_in())
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        render_if(self.interaction.zoom_out())
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        render_if(self.interaction.reset_zoom())
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Vec<Action> {
        render_if(self.interaction.set_zoom(zoom))
    }

    /// Flip canvas input on or off. Turning it off commits a drag in progress.
    pub fn toggle_interactive(&mut self) -> Vec<Action> {
        let enable = !self.interaction.interactive();
        let mut actions = Vec::new();
        if !enable {
            if let Gesture::Dragging { id, .. } = std::mem::take(&mut self.gesture) {
                actions.extend(self.commit_drag(id));
            }
            actions.extend(self.set_cursor(CURSOR_DEFAULT));
        }
        self.interaction.set_interactive(enable);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Network completions ---

    /// Reconcile a finished remote call and keep the selection consistent
    /// with what the store now holds.
    pub fn complete(&mut self, result: SyncResult) -> Vec<Action> {
        let kind = result.kind();
        let mut actions = Vec::new();
        match self.store.complete(result) {
            Ok(completion) => {
                if let Some((from, to)) = completion.confirmed {
                    self.interaction.remap(from, to);
                    self.gesture.remap(from, to);
                }
                if completion.resolved == Resolved::Applied {
                    actions.push(Action::RenderNeeded);
                }
                actions.extend(completion.follow_up.into_iter().map(Action::Sync));
            }
            Err(e) => {
                warn!(kind, error = %e, code = e.error_code(), "sync failed");
                actions.push(Action::Notice(Notice {
                    level: NoticeLevel::Error,
                    code: Some(e.error_code()),
                    message: failure_message(kind, &e.to_string()),
                }));
                actions.push(Action::RenderNeeded);
            }
        }

        self.interaction.retain(&self.store);
        if self.gesture.id().is_some_and(|id| !self.store.contains(id)) {
            self.gesture = Gesture::Idle;
        }
        actions
    }
}

fn render_if(changed: bool) -> Vec<Action> {
    if changed { vec![Action::RenderNeeded] } else { Vec::new() }
}

fn failure_message(kind: &str, detail: &str) -> String {
    match kind {
        "assign" | "unassign" => format!("Failed to {kind} boat: {detail}"),
        _ => format!("Failed to {kind} position: {detail}"),
    }
}
