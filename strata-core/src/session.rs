/// Interactive editing session over one document.
///
/// Composes the store, history and navigator. Every mutation made through
/// the session is recorded for undo; the store's active scope follows the
/// navigator. Pointer gestures, connector drafts and text edits live here
/// until they are released or committed, so the store never sees an
/// intermediate frame.
use tokio::sync::broadcast;

use crate::config::CanvasConfig;
use crate::events::DocumentEvent;
use crate::geometry::{closest_anchors, free_anchor, Rect};
use crate::history::HistoryStack;
use crate::navigator::{BoardNavigator, Crumb};
use crate::storage::{DocumentStorage, StorageError};
use crate::store::{DocumentStore, EdgePatch, ElementPatch, StoreSettings, ValidationError};
use crate::tasks::filter::query;
use crate::tasks::{
    writeback, ProjectionOptions, TaskEdit, TaskFilter, TaskProjection, TaskSort,
};
use crate::types::{
    CanvasEdge, CanvasElement, ElementKind, Point, Scope, Surface, Viewport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize,
}

/// A drag or resize in progress. Only `frame` changes until release.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub element_id: String,
    pub kind: GestureKind,
    pub origin: Rect,
    pub frame: Rect,
}

/// A connector being dragged out of `from_element_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorDraft {
    pub from_element_id: String,
    pub pointer: Point,
}

/// In-place text edit. `original` is restored untouched on cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditSession {
    pub element_id: String,
    pub original: String,
    pub draft: String,
}

pub struct CanvasSession {
    store: DocumentStore,
    history: HistoryStack,
    navigator: BoardNavigator,
    projection: ProjectionOptions,
    config: CanvasConfig,
    gesture: Option<GestureSession>,
    connector: Option<ConnectorDraft>,
    text_edit: Option<TextEditSession>,
}

impl Default for CanvasSession {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasSession {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            store: DocumentStore::new(StoreSettings::from(&config)),
            history: HistoryStack::new(config.history_capacity),
            navigator: BoardNavigator::new(config.default_viewport),
            projection: ProjectionOptions::from(&config),
            config,
            gesture: None,
            connector: None,
            text_edit: None,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn navigator(&self) -> &BoardNavigator {
        &self.navigator
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.store.subscribe()
    }

    // ── History ─────────────────────────────────────────────────────────────

    /// Make sure the snapshot under the cursor is the current state.
    fn checkpoint(&mut self) {
        let in_sync = self
            .history
            .current()
            .is_some_and(|snapshot| self.store.matches_snapshot(snapshot));
        if !in_sync {
            self.history.push(self.store.capture());
        }
    }

    /// Run a store mutation with a snapshot on either side of it.
    fn record<T>(&mut self, op: impl FnOnce(&mut DocumentStore) -> T) -> T {
        self.checkpoint();
        let out = op(&mut self.store);
        self.checkpoint();
        log::trace!(
            "[strata.history.push] {} snapshot(s), index {}",
            self.history.len(),
            self.history.index()
        );
        out
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.checkpoint();
        match self.history.undo() {
            Some(snapshot) => {
                self.store.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.store.restore(snapshot);
                true
            }
            None => false,
        }
    }

    // ── Recorded mutations ──────────────────────────────────────────────────

    pub fn add_element(&mut self, element: CanvasElement) -> Result<String, ValidationError> {
        self.record(|store| store.add_element(element))
    }

    pub fn add_element_in(&mut self, element: CanvasElement, scope: Scope) -> Result<String, ValidationError> {
        self.record(|store| store.add_element_in(element, scope))
    }

    pub fn update_element(&mut self, id: &str, patch: &ElementPatch) -> Result<bool, ValidationError> {
        self.record(|store| store.update_element(id, patch))
    }

    pub fn remove_element(&mut self, id: &str) -> bool {
        self.record(|store| store.remove_element(id))
    }

    pub fn duplicate_element(&mut self, id: &str) -> Option<String> {
        self.record(|store| store.duplicate_element(id))
    }

    pub fn add_edge(&mut self, edge: CanvasEdge) -> Result<Option<String>, ValidationError> {
        self.record(|store| store.add_edge(edge))
    }

    pub fn update_edge(&mut self, id: &str, patch: &EdgePatch) -> Result<bool, ValidationError> {
        self.record(|store| store.update_edge(id, patch))
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        self.record(|store| store.remove_edge(id))
    }

    pub fn duplicate_edge(&mut self, id: &str) -> Option<String> {
        self.record(|store| store.duplicate_edge(id))
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    fn sync_scope(&mut self) {
        self.gesture = None;
        self.connector = None;
        self.store.set_active_scope(self.navigator.active_scope());
    }

    pub fn visible_elements(&self) -> Vec<&CanvasElement> {
        let scope = self.navigator.active_scope();
        self.store.get_elements(scope.board_id.as_deref(), scope.surface)
    }

    pub fn visible_edges(&self) -> Vec<&CanvasEdge> {
        let scope = self.navigator.active_scope();
        self.store.get_edges(scope.board_id.as_deref(), scope.surface)
    }

    /// Create a board nested under the active one.
    pub fn create_board(&mut self, title: &str) -> String {
        let parent = self.navigator.active_board_id().map(str::to_string);
        self.store.add_board(title, parent.as_deref())
    }

    pub fn enter_board(&mut self, id: &str, title: &str) {
        self.navigator.enter_board(id, title);
        self.sync_scope();
    }

    /// Follow a board-link element. Returns false for anything else.
    pub fn open_board_link(&mut self, element_id: &str) -> bool {
        let Some(ElementKind::BoardLink {
            target_board_id,
            title,
        }) = self.store.element(element_id).map(|e| &e.kind)
        else {
            return false;
        };
        let title = self
            .store
            .board(target_board_id)
            .map(|b| b.title.clone())
            .unwrap_or_else(|| title.clone());
        let target = target_board_id.clone();
        self.enter_board(&target, &title);
        true
    }

    pub fn exit_board(&mut self) -> bool {
        let moved = self.navigator.exit_board();
        self.sync_scope();
        moved
    }

    pub fn navigate_to_path(&mut self, index: isize) -> bool {
        let moved = self.navigator.navigate_to_path(index);
        self.sync_scope();
        moved
    }

    /// Rebuild the breadcrumb trail for `board_id` from board records and
    /// jump there.
    pub fn jump_to_board(&mut self, board_id: Option<&str>) {
        let path = board_id
            .map(|id| {
                self.store
                    .board_path(id)
                    .into_iter()
                    .map(|b| Crumb {
                        id: b.id.clone(),
                        title: b.title.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.navigator.reset_path(path);
        self.sync_scope();
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.navigator.set_surface(surface);
        self.sync_scope();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        self.navigator.set_viewport(viewport)
    }

    pub fn viewport(&self) -> Viewport {
        self.navigator.viewport()
    }

    // ── Tasks ───────────────────────────────────────────────────────────────

    pub fn projection_options(&self) -> &ProjectionOptions {
        &self.projection
    }

    /// Project every element in the document, then filter and sort.
    pub fn tasks(&self, filter: &TaskFilter, sort: &TaskSort) -> Vec<TaskProjection> {
        let all = crate::tasks::project_tasks(self.store.elements(), &self.projection);
        query(&all, filter, sort)
    }

    pub fn apply_task_edit(&mut self, task_id: &str, edit: &TaskEdit) -> Result<bool, ValidationError> {
        self.record(|store| writeback::apply_task_edit(store, task_id, edit))
    }

    // ── Gestures ────────────────────────────────────────────────────────────

    pub fn gesture(&self) -> Option<&GestureSession> {
        self.gesture.as_ref()
    }

    /// Start a move or resize. Locked and unknown elements refuse.
    pub fn begin_gesture(&mut self, element_id: &str, kind: GestureKind) -> bool {
        let Some(element) = self.store.element(element_id) else {
            return false;
        };
        if element.locked {
            log::debug!("[strata.session.gesture] {} is locked", element_id);
            return false;
        }
        let origin = element.rect();
        self.gesture = Some(GestureSession {
            element_id: element_id.to_string(),
            kind,
            origin,
            frame: origin,
        });
        true
    }

    /// Preview a pointer delta from the gesture origin. Nothing is written.
    pub fn gesture_frame(&mut self, dx: f64, dy: f64) -> Option<Rect> {
        let gesture = self.gesture.as_mut()?;
        if !dx.is_finite() || !dy.is_finite() {
            return Some(gesture.frame);
        }
        let o = gesture.origin;
        gesture.frame = match gesture.kind {
            GestureKind::Move => Rect::new(o.x + dx, o.y + dy, o.width, o.height),
            GestureKind::Resize => Rect::new(o.x, o.y, (o.width + dx).max(0.0), (o.height + dy).max(0.0)),
        };
        Some(gesture.frame)
    }

    /// Commit the last frame as one update. Returns Ok(false) when there
    /// was no gesture or nothing moved.
    pub fn end_gesture(&mut self) -> Result<bool, ValidationError> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(false);
        };
        if gesture.frame == gesture.origin {
            return Ok(false);
        }
        let patch = match gesture.kind {
            GestureKind::Move => ElementPatch::position(gesture.frame.x, gesture.frame.y),
            GestureKind::Resize => ElementPatch::size(gesture.frame.width, gesture.frame.height),
        };
        self.update_element(&gesture.element_id, &patch)
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = None;
    }

    // ── Connector drafts ────────────────────────────────────────────────────

    pub fn connector_draft(&self) -> Option<&ConnectorDraft> {
        self.connector.as_ref()
    }

    pub fn begin_connector(&mut self, from_element_id: &str) -> bool {
        let Some(element) = self.store.element(from_element_id) else {
            return false;
        };
        self.connector = Some(ConnectorDraft {
            from_element_id: from_element_id.to_string(),
            pointer: element.rect().center(),
        });
        true
    }

    /// Move the loose end. Returns the preview line from the source's
    /// contact point to the pointer.
    pub fn drag_connector(&mut self, pointer: Point) -> Option<(Point, Point)> {
        let draft = self.connector.as_mut()?;
        draft.pointer = pointer;
        let source = self.store.element(&draft.from_element_id)?;
        let (_, contact) = free_anchor(&source.rect(), pointer);
        Some((contact, pointer))
    }

    /// Drop the connector on `to_element_id` and create the edge with
    /// facing anchors. Dropping on the source itself or on nothing creates
    /// no edge.
    pub fn finish_connector(&mut self, to_element_id: &str) -> Result<Option<String>, ValidationError> {
        let Some(draft) = self.connector.take() else {
            return Ok(None);
        };
        if draft.from_element_id == to_element_id {
            return Ok(None);
        }
        let (Some(from), Some(to)) = (
            self.store.element(&draft.from_element_id),
            self.store.element(to_element_id),
        ) else {
            return Ok(None);
        };
        let (from_anchor, to_anchor) = closest_anchors(&from.rect(), &to.rect());
        let edge = CanvasEdge::new(&draft.from_element_id, from_anchor, to_element_id, to_anchor);
        self.add_edge(edge)
    }

    pub fn cancel_connector(&mut self) {
        self.connector = None;
    }

    // ── Text edits ──────────────────────────────────────────────────────────

    pub fn text_edit(&self) -> Option<&TextEditSession> {
        self.text_edit.as_ref()
    }

    /// Enter edit mode on a text-capable element, capturing its current
    /// text. A shape without a label starts from an empty draft.
    pub fn begin_text_edit(&mut self, element_id: &str) -> bool {
        let Some(element) = self.store.element(element_id) else {
            return false;
        };
        if !element.kind.is_text_capable() {
            return false;
        }
        let text = element.text_content().unwrap_or("");
        self.text_edit = Some(TextEditSession {
            element_id: element_id.to_string(),
            original: text.to_string(),
            draft: text.to_string(),
        });
        true
    }

    pub fn update_text_draft(&mut self, text: &str) -> bool {
        match self.text_edit.as_mut() {
            Some(edit) => {
                edit.draft = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Write the draft as one recorded update.
    pub fn commit_text_edit(&mut self) -> Result<bool, ValidationError> {
        let Some(edit) = self.text_edit.take() else {
            return Ok(false);
        };
        if edit.draft == edit.original {
            return Ok(false);
        }
        self.update_element(&edit.element_id, &ElementPatch::content(&edit.draft))
    }

    /// Leave edit mode. The element keeps its pre-edit text; returns that
    /// text, or None when no edit was active.
    pub fn cancel_text_edit(&mut self) -> Option<String> {
        self.text_edit.take().map(|edit| edit.original)
    }

    // ── Persistence ─────────────────────────────────────────────────────────

    /// Replace the document with the stored one and start a fresh history.
    /// On failure the current document stays as it was.
    pub fn load_from(&mut self, storage: &dyn DocumentStorage) -> Result<bool, StorageError> {
        match storage.load() {
            Ok(Some(document)) => {
                self.gesture = None;
                self.connector = None;
                self.text_edit = None;
                self.store.load(document);
                self.history.clear();
                self.history.push(self.store.capture());
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                log::warn!("[strata.session.load] Keeping last known-good document: {}", e);
                Err(e)
            }
        }
    }

    pub fn save_to(&self, storage: &dyn DocumentStorage) -> Result<bool, StorageError> {
        storage.save(&self.store.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Anchor;

    #[test]
    fn test_gesture_commits_once_on_release() {
        let mut session = CanvasSession::default();
        let id = session.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let history_len = session.history().len();

        assert!(session.begin_gesture(&id, GestureKind::Move));
        for step in 1..=10 {
            session.gesture_frame(step as f64 * 5.0, 0.0);
        }
        assert_eq!(session.store().element(&id).unwrap().x, 0.0);
        assert_eq!(session.end_gesture(), Ok(true));
        assert_eq!(session.store().element(&id).unwrap().x, 50.0);
        assert_eq!(session.history().len(), history_len + 1);
    }

    #[test]
    fn test_locked_element_refuses_gesture() {
        let mut session = CanvasSession::default();
        let mut element = CanvasElement::card("a", 0.0, 0.0);
        element.locked = true;
        let id = session.add_element(element).unwrap();
        assert!(!session.begin_gesture(&id, GestureKind::Resize));
        assert_eq!(session.end_gesture(), Ok(false));
    }

    #[test]
    fn test_resize_gesture_clamps_to_zero() {
        let mut session = CanvasSession::default();
        let id = session.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        session.begin_gesture(&id, GestureKind::Resize);
        let frame = session.gesture_frame(-1000.0, 30.0).unwrap();
        assert_eq!(frame.width, 0.0);
        assert_eq!(frame.height, 150.0);
    }

    #[test]
    fn test_connector_uses_closest_anchors() {
        let mut session = CanvasSession::default();
        let a = session.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let b = session.add_element(CanvasElement::card("b", 600.0, 40.0)).unwrap();
        assert!(session.begin_connector(&a));
        let (start, _) = session.drag_connector(Point::new(500.0, 60.0)).unwrap();
        assert_eq!(start, Point::new(200.0, 60.0));

        let edge_id = session.finish_connector(&b).unwrap().unwrap();
        let edge = session.store().edge(&edge_id).unwrap();
        assert_eq!((edge.from_anchor, edge.to_anchor), (Anchor::Right, Anchor::Left));
        assert!(session.connector_draft().is_none());
    }

    #[test]
    fn test_connector_dropped_on_source_creates_nothing() {
        let mut session = CanvasSession::default();
        let a = session.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        session.begin_connector(&a);
        assert_eq!(session.finish_connector(&a), Ok(None));
        assert!(session.store().edges().is_empty());
    }

    #[test]
    fn test_cancelled_text_edit_restores_original() {
        let mut session = CanvasSession::default();
        let original = "  Title\n- [ ] keep exact  ";
        let id = session.add_element(CanvasElement::card(original, 0.0, 0.0)).unwrap();
        let history_len = session.history().len();

        assert!(session.begin_text_edit(&id));
        session.update_text_draft("half-typed");
        assert_eq!(session.cancel_text_edit().as_deref(), Some(original));
        assert_eq!(session.store().element(&id).unwrap().text_content(), Some(original));
        assert_eq!(session.history().len(), history_len);
    }

    #[test]
    fn test_committed_text_edit_is_undoable() {
        let mut session = CanvasSession::default();
        let id = session.add_element(CanvasElement::card("before", 0.0, 0.0)).unwrap();
        session.begin_text_edit(&id);
        session.update_text_draft("after");
        assert_eq!(session.commit_text_edit(), Ok(true));
        assert_eq!(session.store().element(&id).unwrap().text_content(), Some("after"));
        assert!(session.undo());
        assert_eq!(session.store().element(&id).unwrap().text_content(), Some("before"));
    }

    #[test]
    fn test_unlabelled_shape_accepts_first_label() {
        let mut session = CanvasSession::default();
        let shape = ElementKind::Shape {
            shape: Default::default(),
            content: None,
            fill: None,
        };
        let id = session
            .add_element(CanvasElement::new(shape, 0.0, 0.0, 80.0, 80.0))
            .unwrap();
        assert!(session.begin_text_edit(&id));
        assert_eq!(session.text_edit().unwrap().draft, "");
        session.update_text_draft("Start");
        assert_eq!(session.commit_text_edit(), Ok(true));
        assert_eq!(session.store().element(&id).unwrap().text_content(), Some("Start"));

        let image = CanvasElement::new(
            ElementKind::Image {
                src: "a.png".into(),
                alt: None,
            },
            0.0,
            0.0,
            10.0,
            10.0,
        );
        let image = session.add_element(image).unwrap();
        assert!(!session.begin_text_edit(&image));
    }

    #[test]
    fn test_board_link_opens_target() {
        let mut session = CanvasSession::default();
        let board = session.create_board("Research");
        let link = session
            .add_element(CanvasElement::new(
                ElementKind::BoardLink {
                    target_board_id: board.clone(),
                    title: String::new(),
                },
                0.0,
                0.0,
                120.0,
                40.0,
            ))
            .unwrap();
        assert!(session.open_board_link(&link));
        assert_eq!(session.navigator().active_board_id(), Some(board.as_str()));
        assert_eq!(session.navigator().path()[0].title, "Research");
        assert!(session.visible_elements().is_empty());
    }

    #[test]
    fn test_jump_to_board_rebuilds_breadcrumbs() {
        let mut session = CanvasSession::default();
        let outer = session.create_board("Outer");
        session.enter_board(&outer, "Outer");
        let inner = session.create_board("Inner");
        session.navigate_to_path(-1);

        session.jump_to_board(Some(&inner));
        let titles: Vec<&str> = session.navigator().path().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Outer", "Inner"]);
        assert_eq!(session.store().active_scope(), &Scope::board(&inner));
    }
}
