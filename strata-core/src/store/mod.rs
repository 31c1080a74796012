/// Document store: the canonical element, edge and board lists.
///
/// Every other component reads through here. Queries are scope-filtered by
/// (board, surface). Operations that reference an unknown id are silent
/// no-ops; malformed geometry is rejected with a `ValidationError` before
/// anything changes.
pub mod patch;

pub use patch::{validate_edge, validate_element, EdgePatch, ElementPatch};

use crate::config::CanvasConfig;
use crate::events::{DocumentEvent, EventHub};
use crate::geometry::container::{fit_containers, ContainerLayout};
use crate::history::Snapshot;
use crate::identity::{generate_id, timestamp_millis};
use crate::types::{
    Board, CanvasDocument, CanvasEdge, CanvasElement, Scope, Surface, CURRENT_DOCUMENT_VERSION,
};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Non-finite {field} on {id}: {value}")]
    NonFinite {
        id: String,
        field: &'static str,
        value: f64,
    },

    #[error("Negative {field} on {id}: {value}")]
    NegativeSize {
        id: String,
        field: &'static str,
        value: f64,
    },

    #[error("Element {0} cannot contain itself")]
    SelfContainment(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}

/// Store-level knobs derived from `CanvasConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    pub layout: ContainerLayout,
    pub duplicate_offset: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&CanvasConfig::default())
    }
}

impl From<&CanvasConfig> for StoreSettings {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            layout: ContainerLayout {
                padding: config.container_padding,
                header_height: config.container_header_height,
            },
            duplicate_offset: config.duplicate_offset,
        }
    }
}

#[derive(Debug)]
pub struct DocumentStore {
    elements: Vec<CanvasElement>,
    edges: Vec<CanvasEdge>,
    boards: Vec<Board>,
    active_scope: Scope,
    last_modified: u64,
    settings: StoreSettings,
    events: EventHub,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl DocumentStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            elements: Vec::new(),
            edges: Vec::new(),
            boards: Vec::new(),
            active_scope: Scope::root(),
            last_modified: 0,
            settings,
            events: EventHub::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    pub fn active_scope(&self) -> &Scope {
        &self.active_scope
    }

    /// Scope that `add_*` assigns to entities that don't carry one.
    pub fn set_active_scope(&mut self, scope: Scope) {
        self.active_scope = scope;
    }

    /// Unix-ms timestamp of the last structural mutation. Strictly increases
    /// with every mutation.
    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    fn touch(&mut self) {
        self.last_modified = timestamp_millis().max(self.last_modified.saturating_add(1));
    }

    // ── Elements ────────────────────────────────────────────────────────────

    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Elements visible in the given scope, in paint order (z-index, then
    /// insertion order).
    pub fn get_elements(&self, board_id: Option<&str>, surface: Surface) -> Vec<&CanvasElement> {
        let mut found: Vec<&CanvasElement> = self
            .elements
            .iter()
            .filter(|e| e.in_scope(board_id, surface))
            .collect();
        found.sort_by_key(|e| e.z_index);
        found
    }

    pub fn children_of(&self, container_id: &str) -> Vec<&CanvasElement> {
        self.elements
            .iter()
            .filter(|e| e.container_id.as_deref() == Some(container_id))
            .collect()
    }

    /// Add an element. An unset board or surface takes the active one.
    /// Returns the element's id.
    pub fn add_element(&mut self, mut element: CanvasElement) -> Result<String, ValidationError> {
        if element.board_id.is_none() {
            element.board_id = self.active_scope.board_id.clone();
        }
        if element.surface.is_none() {
            element.surface = Some(self.active_scope.surface);
        }
        self.insert_element(element)
    }

    /// Add an element into an explicit scope, ignoring the active one.
    pub fn add_element_in(
        &mut self,
        mut element: CanvasElement,
        scope: Scope,
    ) -> Result<String, ValidationError> {
        element.board_id = scope.board_id;
        element.surface = Some(scope.surface);
        self.insert_element(element)
    }

    fn insert_element(&mut self, mut element: CanvasElement) -> Result<String, ValidationError> {
        validate_element(&element)?;
        if element.id.is_empty() {
            element.id = self.fresh_element_id();
        } else if self.element(&element.id).is_some() {
            return Err(ValidationError::DuplicateId(element.id));
        }
        if element.z_index == 0 {
            element.z_index = self.top_z_index(&element.scope()).saturating_add(1);
        }

        let id = element.id.clone();
        let container_id = element.container_id.clone();
        log::debug!(
            "[strata.store.add] {} {} in {:?}",
            element.kind.type_name(),
            id,
            element.scope()
        );
        self.elements.push(element);
        if let Some(container_id) = container_id {
            fit_containers(&mut self.elements, &container_id, self.settings.layout);
        }
        self.touch();
        self.events.emit(DocumentEvent::ElementAdded { id: id.clone() });
        Ok(id)
    }

    fn fresh_element_id(&self) -> String {
        let mut id = generate_id("el");
        while self.element(&id).is_some() {
            id = generate_id("el");
        }
        id
    }

    fn top_z_index(&self, scope: &Scope) -> i32 {
        self.elements
            .iter()
            .filter(|e| e.in_scope(scope.board_id.as_deref(), scope.surface))
            .map(|e| e.z_index)
            .max()
            .unwrap_or(0)
    }

    /// Shallow-merge `patch` into the element. Unknown ids return
    /// `Ok(false)` without touching anything.
    pub fn update_element(&mut self, id: &str, patch: &ElementPatch) -> Result<bool, ValidationError> {
        patch.validate(id)?;
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            log::debug!("[strata.store.update] Unknown element {}", id);
            return Ok(false);
        };

        patch.apply(&mut self.elements[index]);
        if patch.touches_geometry() {
            if let Some(container_id) = self.elements[index].container_id.clone() {
                fit_containers(&mut self.elements, &container_id, self.settings.layout);
            }
        }
        self.touch();
        self.events.emit(DocumentEvent::ElementUpdated { id: id.to_string() });
        Ok(true)
    }

    /// Remove an element together with every edge attached to it. Children
    /// of a removed container are detached, not removed.
    pub fn remove_element(&mut self, id: &str) -> bool {
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            log::debug!("[strata.store.remove] Unknown element {}", id);
            return false;
        };
        self.elements.remove(index);

        let (dropped, kept): (Vec<CanvasEdge>, Vec<CanvasEdge>) =
            std::mem::take(&mut self.edges).into_iter().partition(|e| e.touches(id));
        self.edges = kept;
        for edge in dropped {
            self.events.emit(DocumentEvent::EdgeRemoved { id: edge.id });
        }

        for child in self
            .elements
            .iter_mut()
            .filter(|e| e.container_id.as_deref() == Some(id))
        {
            child.container_id = None;
        }

        self.touch();
        self.events.emit(DocumentEvent::ElementRemoved { id: id.to_string() });
        true
    }

    /// Copy an element under a new id, offset on both axes, in the same
    /// scope and container. Returns None for unknown ids.
    pub fn duplicate_element(&mut self, id: &str) -> Option<String> {
        let mut copy = self.element(id)?.clone();
        copy.id = self.fresh_element_id();
        copy.x += self.settings.duplicate_offset;
        copy.y += self.settings.duplicate_offset;
        copy.z_index = self.top_z_index(&copy.scope()).saturating_add(1);

        let new_id = copy.id.clone();
        let container_id = copy.container_id.clone();
        self.elements.push(copy);
        if let Some(container_id) = container_id {
            fit_containers(&mut self.elements, &container_id, self.settings.layout);
        }
        log::debug!("[strata.store.duplicate] {} -> {}", id, new_id);
        self.touch();
        self.events.emit(DocumentEvent::ElementAdded { id: new_id.clone() });
        Some(new_id)
    }

    // ── Edges ───────────────────────────────────────────────────────────────

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    pub fn edge(&self, id: &str) -> Option<&CanvasEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn get_edges(&self, board_id: Option<&str>, surface: Surface) -> Vec<&CanvasEdge> {
        self.edges
            .iter()
            .filter(|e| e.in_scope(board_id, surface))
            .collect()
    }

    /// Add an edge, scoped like `add_element`. Edges whose endpoints don't
    /// exist are dropped and `Ok(None)` is returned.
    pub fn add_edge(&mut self, mut edge: CanvasEdge) -> Result<Option<String>, ValidationError> {
        if edge.board_id.is_none() {
            edge.board_id = self.active_scope.board_id.clone();
        }
        if edge.surface.is_none() {
            edge.surface = Some(self.active_scope.surface);
        }
        self.insert_edge(edge)
    }

    pub fn add_edge_in(
        &mut self,
        mut edge: CanvasEdge,
        scope: Scope,
    ) -> Result<Option<String>, ValidationError> {
        edge.board_id = scope.board_id;
        edge.surface = Some(scope.surface);
        self.insert_edge(edge)
    }

    fn insert_edge(&mut self, mut edge: CanvasEdge) -> Result<Option<String>, ValidationError> {
        validate_edge(&edge)?;
        if self.element(&edge.from_node_id).is_none() || self.element(&edge.to_node_id).is_none() {
            log::debug!(
                "[strata.store.add_edge] Unknown endpoint {} -> {}",
                edge.from_node_id,
                edge.to_node_id
            );
            return Ok(None);
        }
        if edge.id.is_empty() {
            edge.id = self.fresh_edge_id();
        } else if self.edge(&edge.id).is_some() {
            return Err(ValidationError::DuplicateId(edge.id));
        }

        let id = edge.id.clone();
        self.edges.push(edge);
        self.touch();
        self.events.emit(DocumentEvent::EdgeAdded { id: id.clone() });
        Ok(Some(id))
    }

    fn fresh_edge_id(&self) -> String {
        let mut id = generate_id("edge");
        while self.edge(&id).is_some() {
            id = generate_id("edge");
        }
        id
    }

    pub fn update_edge(&mut self, id: &str, patch: &EdgePatch) -> Result<bool, ValidationError> {
        patch.validate(id)?;
        let rewires_to_unknown = [&patch.from_node_id, &patch.to_node_id]
            .into_iter()
            .flatten()
            .any(|node| self.element(node).is_none());
        if rewires_to_unknown {
            log::debug!("[strata.store.update_edge] Edge {} rewired to unknown node", id);
            return Ok(false);
        }
        let Some(edge) = self.edges.iter_mut().find(|e| e.id == id) else {
            log::debug!("[strata.store.update_edge] Unknown edge {}", id);
            return Ok(false);
        };

        patch.apply(edge);
        self.touch();
        self.events.emit(DocumentEvent::EdgeUpdated { id: id.to_string() });
        Ok(true)
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let Some(index) = self.edges.iter().position(|e| e.id == id) else {
            return false;
        };
        self.edges.remove(index);
        self.touch();
        self.events.emit(DocumentEvent::EdgeRemoved { id: id.to_string() });
        true
    }

    /// Copy an edge under a new id between the same endpoints. A curved
    /// edge's control point is offset like a duplicated element.
    pub fn duplicate_edge(&mut self, id: &str) -> Option<String> {
        let mut copy = self.edge(id)?.clone();
        copy.id = self.fresh_edge_id();
        if let Some(point) = copy.control_point.as_mut() {
            point.x += self.settings.duplicate_offset;
            point.y += self.settings.duplicate_offset;
        }
        let new_id = copy.id.clone();
        self.edges.push(copy);
        self.touch();
        self.events.emit(DocumentEvent::EdgeAdded { id: new_id.clone() });
        Some(new_id)
    }

    // ── Boards ──────────────────────────────────────────────────────────────

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn board(&self, id: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == id)
    }

    pub fn child_boards(&self, parent_board_id: Option<&str>) -> Vec<&Board> {
        self.boards
            .iter()
            .filter(|b| b.parent_board_id.as_deref() == parent_board_id)
            .collect()
    }

    /// Create a board record and return its id.
    pub fn add_board(&mut self, title: &str, parent_board_id: Option<&str>) -> String {
        let mut id = generate_id("board");
        while self.board(&id).is_some() {
            id = generate_id("board");
        }
        let now = timestamp_millis();
        let board = Board {
            id,
            parent_board_id: parent_board_id.map(str::to_string),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = board.id.clone();
        self.boards.push(board);
        self.touch();
        self.events.emit(DocumentEvent::BoardChanged { id: id.clone() });
        id
    }

    /// Insert or replace a board record by id.
    pub fn upsert_board(&mut self, board: Board) {
        let id = board.id.clone();
        match self.boards.iter_mut().find(|b| b.id == board.id) {
            Some(existing) => *existing = board,
            None => self.boards.push(board),
        }
        self.touch();
        self.events.emit(DocumentEvent::BoardChanged { id });
    }

    pub fn rename_board(&mut self, id: &str, title: &str) -> bool {
        let Some(board) = self.boards.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        board.title = title.to_string();
        board.updated_at = timestamp_millis();
        self.touch();
        self.events.emit(DocumentEvent::BoardChanged { id: id.to_string() });
        true
    }

    /// Boards from the outermost ancestor down to `id`. Stops at missing
    /// parents and at parent cycles.
    pub fn board_path(&self, id: &str) -> Vec<&Board> {
        let mut path: Vec<&Board> = Vec::new();
        let mut current = self.board(id);
        while let Some(board) = current {
            if path.iter().any(|b| b.id == board.id) {
                break;
            }
            path.push(board);
            current = board
                .parent_board_id
                .as_deref()
                .and_then(|parent| self.board(parent));
        }
        path.reverse();
        path
    }

    // ── Snapshots ───────────────────────────────────────────────────────────

    /// Deep copy of the structural contents, for the history engine.
    pub fn capture(&self) -> Snapshot {
        Snapshot {
            elements: self.elements.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn matches_snapshot(&self, snapshot: &Snapshot) -> bool {
        self.elements == snapshot.elements && self.edges == snapshot.edges
    }

    /// Replace elements and edges with a history snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.elements = snapshot.elements.clone();
        self.edges = snapshot.edges.clone();
        self.touch();
        self.events.emit(DocumentEvent::Restored);
    }

    /// Full serializable document for persistence and export.
    pub fn snapshot(&self) -> CanvasDocument {
        CanvasDocument {
            version: CURRENT_DOCUMENT_VERSION,
            elements: self.elements.clone(),
            edges: self.edges.clone(),
            boards: self.boards.clone(),
            last_modified: self.last_modified,
        }
    }

    /// Replace the whole document. Expects the current document shape; run
    /// `migrate::upgrade` first for anything read from storage.
    pub fn load(&mut self, document: CanvasDocument) {
        log::info!(
            "[strata.store.load] {} elements, {} edges, {} boards",
            document.elements.len(),
            document.edges.len(),
            document.boards.len()
        );
        self.elements = document.elements;
        self.edges = document.edges;
        self.boards = document.boards;
        self.last_modified = document.last_modified;
        self.events.emit(DocumentEvent::Restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Anchor, ElementKind, Point};

    fn container(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
        CanvasElement::new(
            ElementKind::Container {
                title: "Group".into(),
                collapsed: false,
            },
            x,
            y,
            w,
            h,
        )
        .with_id(id)
    }

    #[test]
    fn test_add_assigns_active_scope() {
        let mut store = DocumentStore::default();
        store.set_active_scope(Scope::new(Some("b1"), Surface::Experience));
        let id = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let element = store.element(&id).unwrap();
        assert_eq!(element.board_id.as_deref(), Some("b1"));
        assert_eq!(element.surface, Some(Surface::Experience));
    }

    #[test]
    fn test_add_keeps_explicit_canvas_surface() {
        let mut store = DocumentStore::default();
        store.set_active_scope(Scope::new(None, Surface::Experience));
        let card = store
            .add_element(CanvasElement::card("a", 0.0, 0.0).on_surface(Surface::Canvas))
            .unwrap();
        let other = store.add_element(CanvasElement::card("b", 0.0, 0.0)).unwrap();
        assert_eq!(store.element(&card).unwrap().surface(), Surface::Canvas);
        assert_eq!(store.element(&other).unwrap().surface(), Surface::Experience);

        let mut edge = CanvasEdge::new(&card, Anchor::Right, &other, Anchor::Left);
        edge.surface = Some(Surface::Canvas);
        let edge = store.add_edge(edge).unwrap().unwrap();
        assert_eq!(store.get_edges(None, Surface::Canvas).len(), 1);
        assert_eq!(store.edge(&edge).unwrap().surface(), Surface::Canvas);
    }

    #[test]
    fn test_add_keeps_explicit_board() {
        let mut store = DocumentStore::default();
        store.set_active_scope(Scope::board("b1"));
        let mut element = CanvasElement::card("a", 0.0, 0.0);
        element.board_id = Some("b2".into());
        let id = store.add_element(element).unwrap();
        assert_eq!(store.element(&id).unwrap().board_id.as_deref(), Some("b2"));
    }

    #[test]
    fn test_add_in_root_scope_while_board_active() {
        let mut store = DocumentStore::default();
        store.set_active_scope(Scope::board("b1"));
        let id = store
            .add_element_in(CanvasElement::card("a", 0.0, 0.0), Scope::root())
            .unwrap();
        assert_eq!(store.element(&id).unwrap().board_id, None);
    }

    #[test]
    fn test_scope_query_returns_exactly_matching() {
        let mut store = DocumentStore::default();
        let root = store.add_element(CanvasElement::card("root", 0.0, 0.0)).unwrap();
        store.set_active_scope(Scope::board("b1"));
        let nested = store.add_element(CanvasElement::card("nested", 0.0, 0.0)).unwrap();
        store.set_active_scope(Scope::new(Some("b1"), Surface::Experience));
        let exp = store.add_element(CanvasElement::card("exp", 0.0, 0.0)).unwrap();

        let ids = |v: Vec<&CanvasElement>| v.into_iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(store.get_elements(None, Surface::Canvas)), vec![root]);
        assert_eq!(ids(store.get_elements(Some("b1"), Surface::Canvas)), vec![nested]);
        assert_eq!(ids(store.get_elements(Some("b1"), Surface::Experience)), vec![exp]);
        assert!(store.get_elements(None, Surface::Experience).is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = DocumentStore::default();
        store.add_element(CanvasElement::card("a", 0.0, 0.0).with_id("x")).unwrap();
        let err = store
            .add_element(CanvasElement::card("b", 0.0, 0.0).with_id("x"))
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateId("x".into()));
        assert_eq!(store.elements().len(), 1);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut store = DocumentStore::default();
        let before = store.last_modified();
        assert_eq!(store.update_element("nope", &ElementPatch::position(1.0, 1.0)), Ok(false));
        assert_eq!(store.last_modified(), before);
    }

    #[test]
    fn test_update_rejects_invalid_patch_before_mutation() {
        let mut store = DocumentStore::default();
        let id = store.add_element(CanvasElement::card("a", 5.0, 5.0)).unwrap();
        let patch = ElementPatch {
            x: Some(50.0),
            y: Some(f64::NAN),
            ..ElementPatch::default()
        };
        assert!(store.update_element(&id, &patch).is_err());
        assert_eq!(store.element(&id).unwrap().x, 5.0);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut store = DocumentStore::default();
        store.add_element(container("c", 0.0, 0.0, 100.0, 100.0)).unwrap();
        let id = store
            .add_element(CanvasElement::card("a", 10.0, 50.0).in_container("c"))
            .unwrap();
        let patch = ElementPatch {
            x: Some(300.0),
            content: Some("- [ ] new".into()),
            ..ElementPatch::default()
        };
        store.update_element(&id, &patch).unwrap();
        let once = store.capture();
        store.update_element(&id, &patch).unwrap();
        assert!(store.matches_snapshot(&once));
    }

    #[test]
    fn test_child_move_expands_container() {
        let mut store = DocumentStore::default();
        store.add_element(container("c", 0.0, 0.0, 300.0, 300.0)).unwrap();
        let child = store
            .add_element(CanvasElement::card("a", 10.0, 50.0).in_container("c"))
            .unwrap();
        store
            .update_element(&child, &ElementPatch::position(500.0, 600.0))
            .unwrap();

        let c = store.element("c").unwrap();
        let k = store.element(&child).unwrap().clone();
        assert_eq!(c.width, 500.0 + k.width + 20.0);
        assert_eq!(c.height, 600.0 + k.height + 20.0 + 40.0);

        // Moving back inward does not shrink.
        store
            .update_element(&child, &ElementPatch::position(10.0, 50.0))
            .unwrap();
        assert_eq!(store.element("c").unwrap().width, 500.0 + k.width + 20.0);
    }

    #[test]
    fn test_remove_element_drops_edges_and_detaches_children() {
        let mut store = DocumentStore::default();
        store.add_element(container("c", 0.0, 0.0, 300.0, 300.0)).unwrap();
        let a = store
            .add_element(CanvasElement::card("a", 10.0, 50.0).in_container("c"))
            .unwrap();
        let b = store.add_element(CanvasElement::card("b", 500.0, 50.0)).unwrap();
        store
            .add_edge(CanvasEdge::new("c", Anchor::Right, &b, Anchor::Left))
            .unwrap()
            .unwrap();
        store
            .add_edge(CanvasEdge::new(&a, Anchor::Right, &b, Anchor::Left))
            .unwrap()
            .unwrap();

        assert!(store.remove_element("c"));
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.element(&a).unwrap().container_id, None);
        assert!(!store.remove_element("c"));
    }

    #[test]
    fn test_duplicate_offsets_and_keeps_scope() {
        let mut store = DocumentStore::default();
        store.set_active_scope(Scope::board("b1"));
        let id = store.add_element(CanvasElement::card("a", 10.0, 10.0)).unwrap();
        let copy = store.duplicate_element(&id).unwrap();
        assert_ne!(copy, id);
        let copy = store.element(&copy).unwrap();
        assert_eq!((copy.x, copy.y), (30.0, 30.0));
        assert_eq!(copy.board_id.as_deref(), Some("b1"));
        assert!(store.duplicate_element("missing").is_none());
    }

    #[test]
    fn test_z_index_saturates_at_max() {
        let mut store = DocumentStore::default();
        let mut top = CanvasElement::card("a", 0.0, 0.0);
        top.z_index = i32::MAX;
        let id = store.add_element(top).unwrap();

        let copy = store.duplicate_element(&id).unwrap();
        assert_eq!(store.element(&copy).unwrap().z_index, i32::MAX);
        let added = store.add_element(CanvasElement::card("b", 0.0, 0.0)).unwrap();
        assert_eq!(store.element(&added).unwrap().z_index, i32::MAX);
    }

    #[test]
    fn test_last_modified_saturates() {
        let mut store = DocumentStore::default();
        store.load(CanvasDocument {
            last_modified: u64::MAX,
            ..CanvasDocument::default()
        });
        store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        assert_eq!(store.last_modified(), u64::MAX);
    }

    #[test]
    fn test_generated_ids_stay_unique() {
        let mut store = DocumentStore::default();
        let id = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        for _ in 0..200 {
            store.duplicate_element(&id).unwrap();
        }
        let mut ids: Vec<&str> = store.elements().iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 201);
    }

    #[test]
    fn test_add_edge_with_unknown_endpoint_is_noop() {
        let mut store = DocumentStore::default();
        let a = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let result = store.add_edge(CanvasEdge::new(&a, Anchor::Right, "ghost", Anchor::Left));
        assert_eq!(result, Ok(None));
        assert!(store.edges().is_empty());
    }

    #[test]
    fn test_edge_scope_and_duplicate() {
        let mut store = DocumentStore::default();
        store.set_active_scope(Scope::board("b1"));
        let a = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let b = store.add_element(CanvasElement::card("b", 400.0, 0.0)).unwrap();
        let mut edge = CanvasEdge::new(&a, Anchor::Right, &b, Anchor::Left);
        edge.control_point = Some(Point::new(200.0, -50.0));
        let id = store.add_edge(edge).unwrap().unwrap();

        assert_eq!(store.get_edges(Some("b1"), Surface::Canvas).len(), 1);
        assert!(store.get_edges(None, Surface::Canvas).is_empty());

        let copy = store.duplicate_edge(&id).unwrap();
        assert_eq!(
            store.edge(&copy).unwrap().control_point,
            Some(Point::new(220.0, -30.0))
        );
    }

    #[test]
    fn test_update_edge_rewire_to_unknown_is_noop() {
        let mut store = DocumentStore::default();
        let a = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let b = store.add_element(CanvasElement::card("b", 400.0, 0.0)).unwrap();
        let id = store
            .add_edge(CanvasEdge::new(&a, Anchor::Right, &b, Anchor::Left))
            .unwrap()
            .unwrap();
        let patch = EdgePatch {
            to_node_id: Some("ghost".into()),
            ..EdgePatch::default()
        };
        assert_eq!(store.update_edge(&id, &patch), Ok(false));
        assert_eq!(store.edge(&id).unwrap().to_node_id, b);
        assert_eq!(
            store.update_edge(&id, &EdgePatch::anchors(Anchor::Bottom, Anchor::Top)),
            Ok(true)
        );
    }

    #[test]
    fn test_mutations_bump_last_modified() {
        let mut store = DocumentStore::default();
        let t0 = store.last_modified();
        let id = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        let t1 = store.last_modified();
        assert!(t1 > t0);
        store.remove_element(&id);
        assert!(store.last_modified() > t1);
    }

    #[test]
    fn test_board_path_walks_parents() {
        let mut store = DocumentStore::default();
        let outer = store.add_board("Outer", None);
        let inner = store.add_board("Inner", Some(&outer));
        let titles: Vec<&str> = store.board_path(&inner).iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Outer", "Inner"]);
        assert_eq!(store.child_boards(Some(&outer)).len(), 1);
        assert!(store.rename_board(&inner, "Renamed"));
        assert!(!store.rename_board("missing", "x"));
    }

    #[test]
    fn test_events_emitted() {
        let mut store = DocumentStore::default();
        let mut rx = store.subscribe();
        let id = store.add_element(CanvasElement::card("a", 0.0, 0.0)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), DocumentEvent::ElementAdded { id });
    }
}
