use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Document format version written by this crate.
/// Older documents are brought up to this shape by `migrate::upgrade`.
pub const CURRENT_DOCUMENT_VERSION: u32 = 2;

/// One of the two independent coordinate spaces. Elements on different
/// surfaces never mix, even when they share a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    #[default]
    Canvas,
    Experience,
}

/// Visibility scope: a board (None = root) on one surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub board_id: Option<String>,
    pub surface: Surface,
}

impl Scope {
    pub fn new(board_id: Option<&str>, surface: Surface) -> Self {
        Self {
            board_id: board_id.map(str::to_string),
            surface,
        }
    }

    /// The root board on the canvas surface.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn board(board_id: &str) -> Self {
        Self::new(Some(board_id), Surface::Canvas)
    }

    pub fn matches(&self, board_id: Option<&str>, surface: Surface) -> bool {
        self.board_id.as_deref() == board_id && self.surface == surface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cardinal connection point on an element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
}

impl Anchor {
    /// Tie-break order used when two edges are equally close.
    pub const ALL: [Anchor; 4] = [Anchor::Top, Anchor::Right, Anchor::Bottom, Anchor::Left];

    pub fn opposite(self) -> Self {
        match self {
            Anchor::Top => Anchor::Bottom,
            Anchor::Right => Anchor::Left,
            Anchor::Bottom => Anchor::Top,
            Anchor::Left => Anchor::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
}

/// Variant payload of a canvas element. Serialized inline with the element,
/// discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    FreeformCard {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Shape {
        #[serde(default)]
        shape: ShapeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },
    Container {
        #[serde(default)]
        title: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        collapsed: bool,
    },
    #[serde(rename_all = "camelCase")]
    Connector {
        start: Point,
        end: Point,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_element_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_element_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Line {
        #[serde(default)]
        points: Vec<Point>,
        #[serde(default = "default_stroke_width")]
        stroke_width: f64,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
    },
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    BoardLink {
        target_board_id: String,
        #[serde(default)]
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    ExperienceBlock {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_kind: Option<String>,
    },
}

fn default_stroke_width() -> f64 {
    2.0
}

impl ElementKind {
    /// The serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::FreeformCard { .. } => "freeform-card",
            ElementKind::Image { .. } => "image",
            ElementKind::Shape { .. } => "shape",
            ElementKind::Container { .. } => "container",
            ElementKind::Connector { .. } => "connector",
            ElementKind::Line { .. } => "line",
            ElementKind::Text { .. } => "text",
            ElementKind::Link { .. } => "link",
            ElementKind::BoardLink { .. } => "board-link",
            ElementKind::ExperienceBlock { .. } => "experience-block",
        }
    }

    /// Free-form text carried by the element, if its kind has any.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            ElementKind::FreeformCard { content, .. }
            | ElementKind::Text { content, .. }
            | ElementKind::ExperienceBlock { content, .. } => Some(content),
            ElementKind::Shape { content, .. } => content.as_deref(),
            ElementKind::Image { .. }
            | ElementKind::Container { .. }
            | ElementKind::Connector { .. }
            | ElementKind::Line { .. }
            | ElementKind::Link { .. }
            | ElementKind::BoardLink { .. } => None,
        }
    }

    /// Kinds that can carry body text, whether or not they have any yet.
    pub fn is_text_capable(&self) -> bool {
        matches!(
            self,
            ElementKind::FreeformCard { .. }
                | ElementKind::Text { .. }
                | ElementKind::ExperienceBlock { .. }
                | ElementKind::Shape { .. }
        )
    }

    /// Replace the text of a text-bearing kind. Returns false for kinds
    /// that carry no text.
    pub fn set_text_content(&mut self, text: &str) -> bool {
        match self {
            ElementKind::FreeformCard { content, .. }
            | ElementKind::Text { content, .. }
            | ElementKind::ExperienceBlock { content, .. } => {
                *content = text.to_string();
                true
            }
            ElementKind::Shape { content, .. } => {
                *content = Some(text.to_string());
                true
            }
            ElementKind::Image { .. }
            | ElementKind::Container { .. }
            | ElementKind::Connector { .. }
            | ElementKind::Line { .. }
            | ElementKind::Link { .. }
            | ElementKind::BoardLink { .. } => false,
        }
    }

    /// Short human-readable label for kinds without body text.
    pub fn label(&self) -> Option<&str> {
        match self {
            ElementKind::Container { title, .. } | ElementKind::BoardLink { title, .. } => {
                Some(title.as_str()).filter(|t| !t.is_empty())
            }
            ElementKind::Link { title, url } => Some(title.as_deref().unwrap_or(url)),
            ElementKind::Image { alt, .. } => alt.as_deref(),
            ElementKind::Connector { label, .. } => label.as_deref(),
            ElementKind::FreeformCard { .. }
            | ElementKind::Shape { .. }
            | ElementKind::Line { .. }
            | ElementKind::Text { .. }
            | ElementKind::ExperienceBlock { .. } => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ElementKind::Container { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Blocked,
    Completed,
}

impl TaskStatus {
    /// Column order used by the board view.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Completed,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Task extension fields stored on the source element. The projection layer
/// reads these; edits to a task land here through an element patch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMeta {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub actionable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, serde_json::Value>,
}

impl TaskMeta {
    pub fn is_empty(&self) -> bool {
        *self == TaskMeta::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default)]
    pub board_id: Option<String>,
    /// None until the store places the entity; read as the canvas surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<Surface>,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "TaskMeta::is_empty")]
    pub task: TaskMeta,
}

impl CanvasElement {
    /// A new unscoped element. The id is left empty so the store assigns one.
    pub fn new(kind: ElementKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: String::new(),
            x,
            y,
            width,
            height,
            z_index: 0,
            rotation: None,
            locked: false,
            container_id: None,
            board_id: None,
            surface: None,
            kind,
            task: TaskMeta::default(),
        }
    }

    /// Convenience constructor for the most common element: a text card.
    pub fn card(content: &str, x: f64, y: f64) -> Self {
        Self::new(
            ElementKind::FreeformCard {
                content: content.to_string(),
                color: None,
            },
            x,
            y,
            200.0,
            120.0,
        )
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn in_container(mut self, container_id: &str) -> Self {
        self.container_id = Some(container_id.to_string());
        self
    }

    pub fn with_task(mut self, task: TaskMeta) -> Self {
        self.task = task;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn surface(&self) -> Surface {
        self.surface.unwrap_or_default()
    }

    pub fn on_surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.board_id.as_deref(), self.surface())
    }

    pub fn in_scope(&self, board_id: Option<&str>, surface: Surface) -> bool {
        self.board_id.as_deref() == board_id && self.surface() == surface
    }

    pub fn text_content(&self) -> Option<&str> {
        self.kind.text_content()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dashed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EdgeStyle {
    pub fn is_default(&self) -> bool {
        *self == EdgeStyle::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub from_anchor: Anchor,
    pub to_anchor: Anchor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_point: Option<Point>,
    #[serde(default)]
    pub board_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<Surface>,
    #[serde(default, skip_serializing_if = "EdgeStyle::is_default")]
    pub style: EdgeStyle,
}

impl CanvasEdge {
    pub fn new(from_node_id: &str, from_anchor: Anchor, to_node_id: &str, to_anchor: Anchor) -> Self {
        Self {
            id: String::new(),
            from_node_id: from_node_id.to_string(),
            to_node_id: to_node_id.to_string(),
            from_anchor,
            to_anchor,
            control_point: None,
            board_id: None,
            surface: None,
            style: EdgeStyle::default(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn surface(&self) -> Surface {
        self.surface.unwrap_or_default()
    }

    pub fn on_surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.board_id.as_deref(), self.surface())
    }

    pub fn in_scope(&self, board_id: Option<&str>, surface: Surface) -> bool {
        self.board_id.as_deref() == board_id && self.surface() == surface
    }

    pub fn touches(&self, element_id: &str) -> bool {
        self.from_node_id == element_id || self.to_node_id == element_id
    }
}

/// Board metadata. Membership is expressed by `board_id` on elements and
/// edges; the board record only labels the scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    #[serde(default)]
    pub parent_board_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

/// Pan/zoom state of one scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Full serializable document handed to and received from the
/// persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDocument {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(default, rename = "boardMeta")]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub last_modified: u64,
}

fn current_version() -> u32 {
    CURRENT_DOCUMENT_VERSION
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self {
            version: CURRENT_DOCUMENT_VERSION,
            elements: Vec::new(),
            edges: Vec::new(),
            boards: Vec::new(),
            last_modified: 0,
        }
    }
}
