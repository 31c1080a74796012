/// Shallow-merge patches for elements and edges.
///
/// Every field is optional; `Some` replaces the target field wholesale.
/// Nullable target fields use `Option<Option<_>>` so a patch can clear them.
/// Applying the same patch twice leaves the same state as applying it once.
use super::ValidationError;
use crate::types::{
    Anchor, CanvasEdge, CanvasElement, EdgeStyle, ElementKind, Point, Surface, TaskMeta,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub z_index: Option<i32>,
    pub rotation: Option<Option<f64>>,
    pub locked: Option<bool>,
    pub container_id: Option<Option<String>>,
    pub board_id: Option<Option<String>>,
    pub surface: Option<Surface>,
    /// Replace the variant payload (and possibly the variant itself).
    pub kind: Option<ElementKind>,
    /// Replace the text of a text-bearing kind. Ignored for other kinds.
    pub content: Option<String>,
    pub task: Option<TaskMeta>,
}

impl ElementPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn content(text: &str) -> Self {
        Self {
            content: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn task(task: TaskMeta) -> Self {
        Self {
            task: Some(task),
            ..Self::default()
        }
    }

    pub fn container(container_id: Option<&str>) -> Self {
        Self {
            container_id: Some(container_id.map(str::to_string)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether applying the patch can change the element's footprint inside
    /// a container.
    pub fn touches_geometry(&self) -> bool {
        self.x.is_some()
            || self.y.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || self.container_id.is_some()
    }

    pub fn validate(&self, id: &str) -> Result<(), ValidationError> {
        check_finite(id, "x", self.x)?;
        check_finite(id, "y", self.y)?;
        check_size(id, "width", self.width)?;
        check_size(id, "height", self.height)?;
        check_finite(id, "rotation", self.rotation.flatten())?;
        if let Some(Some(container_id)) = &self.container_id {
            if container_id == id {
                return Err(ValidationError::SelfContainment(id.to_string()));
            }
        }
        if let Some(kind) = &self.kind {
            validate_kind(id, kind)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, element: &mut CanvasElement) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(width) = self.width {
            element.width = width;
        }
        if let Some(height) = self.height {
            element.height = height;
        }
        if let Some(z_index) = self.z_index {
            element.z_index = z_index;
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(container_id) = &self.container_id {
            element.container_id = container_id.clone();
        }
        if let Some(board_id) = &self.board_id {
            element.board_id = board_id.clone();
        }
        if let Some(surface) = self.surface {
            element.surface = Some(surface);
        }
        if let Some(kind) = &self.kind {
            element.kind = kind.clone();
        }
        if let Some(content) = &self.content {
            if !element.kind.set_text_content(content) {
                log::debug!(
                    "[strata.store.patch] Ignoring content patch on {} element {}",
                    element.kind.type_name(),
                    element.id
                );
            }
        }
        if let Some(task) = &self.task {
            element.task = task.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePatch {
    pub from_node_id: Option<String>,
    pub to_node_id: Option<String>,
    pub from_anchor: Option<Anchor>,
    pub to_anchor: Option<Anchor>,
    pub control_point: Option<Option<Point>>,
    pub board_id: Option<Option<String>>,
    pub surface: Option<Surface>,
    pub style: Option<EdgeStyle>,
}

impl EdgePatch {
    pub fn anchors(from_anchor: Anchor, to_anchor: Anchor) -> Self {
        Self {
            from_anchor: Some(from_anchor),
            to_anchor: Some(to_anchor),
            ..Self::default()
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), ValidationError> {
        if let Some(Some(point)) = self.control_point {
            check_point(id, "controlPoint", point)?;
        }
        if let Some(style) = &self.style {
            check_size(id, "strokeWidth", style.stroke_width)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, edge: &mut CanvasEdge) {
        if let Some(from) = &self.from_node_id {
            edge.from_node_id = from.clone();
        }
        if let Some(to) = &self.to_node_id {
            edge.to_node_id = to.clone();
        }
        if let Some(anchor) = self.from_anchor {
            edge.from_anchor = anchor;
        }
        if let Some(anchor) = self.to_anchor {
            edge.to_anchor = anchor;
        }
        if let Some(point) = self.control_point {
            edge.control_point = point;
        }
        if let Some(board_id) = &self.board_id {
            edge.board_id = board_id.clone();
        }
        if let Some(surface) = self.surface {
            edge.surface = Some(surface);
        }
        if let Some(style) = &self.style {
            edge.style = style.clone();
        }
    }
}

/// Reject elements whose geometry or payload is malformed.
pub fn validate_element(element: &CanvasElement) -> Result<(), ValidationError> {
    let id = element.id.as_str();
    check_finite(id, "x", Some(element.x))?;
    check_finite(id, "y", Some(element.y))?;
    check_size(id, "width", Some(element.width))?;
    check_size(id, "height", Some(element.height))?;
    check_finite(id, "rotation", element.rotation)?;
    if !id.is_empty() && element.container_id.as_deref() == Some(id) {
        return Err(ValidationError::SelfContainment(id.to_string()));
    }
    validate_kind(id, &element.kind)
}

pub fn validate_edge(edge: &CanvasEdge) -> Result<(), ValidationError> {
    if let Some(point) = edge.control_point {
        check_point(&edge.id, "controlPoint", point)?;
    }
    check_size(&edge.id, "strokeWidth", edge.style.stroke_width)
}

fn validate_kind(id: &str, kind: &ElementKind) -> Result<(), ValidationError> {
    match kind {
        ElementKind::Connector { start, end, .. } => {
            check_point(id, "start", *start)?;
            check_point(id, "end", *end)
        }
        ElementKind::Line {
            points,
            stroke_width,
        } => {
            for point in points {
                check_point(id, "points", *point)?;
            }
            check_size(id, "strokeWidth", Some(*stroke_width))
        }
        ElementKind::Text { font_size, .. } => check_size(id, "fontSize", *font_size),
        ElementKind::FreeformCard { .. }
        | ElementKind::Image { .. }
        | ElementKind::Shape { .. }
        | ElementKind::Container { .. }
        | ElementKind::Link { .. }
        | ElementKind::BoardLink { .. }
        | ElementKind::ExperienceBlock { .. } => Ok(()),
    }
}

fn check_finite(id: &str, field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NonFinite {
            id: id.to_string(),
            field,
            value: v,
        }),
        _ => Ok(()),
    }
}

fn check_size(id: &str, field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    check_finite(id, field, value)?;
    match value {
        Some(v) if v < 0.0 => Err(ValidationError::NegativeSize {
            id: id.to_string(),
            field,
            value: v,
        }),
        _ => Ok(()),
    }
}

fn check_point(id: &str, field: &'static str, point: Point) -> Result<(), ValidationError> {
    check_finite(id, field, Some(point.x))?;
    check_finite(id, field, Some(point.y))
}
