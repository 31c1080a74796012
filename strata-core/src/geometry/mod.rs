/// Pure geometry over canvas elements: bounding boxes, connector anchors and
/// container fitting. Nothing here touches the store; callers pass in the
/// elements they read from it.
///
/// All coordinates are world coordinates. Rotation is ignored for anchor
/// resolution: anchors sit on the unrotated bounding box.
pub mod container;

use crate::types::{Anchor, CanvasEdge, CanvasElement, ElementKind, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Whether `other` lies completely inside this rect.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The point inside the rect closest to `point`.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        )
    }
}

/// Midpoint of the given edge of `rect`.
pub fn anchor_point(rect: &Rect, anchor: Anchor) -> Point {
    let center = rect.center();
    match anchor {
        Anchor::Top => Point::new(center.x, rect.y),
        Anchor::Right => Point::new(rect.right(), center.y),
        Anchor::Bottom => Point::new(center.x, rect.bottom()),
        Anchor::Left => Point::new(rect.x, center.y),
    }
}

/// Pick facing anchors for a connection from `from` to `to`.
///
/// Horizontal distance between the centers wins when strictly larger than
/// the vertical one; ties resolve to the vertical pair.
pub fn closest_anchors(from: &Rect, to: &Rect) -> (Anchor, Anchor) {
    let a = from.center();
    let b = to.center();
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    if dx.abs() > dy.abs() {
        if dx > 0.0 {
            (Anchor::Right, Anchor::Left)
        } else {
            (Anchor::Left, Anchor::Right)
        }
    } else if dy > 0.0 {
        (Anchor::Bottom, Anchor::Top)
    } else {
        (Anchor::Top, Anchor::Bottom)
    }
}

/// Contact point for an endpoint that is not locked to a fixed anchor.
///
/// `source` is clamped into `rect`; the edge nearest to the clamped point
/// wins (ties: top, right, bottom, left) and the clamped point is projected
/// onto that edge.
pub fn free_anchor(rect: &Rect, source: Point) -> (Anchor, Point) {
    let p = rect.clamp(source);
    let distances = [
        (Anchor::Top, p.y - rect.y),
        (Anchor::Right, rect.right() - p.x),
        (Anchor::Bottom, rect.bottom() - p.y),
        (Anchor::Left, p.x - rect.x),
    ];

    let mut best = distances[0];
    for candidate in &distances[1..] {
        if candidate.1 < best.1 {
            best = *candidate;
        }
    }

    let contact = match best.0 {
        Anchor::Top => Point::new(p.x, rect.y),
        Anchor::Right => Point::new(rect.right(), p.y),
        Anchor::Bottom => Point::new(p.x, rect.bottom()),
        Anchor::Left => Point::new(rect.x, p.y),
    };
    (best.0, contact)
}

/// World-space endpoints of an edge between two resolved elements.
pub fn edge_endpoints(edge: &CanvasEdge, from: &CanvasElement, to: &CanvasElement) -> (Point, Point) {
    (
        anchor_point(&from.rect(), edge.from_anchor),
        anchor_point(&to.rect(), edge.to_anchor),
    )
}

/// World-space endpoints of a connector element. Ends attached to another
/// element snap to that element's free anchor facing the opposite end;
/// detached ends keep their stored point. Returns None for other kinds.
pub fn connector_endpoints<'a, F>(connector: &CanvasElement, lookup: F) -> Option<(Point, Point)>
where
    F: Fn(&str) -> Option<&'a CanvasElement>,
{
    let ElementKind::Connector {
        start,
        end,
        start_element_id,
        end_element_id,
        ..
    } = &connector.kind
    else {
        return None;
    };

    let attached = |element_id: &Option<String>, own: Point, other: Point| -> Point {
        element_id
            .as_deref()
            .and_then(|id| lookup(id))
            .map(|element| free_anchor(&element.rect(), other).1)
            .unwrap_or(own)
    };

    let resolved_start = attached(start_element_id, *start, *end);
    let resolved_end = attached(end_element_id, *end, resolved_start);
    Some((resolved_start, resolved_end))
}
