/// Container auto-expand.
///
/// After a child moves, resizes, or joins a container, the container must
/// still reach past every child's far edge by `padding` (plus the header
/// allowance vertically). Containers only ever grow here; shrinking is left
/// to explicit user resizes.
use std::collections::HashSet;

use crate::types::CanvasElement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerLayout {
    pub padding: f64,
    pub header_height: f64,
}

impl Default for ContainerLayout {
    fn default() -> Self {
        Self {
            padding: 20.0,
            header_height: 40.0,
        }
    }
}

/// Size `container` needs so that all `children` fit, never smaller than
/// its current size.
pub fn required_size<'a, I>(container: &CanvasElement, children: I, layout: ContainerLayout) -> (f64, f64)
where
    I: IntoIterator<Item = &'a CanvasElement>,
{
    let mut width = container.width;
    let mut height = container.height;
    for child in children {
        let needed_w = child.x + child.width - container.x + layout.padding;
        let needed_h = child.y + child.height - container.y + layout.padding + layout.header_height;
        width = width.max(needed_w);
        height = height.max(needed_h);
    }
    (width, height)
}

/// Grow the container `container_id` to fit its children, then walk up to
/// its own container and repeat. Returns the ids of containers that grew.
pub fn fit_containers(
    elements: &mut [CanvasElement],
    container_id: &str,
    layout: ContainerLayout,
) -> Vec<String> {
    let mut grown = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = Some(container_id.to_string());

    while let Some(id) = current.take() {
        if !visited.insert(id.clone()) {
            log::warn!("[strata.geometry.container] Containment cycle at {}", id);
            break;
        }
        let Some(index) = elements.iter().position(|e| e.id == id) else {
            break;
        };
        if !elements[index].kind.is_container() {
            break;
        }

        let container = &elements[index];
        let (width, height) = required_size(
            container,
            elements
                .iter()
                .filter(|e| e.container_id.as_deref() == Some(id.as_str())),
            layout,
        );

        let container = &mut elements[index];
        if width > container.width || height > container.height {
            log::debug!(
                "[strata.geometry.container] Expanding {} from {}x{} to {}x{}",
                id,
                container.width,
                container.height,
                width,
                height
            );
            container.width = width;
            container.height = height;
            grown.push(id.clone());
        }
        current = container.container_id.clone();
    }

    grown
}
