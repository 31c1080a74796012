/// Board navigation: the active board, its breadcrumb trail, and the
/// viewport remembered for each canvas scope.
///
/// Viewports are only remembered on the canvas surface. The experience
/// surface always opens at the default viewport.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Scope, Surface, Viewport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct BoardNavigator {
    path: Vec<Crumb>,
    surface: Surface,
    viewport: Viewport,
    saved: HashMap<Option<String>, Viewport>,
    default_viewport: Viewport,
}

impl Default for BoardNavigator {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl BoardNavigator {
    pub fn new(default_viewport: Viewport) -> Self {
        Self {
            path: Vec::new(),
            surface: Surface::Canvas,
            viewport: default_viewport,
            saved: HashMap::new(),
            default_viewport,
        }
    }

    /// None at the root board.
    pub fn active_board_id(&self) -> Option<&str> {
        self.path.last().map(|crumb| crumb.id.as_str())
    }

    pub fn path(&self) -> &[Crumb] {
        &self.path
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn active_scope(&self) -> Scope {
        Scope::new(self.active_board_id(), self.surface)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Record pan/zoom for the current scope. Non-finite values and a
    /// non-positive zoom are ignored.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        let valid = viewport.x.is_finite()
            && viewport.y.is_finite()
            && viewport.zoom.is_finite()
            && viewport.zoom > 0.0;
        if !valid {
            log::debug!("[strata.navigator.viewport] Ignoring invalid viewport {:?}", viewport);
            return false;
        }
        self.viewport = viewport;
        true
    }

    /// The viewport remembered for a canvas scope, if it was ever left.
    pub fn saved_viewport(&self, board_id: Option<&str>) -> Option<Viewport> {
        self.saved.get(&board_id.map(str::to_string)).copied()
    }

    fn remember_viewport(&mut self) {
        if self.surface == Surface::Canvas {
            let key = self.active_board_id().map(str::to_string);
            self.saved.insert(key, self.viewport);
        }
    }

    fn restore_viewport(&mut self) {
        self.viewport = match self.surface {
            Surface::Experience => self.default_viewport,
            Surface::Canvas => self
                .saved_viewport(self.active_board_id())
                .unwrap_or(self.default_viewport),
        };
    }

    /// Descend into `id`. Entering the board that is already active does
    /// nothing.
    pub fn enter_board(&mut self, id: &str, title: &str) {
        if self.active_board_id() == Some(id) {
            return;
        }
        self.remember_viewport();
        self.path.push(Crumb {
            id: id.to_string(),
            title: title.to_string(),
        });
        log::debug!("[strata.navigator.enter] {} (depth {})", id, self.path.len());
        self.restore_viewport();
    }

    /// Go up one level. Returns false at the root.
    pub fn exit_board(&mut self) -> bool {
        if self.path.is_empty() {
            return false;
        }
        self.remember_viewport();
        self.path.pop();
        log::debug!("[strata.navigator.exit] Now at {:?}", self.active_board_id());
        self.restore_viewport();
        true
    }

    /// Jump to breadcrumb `index`, keeping entries `0..=index`. A negative
    /// index returns to the root; an index past the end does nothing.
    pub fn navigate_to_path(&mut self, index: isize) -> bool {
        let keep = if index < 0 {
            0
        } else {
            let index = index as usize;
            if index >= self.path.len() {
                return false;
            }
            index + 1
        };
        self.remember_viewport();
        self.path.truncate(keep);
        self.restore_viewport();
        true
    }

    /// Switch surfaces while staying on the same board.
    pub fn set_surface(&mut self, surface: Surface) {
        if self.surface == surface {
            return;
        }
        self.remember_viewport();
        self.surface = surface;
        self.restore_viewport();
    }

    /// Replace the trail wholesale, e.g. when restoring a session. Viewports
    /// are left untouched apart from loading the new scope's saved one.
    pub fn reset_path(&mut self, path: Vec<Crumb>) {
        self.remember_viewport();
        self.path = path;
        self.restore_viewport();
    }
}
