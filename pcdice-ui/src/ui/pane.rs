use std::any::Any;

use pcdice_types::Action;

use super::action_id::ActionId;
use super::view::SessionView;
use super::{InputEvent, Keymap, Rect, RenderBuf};

/// Pane-level navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    PushPane(&'static str),
    PopPane,
}

/// What a pane asks for after handling a key: an engine intent, a
/// navigation step, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneAction {
    None,
    Engine(Action),
    Nav(NavAction),
}

/// Trait for UI panes (screens/views).
pub trait Pane {
    /// Unique identifier for this pane; also the name of its keybinding layer
    fn id(&self) -> &'static str;

    /// Handle a resolved action ID from the layer system
    fn handle_action(&mut self, action: ActionId, event: &InputEvent, view: &SessionView) -> PaneAction;

    /// Handle raw input when layers resolved to Blocked or Unresolved
    fn handle_raw_input(&mut self, _event: &InputEvent, _view: &SessionView) -> PaneAction {
        PaneAction::None
    }

    /// Render the pane to the buffer
    fn render(&mut self, area: Rect, buf: &mut RenderBuf, view: &SessionView);

    /// Get the keymap for this pane (for introspection/help)
    fn keymap(&self) -> &Keymap;

    /// Called when this pane becomes active
    fn on_enter(&mut self, _view: &SessionView) {}

    /// Return self as Any for downcasting (required for type-specific access)
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Manages a stack of panes with one active pane
pub struct PaneManager {
    panes: Vec<Box<dyn Pane>>,
    active_index: usize,
    stack: Vec<usize>,
}

impl PaneManager {
    /// Create a new pane manager with an initial pane
    pub fn new(initial_pane: Box<dyn Pane>) -> Self {
        Self {
            panes: vec![initial_pane],
            active_index: 0,
            stack: Vec::new(),
        }
    }

    /// Add a pane to the manager (does not make it active)
    pub fn add_pane(&mut self, pane: Box<dyn Pane>) {
        self.panes.push(pane);
    }

    /// Get the currently active pane
    pub fn active(&self) -> &dyn Pane {
        self.panes[self.active_index].as_ref()
    }

    /// Get the currently active pane mutably
    pub fn active_mut(&mut self) -> &mut dyn Pane {
        self.panes[self.active_index].as_mut()
    }

    /// Push current pane onto the stack and switch to a new pane (for overlays)
    pub fn push_to(&mut self, id: &str, view: &SessionView) -> bool {
        match self.panes.iter().position(|p| p.id() == id) {
            Some(index) if index != self.active_index => {
                self.stack.push(self.active_index);
                self.active_index = index;
                self.panes[self.active_index].on_enter(view);
                true
            }
            _ => false,
        }
    }

    /// Pop the stack and return to the previous pane
    pub fn pop(&mut self, view: &SessionView) -> bool {
        if let Some(prev_index) = self.stack.pop() {
            self.active_index = prev_index;
            self.panes[self.active_index].on_enter(view);
            true
        } else {
            false
        }
    }

    /// Process a navigation request from a pane
    pub fn process_nav(&mut self, nav: NavAction, view: &SessionView) {
        match nav {
            NavAction::PushPane(id) => {
                self.push_to(id, view);
            }
            NavAction::PopPane => {
                self.pop(view);
            }
        }
    }

    /// Render the active pane to the buffer.
    pub fn render(&mut self, area: Rect, buf: &mut RenderBuf, view: &SessionView) {
        self.panes[self.active_index].render(area, buf, view);
    }

    /// Get a pane by ID with type-safe downcasting
    pub fn get_pane_mut<T: 'static>(&mut self, id: &str) -> Option<&mut T> {
        self.panes
            .iter_mut()
            .find(|p| p.id() == id)
            .and_then(|p| p.as_any_mut().downcast_mut::<T>())
    }
}
