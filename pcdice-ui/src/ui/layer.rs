use std::collections::HashMap;

use super::action_id::ActionId;
use super::keymap::Keymap;
use super::InputEvent;

/// A named layer with a keymap and transparency setting.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: &'static str,
    pub keymap: Keymap,
    pub transparent: bool,
}

/// Result of resolving an input event through the layer stack.
pub enum LayerResult {
    /// A layer matched the event with this action ID.
    Action(ActionId),
    /// An opaque layer blocked the event without matching it.
    Blocked,
    /// No layer matched the event and all layers were transparent.
    Unresolved,
}

/// A stack of named layers that resolves input events top-to-bottom.
pub struct LayerStack {
    layers: HashMap<&'static str, Layer>,
    active: Vec<&'static str>, // bottom-to-top
}

impl LayerStack {
    pub fn new(layers: Vec<Layer>) -> Self {
        let map: HashMap<&'static str, Layer> = layers.into_iter().map(|l| (l.name, l)).collect();
        Self {
            layers: map,
            active: Vec::new(),
        }
    }

    /// Resolve an input event through the active layer stack (top-to-bottom).
    pub fn resolve(&self, event: &InputEvent) -> LayerResult {
        for name in self.active.iter().rev() {
            if let Some(layer) = self.layers.get(name) {
                if let Some(action) = layer.keymap.lookup(event) {
                    return LayerResult::Action(action);
                }
                if !layer.transparent {
                    return LayerResult::Blocked;
                }
            }
        }
        LayerResult::Unresolved
    }

    /// Push a named layer onto the top of the stack.
    pub fn push(&mut self, name: &'static str) {
        if !self.active.contains(&name) {
            self.active.push(name);
        }
    }

    /// Set the pane layer at position 1, above global.
    /// If the layer doesn't exist in the loaded layers, position 1 is left empty.
    pub fn set_pane_layer(&mut self, name: &'static str) {
        self.active.truncate(1);
        if self.layers.contains_key(name) {
            self.active.push(name);
        }
    }

    /// Take a layer's keymap out of the stack (for panes that render their bindings).
    pub fn keymap(&self, name: &str) -> Keymap {
        self.layers
            .get(name)
            .map(|l| l.keymap.clone())
            .unwrap_or_default()
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.active.iter().any(|n| *n == name)
    }
}
