//! Output device lifecycle tracking.
//!
//! Keeps the list of selectable outputs and the single bound target. Only
//! ports reported as connected are ever selectable; a port that drops out of
//! the enumeration, or shows up disconnected, is treated as gone.

use pcdice_types::OutputPort;

/// The bound output target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub id: String,
    pub name: String,
}

impl DeviceHandle {
    fn from_port(port: &OutputPort) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The bound device is no longer connected.
    SelectedDisconnected(DeviceHandle),
}

#[derive(Debug, Default)]
pub struct DeviceTracker {
    outputs: Vec<OutputPort>,
    selected: Option<DeviceHandle>,
}

impl DeviceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selectable (connected) outputs, in enumeration order.
    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    pub fn handle(&self) -> Option<&DeviceHandle> {
        self.selected.as_ref()
    }

    pub fn has_target(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = &self.selected.as_ref()?.id;
        self.outputs.iter().position(|p| &p.id == id)
    }

    /// Check a fresh enumeration against the bound device without changing
    /// anything. The caller reacts to the event before calling `refresh`.
    pub fn observe(&self, live: &[OutputPort]) -> Option<DeviceEvent> {
        let handle = self.selected.as_ref()?;
        let still_there = live
            .iter()
            .any(|p| p.id == handle.id && p.is_connected());
        if still_there {
            None
        } else {
            Some(DeviceEvent::SelectedDisconnected(handle.clone()))
        }
    }

    /// Rebuild the selectable list. The bound device survives only if it is
    /// still connected. Returns true when the list changed.
    pub fn refresh(&mut self, live: &[OutputPort]) -> bool {
        let connected: Vec<OutputPort> = live.iter().filter(|p| p.is_connected()).cloned().collect();
        let changed = connected != self.outputs;
        self.outputs = connected;

        if let Some(handle) = &self.selected {
            if !self.outputs.iter().any(|p| p.id == handle.id) {
                log::info!(target: "device", "selected output '{}' is gone", handle.name);
                self.selected = None;
            }
        }
        if changed {
            log::info!(target: "device", "{} output(s) available", self.outputs.len());
        }
        changed
    }

    /// Bind `id` if it is currently selectable; otherwise unbind.
    pub fn select(&mut self, id: &str) -> Option<&DeviceHandle> {
        self.selected = self
            .outputs
            .iter()
            .find(|p| p.id == id)
            .map(DeviceHandle::from_port);
        match &self.selected {
            Some(h) => log::info!(target: "device", "selected output '{}'", h.name),
            None => log::warn!(target: "device", "output '{}' is not available", id),
        }
        self.selected.as_ref()
    }

    /// Unbind, returning what was bound.
    pub fn clear(&mut self) -> Option<DeviceHandle> {
        self.selected.take()
    }

    pub fn select_next(&mut self) -> Option<&DeviceHandle> {
        self.step(1)
    }

    pub fn select_prev(&mut self) -> Option<&DeviceHandle> {
        self.step(-1)
    }

    fn step(&mut self, dir: isize) -> Option<&DeviceHandle> {
        if self.outputs.is_empty() {
            return None;
        }
        let len = self.outputs.len() as isize;
        let next = match self.selected_index() {
            Some(i) => (i as isize + dir).rem_euclid(len),
            None if dir > 0 => 0,
            None => len - 1,
        };
        let id = self.outputs[next as usize].id.clone();
        self.select(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcdice_types::ConnectionState;

    fn port(id: &str) -> OutputPort {
        OutputPort::connected(id, format!("{} name", id))
    }

    fn gone(id: &str) -> OutputPort {
        OutputPort {
            state: ConnectionState::Disconnected,
            ..port(id)
        }
    }

    #[test]
    fn select_requires_connected_port() {
        let mut t = DeviceTracker::new();
        t.refresh(&[port("a"), gone("b")]);
        assert_eq!(t.outputs().len(), 1);
        assert!(t.select("b").is_none());
        assert!(!t.has_target());
        assert!(t.select("a").is_some());
        assert_eq!(t.handle().unwrap().name, "a name");
    }

    #[test]
    fn select_unknown_unbinds() {
        let mut t = DeviceTracker::new();
        t.refresh(&[port("a")]);
        t.select("a");
        assert!(t.select("zzz").is_none());
        assert!(!t.has_target());
    }

    #[test]
    fn refresh_preserves_present_selection() {
        let mut t = DeviceTracker::new();
        t.refresh(&[port("a"), port("b")]);
        t.select("b");
        t.refresh(&[port("c"), port("b")]);
        assert_eq!(t.handle().unwrap().id, "b");
        assert_eq!(t.selected_index(), Some(1));
    }

    #[test]
    fn refresh_drops_missing_selection() {
        let mut t = DeviceTracker::new();
        t.refresh(&[port("a"), port("b")]);
        t.select("a");
        t.refresh(&[port("b")]);
        assert!(t.handle().is_none());
    }

    #[test]
    fn observe_reports_disconnect_before_refresh() {
        let mut t = DeviceTracker::new();
        t.refresh(&[port("a")]);
        t.select("a");
        assert_eq!(t.observe(&[port("a")]), None);
        let ev = t.observe(&[gone("a")]).unwrap();
        assert_eq!(
            ev,
            DeviceEvent::SelectedDisconnected(DeviceHandle {
                id: "a".into(),
                name: "a name".into()
            })
        );
        // Observing alone leaves the binding in place.
        assert!(t.has_target());
        assert!(t.observe(&[]).is_some());
    }

    #[test]
    fn observe_without_selection_is_quiet() {
        let t = DeviceTracker::new();
        assert!(t.observe(&[]).is_none());
    }

    #[test]
    fn refresh_reports_changes() {
        let mut t = DeviceTracker::new();
        assert!(t.refresh(&[port("a")]));
        assert!(!t.refresh(&[port("a")]));
        assert!(t.refresh(&[port("a"), port("b")]));
    }

    #[test]
    fn cycling_wraps() {
        let mut t = DeviceTracker::new();
        t.refresh(&[port("a"), port("b"), port("c")]);
        assert_eq!(t.select_next().unwrap().id, "a");
        assert_eq!(t.select_next().unwrap().id, "b");
        assert_eq!(t.select_prev().unwrap().id, "a");
        assert_eq!(t.select_prev().unwrap().id, "c");
        assert_eq!(t.select_next().unwrap().id, "a");
    }

    #[test]
    fn cycling_with_no_outputs() {
        let mut t = DeviceTracker::new();
        assert!(t.select_next().is_none());
        assert!(t.select_prev().is_none());
    }
}
