//! Input processing: event polling, layer resolution, global actions, pane dispatch.

use std::time::Duration;

use pcdice_types::{Action, OutputAction, TimingAction, TransportAction};

use super::AppRuntime;
use crate::panes::HelpPane;
use crate::ui::action_id::{ActionId, GlobalActionId};
use crate::ui::{
    AppEvent, InputEvent, InputSource, LayerResult, NavAction, PaneAction, RatatuiBackend,
    SessionView,
};

/// Events handled per loop iteration before the loop gets back to timers.
const MAX_EVENTS_PER_ITERATION: u8 = 16;

impl AppRuntime {
    /// Process input events. Returns true if the app should quit.
    pub(crate) fn process_events(
        &mut self,
        backend: &mut RatatuiBackend,
        timeout: Duration,
    ) -> std::io::Result<bool> {
        let mut events_processed = 0u8;

        loop {
            let t = if events_processed == 0 {
                timeout
            } else {
                Duration::ZERO
            };
            let Some(app_event) = backend.poll_event(t) else {
                break;
            };
            events_processed += 1;

            match app_event {
                AppEvent::Resize(_, _) => self.render_needed = true,
                AppEvent::Key(event) => {
                    if self.handle_key(&event) {
                        return Ok(true);
                    }
                }
            }

            if events_processed >= MAX_EVENTS_PER_ITERATION {
                break;
            }
        }
        Ok(false)
    }

    fn handle_key(&mut self, event: &InputEvent) -> bool {
        self.render_needed = true;
        let view = SessionView::capture(&self.engine);

        let pane_action = match self.layer_stack.resolve(event) {
            LayerResult::Action(ActionId::Global(GlobalActionId::Help)) => {
                self.open_help(&view);
                PaneAction::None
            }
            LayerResult::Action(ActionId::Global(global)) => {
                PaneAction::Engine(global_action(global))
            }
            LayerResult::Action(action) => {
                self.panes.active_mut().handle_action(action, event, &view)
            }
            LayerResult::Blocked | LayerResult::Unresolved => {
                self.panes.active_mut().handle_raw_input(event, &view)
            }
        };

        match pane_action {
            PaneAction::None => false,
            PaneAction::Nav(nav) => {
                self.panes.process_nav(nav, &view);
                self.layer_stack.set_pane_layer(self.panes.active().id());
                false
            }
            PaneAction::Engine(action) => self.apply(action),
        }
    }

    fn open_help(&mut self, view: &SessionView) {
        let active = self.panes.active().id();
        if active == "help" {
            return;
        }
        let pane_keymap = self.panes.active().keymap().clone();
        let global = self.layer_stack.keymap("global");
        if let Some(help) = self.panes.get_pane_mut::<HelpPane>("help") {
            help.set_context(active, &[&pane_keymap, &global]);
        }
        self.panes.process_nav(NavAction::PushPane("help"), view);
        self.layer_stack.set_pane_layer(self.panes.active().id());
    }
}

/// Engine intent for a global key. `Help` is navigation and handled by the caller.
fn global_action(id: GlobalActionId) -> Action {
    match id {
        GlobalActionId::Quit => Action::Quit,
        GlobalActionId::StartStop => Action::Transport(TransportAction::Toggle),
        GlobalActionId::Tap => Action::Transport(TransportAction::Tap),
        GlobalActionId::Cancel => Action::Transport(TransportAction::Cancel),
        GlobalActionId::Resync => Action::Transport(TransportAction::Resync),
        GlobalActionId::BpmUp => Action::Timing(TimingAction::AdjustBpm(1)),
        GlobalActionId::BpmDown => Action::Timing(TimingAction::AdjustBpm(-1)),
        GlobalActionId::BpmUpBig => Action::Timing(TimingAction::AdjustBpm(10)),
        GlobalActionId::BpmDownBig => Action::Timing(TimingAction::AdjustBpm(-10)),
        GlobalActionId::ToggleSteps => Action::Timing(TimingAction::ToggleSteps),
        GlobalActionId::ChannelUp => Action::Output(OutputAction::AdjustChannel(1)),
        GlobalActionId::ChannelDown => Action::Output(OutputAction::AdjustChannel(-1)),
        GlobalActionId::DeviceNext => Action::Output(OutputAction::SelectNext),
        GlobalActionId::DevicePrev => Action::Output(OutputAction::SelectPrev),
        GlobalActionId::Help => Action::None,
    }
}
