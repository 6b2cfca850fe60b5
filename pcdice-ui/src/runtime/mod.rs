//! App runtime coordinator.
//!
//! One cooperative loop drives everything, in this order per iteration:
//! - `input`: event polling, layer resolution, global actions, pane dispatch
//! - device poll: re-enumerate outputs every `device_poll_ms`
//! - engine poll: scheduler ticks, error dismissal, progress frames
//! - `render`: FPS throttle and frame rendering

mod input;
mod render;

use std::time::{Duration, Instant};

use pcdice_core::config::Config;
use pcdice_core::dispatch::dispatch_action;
use pcdice_core::engine::Engine;
use pcdice_core::midi::MidiOutputManager;
use pcdice_core::surface::SurfaceState;
use pcdice_types::{Action, OutputAction};

use crate::panes::{GridPane, HelpPane};
use crate::ui::{keybindings, Frame, LayerStack, PaneManager, RatatuiBackend, StatusLevel};

/// Frame period; also the longest the loop sleeps waiting for input.
const FRAME: Duration = Duration::from_millis(16);

/// Top-level runtime that owns the engine and UI state and drives the event loop.
pub struct AppRuntime {
    pub(crate) engine: Engine<MidiOutputManager, SurfaceState>,
    pub(crate) panes: PaneManager,
    pub(crate) layer_stack: LayerStack,
    pub(crate) app_frame: Frame,

    // Device selection policy
    pub(crate) preferred_device: Option<String>,
    pub(crate) auto_select_first: bool,
    pub(crate) device_poll: Duration,
    pub(crate) last_device_poll: Instant,

    // Per-frame state
    pub(crate) render_needed: bool,
    pub(crate) last_render_time: Instant,
}

impl AppRuntime {
    pub fn new() -> Self {
        let config = Config::load();
        let engine = Engine::new(
            MidiOutputManager::new(),
            SurfaceState::default(),
            config.engine_settings(),
        );

        let mut layer_stack = LayerStack::new(keybindings::load_keybindings());
        layer_stack.push("global");
        let panes = register_panes(&layer_stack);
        layer_stack.set_pane_layer(panes.active().id());

        let now = Instant::now();
        let mut runtime = Self {
            engine,
            panes,
            layer_stack,
            app_frame: Frame::new(),
            preferred_device: config.preferred_device().map(str::to_string),
            auto_select_first: config.auto_select_first(),
            device_poll: config.device_poll_interval(),
            last_device_poll: now,
            render_needed: true,
            last_render_time: now,
        };

        runtime.engine.refresh_outputs();
        runtime.auto_select();
        runtime
    }

    /// Main event loop.
    pub fn run(&mut self, backend: &mut RatatuiBackend) -> std::io::Result<()> {
        loop {
            self.layer_stack.set_pane_layer(self.panes.active().id());

            let timeout = self.poll_timeout(Instant::now());
            if self.process_events(backend, timeout)? {
                break;
            }

            self.poll_devices(Instant::now());
            self.engine.poll(Instant::now());
            self.maybe_render(backend)?;
        }
        Ok(())
    }

    /// How long input polling may block: until the next timer, the next
    /// device poll or the next frame, whichever is first.
    fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = FRAME;
        if let Some(wake) = self.engine.next_wake() {
            timeout = timeout.min(wake.saturating_duration_since(now));
        }
        let next_poll = self.last_device_poll + self.device_poll;
        timeout.min(next_poll.saturating_duration_since(now))
    }

    /// Apply an engine intent and surface its notices. Returns true on quit.
    pub(crate) fn apply(&mut self, action: Action) -> bool {
        let result = dispatch_action(&action, &mut self.engine, Instant::now());
        for notice in result.notices {
            self.app_frame
                .status_bar
                .push(notice.message, notice.level.into());
        }
        self.render_needed = true;
        result.quit
    }

    fn poll_devices(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_device_poll) < self.device_poll {
            return;
        }
        self.last_device_poll = now;

        let was_active = !self.engine.state().is_idle();
        let had_target = self.engine.devices().has_target();
        let changed = self.engine.refresh_outputs();

        if had_target && !self.engine.devices().has_target() {
            let msg = if was_active {
                "Stopped: output disconnected"
            } else {
                "Output disconnected"
            };
            self.app_frame.status_bar.push(msg, StatusLevel::Warning);
            self.render_needed = true;
        }
        if changed {
            self.render_needed = true;
            if !self.engine.devices().has_target() {
                self.auto_select();
            }
        }
    }

    /// Bind the configured device if present, else the first output when
    /// `auto_select_first` is on.
    fn auto_select(&mut self) {
        if self.engine.devices().has_target() {
            return;
        }
        let outputs = self.engine.devices().outputs();
        let target = self
            .preferred_device
            .as_deref()
            .and_then(|name| outputs.iter().find(|p| p.name == name))
            .or_else(|| {
                if self.auto_select_first {
                    outputs.first()
                } else {
                    None
                }
            })
            .map(|p| p.id.clone());

        if let Some(id) = target {
            self.apply(Action::Output(OutputAction::Select(id)));
        }
    }
}

impl Default for AppRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn register_panes(layer_stack: &LayerStack) -> PaneManager {
    let mut panes = PaneManager::new(Box::new(GridPane::new(layer_stack.keymap("grid"))));
    panes.add_pane(Box::new(HelpPane::new(layer_stack.keymap("help"))));
    panes
}

/// Public entry point.
pub fn run(backend: &mut RatatuiBackend) -> std::io::Result<()> {
    let mut runtime = AppRuntime::new();
    log::info!(
        "{} output(s) found, bound to {:?}",
        runtime.engine.devices().outputs().len(),
        runtime.engine.devices().handle().map(|h| h.name.as_str())
    );
    runtime.run(backend)
}
