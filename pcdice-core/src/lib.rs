//! # pcdice-core
//!
//! Engine library for pcdice: picks a random enabled pattern slot and sends
//! it as a MIDI Program Change once per pattern pass, independent of any UI.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Instant;
//! use pcdice_core::config::Config;
//! use pcdice_core::dispatch::dispatch_action;
//! use pcdice_core::engine::Engine;
//! use pcdice_core::midi::MidiOutputManager;
//! use pcdice_core::surface::SurfaceState;
//!
//! // 1. Build the engine from config defaults
//! let config = Config::load();
//! let mut engine = Engine::new(MidiOutputManager::new(), SurfaceState::default(), config.engine_settings());
//!
//! // 2. Enumerate and bind an output
//! engine.refresh_outputs();
//! engine.select_next_device();
//!
//! // 3. Feed intents and the clock from one loop
//! let result = dispatch_action(&action, &mut engine, Instant::now());
//! engine.poll(Instant::now());
//!
//! // 4. Render from engine accessors and engine.surface()
//! ```
//!
//! ## Module Overview
//!
//! - [`engine`]: `Engine`, Idle/Waiting/Running lifecycle, per-tick dispatch, forced stops
//! - [`scheduler`]: `DriftScheduler`, an absolute-deadline periodic timer that skips missed ticks
//! - [`timer`]: cancellable one-shot and per-frame timer slots
//! - [`device`]: `DeviceTracker`, selectable outputs and the bound target
//! - [`dispatch`]: `dispatch_action()`, the single entry point for operator intents
//! - [`midi`]: `MidiOutputs` trait and the midir-backed `MidiOutputManager`
//! - [`surface`]: `Surface` display trait and the `SurfaceState` snapshot
//! - [`config`]: TOML configuration loading (embedded + user override)

pub mod config;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod midi;
pub mod scheduler;
pub mod surface;
pub mod timer;
