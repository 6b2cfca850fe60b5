pub mod action_id;
pub mod frame;
pub mod input;
pub mod keybindings;
pub mod keymap;
pub mod layer;
pub mod layout_helpers;
pub mod pane;
pub mod ratatui_impl;
pub mod render;
pub mod status_bar;
pub mod style;
pub mod view;

pub use frame::Frame;
pub use input::{AppEvent, InputEvent, InputSource, KeyCode, Modifiers};
pub use keymap::Keymap;
pub use layer::{LayerResult, LayerStack};
pub use pane::{NavAction, Pane, PaneAction, PaneManager};
pub use ratatui_impl::RatatuiBackend;
pub use render::{Rect, RenderBuf};
pub use status_bar::StatusLevel;
pub use style::{Color, Style};
pub use view::SessionView;
