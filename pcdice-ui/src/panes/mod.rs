mod grid_pane;
mod help_pane;

pub use grid_pane::GridPane;
pub use help_pane::HelpPane;
