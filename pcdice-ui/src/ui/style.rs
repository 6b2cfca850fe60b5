use ratatui::style::{Color as RatatuiColor, Modifier, Style as RatatuiStyle};

/// RGB color. Construct with `Color::new(r, g, b)` or use named constants
/// (e.g. `Color::WHITE`, `Color::SLOT_ON`, `Color::RUN_COLOR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    // Basic colors
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const GRAY: Color = Color::new(128, 128, 128);
    pub const DARK_GRAY: Color = Color::new(100, 100, 100);
    pub const ORANGE: Color = Color::new(255, 165, 0);
    pub const SKY_BLUE: Color = Color::new(135, 206, 235);
    pub const GOLD: Color = Color::new(255, 215, 0);

    // Grid
    pub const SLOT_ON: Color = Color::new(80, 220, 100);     // Green - enabled slot
    pub const SLOT_OFF: Color = Color::new(60, 60, 60);      // Dim - disabled slot
    pub const SLOT_CURRENT: Color = Color::new(255, 105, 180); // Pink - last dispatched

    // Engine state
    pub const IDLE_COLOR: Color = Color::new(128, 128, 128);
    pub const WAIT_COLOR: Color = Color::new(255, 220, 50);  // Yellow - armed
    pub const RUN_COLOR: Color = Color::new(80, 220, 100);   // Green - running

    // Progress / banners
    pub const PROGRESS_FILL: Color = Color::new(100, 180, 255);
    pub const ERROR_BG: Color = Color::new(140, 30, 30);
    pub const WARNING_COLOR: Color = Color::new(255, 220, 80);

    // UI colors
    pub const SELECTION_BG: Color = Color::new(60, 100, 180);
}

/// Text style with foreground, background, and attributes.
///
/// Builder methods (all const, chainable):
/// - `fg(Color)`: set foreground color
/// - `bg(Color)`: set background color
/// - `bold()`: enable bold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: false,
        }
    }

    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

// --- Conversions to ratatui types ---

impl From<Color> for RatatuiColor {
    fn from(c: Color) -> Self {
        RatatuiColor::Rgb(c.r, c.g, c.b)
    }
}

impl From<Style> for RatatuiStyle {
    fn from(s: Style) -> Self {
        let mut rs = RatatuiStyle::default();
        if let Some(fg) = s.fg {
            rs = rs.fg(RatatuiColor::from(fg));
        }
        if let Some(bg) = s.bg {
            rs = rs.bg(RatatuiColor::from(bg));
        }
        if s.bold {
            rs = rs.add_modifier(Modifier::BOLD);
        }
        rs
    }
}
