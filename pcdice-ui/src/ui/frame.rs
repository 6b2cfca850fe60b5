use pcdice_types::EngineState;

use super::status_bar::{StatusBar, StatusLevel};
use super::view::SessionView;
use super::{Color, Rect, RenderBuf, Style};

/// Rows used by the header block inside the border.
const HEADER_ROWS: u16 = 5;

/// Frame wrapping the active pane with border, header and status bar
pub struct Frame {
    /// Status bar for transient user notifications
    pub status_bar: StatusBar,
}

impl Frame {
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 20;

    pub fn new() -> Self {
        Self {
            status_bar: StatusBar::new(),
        }
    }

    /// Returns true if the terminal area is large enough for normal rendering.
    pub fn is_size_ok(area: Rect) -> bool {
        area.width >= Self::MIN_WIDTH && area.height >= Self::MIN_HEIGHT
    }

    /// Area left for the active pane: inside the border, below the header,
    /// above the status line.
    pub fn content_area(area: Rect) -> Rect {
        let inner_h = area.height.saturating_sub(2);
        Rect::new(
            area.x + 1,
            area.y + 1 + HEADER_ROWS + 1,
            area.width.saturating_sub(2),
            inner_h.saturating_sub(HEADER_ROWS + 2),
        )
    }

    /// Render the frame border, header, progress, error banner and status bar.
    pub fn render_buf(&self, area: Rect, buf: &mut RenderBuf, view: &SessionView) {
        if !Self::is_size_ok(area) {
            let msg = format!(
                "{}x{} required, got {}x{}",
                Self::MIN_WIDTH,
                Self::MIN_HEIGHT,
                area.width,
                area.height
            );
            let x = area.x + area.width.saturating_sub(msg.len() as u16) / 2;
            let y = area.y + area.height / 2;
            buf.draw_str(x, y, &msg, Style::new().fg(Color::GRAY));
            return;
        }

        let border_style = Style::new().fg(Color::GRAY);
        let inner = buf.draw_block(
            area,
            " pcdice ",
            border_style,
            Style::new().fg(Color::ORANGE).bold(),
        );
        let x = inner.x + 1;
        let width = inner.width.saturating_sub(2);
        let label = Style::new().fg(Color::GRAY);
        let value = Style::new().fg(Color::WHITE).bold();

        // Row 0: output, channel, tempo, steps, interval
        let device = view.selected_output_name().unwrap_or("none");
        let bpm = view.tempo.bpm().to_string();
        let steps = view.steps.steps().to_string();
        let channel = view.channel.display().to_string();
        let interval = format!("{:.3}s", view.interval.as_secs_f64());
        buf.draw_line(
            Rect::new(x, inner.y, width, 1),
            &[
                ("Out ", label),
                (device, value),
                ("  Ch ", label),
                (channel.as_str(), value),
                ("  BPM ", label),
                (bpm.as_str(), value),
                ("  Steps ", label),
                (steps.as_str(), value),
                ("  Every ", label),
                (interval.as_str(), value),
            ],
        );

        // Row 1: engine state and tap hint
        let state_style = Style::new().fg(Color::BLACK).bg(state_color(view.state)).bold();
        let state_text = format!(" {} ", view.state.label());
        let hint = if view.surface.tap_hint {
            "  TAP to fire the first pattern"
        } else {
            ""
        };
        let skipped = if view.skipped_ticks > 0 && view.state == EngineState::Running {
            format!("  skipped {}", view.skipped_ticks)
        } else {
            String::new()
        };
        buf.draw_line(
            Rect::new(x, inner.y + 1, width, 1),
            &[
                (state_text.as_str(), state_style),
                (hint, Style::new().fg(Color::WAIT_COLOR).bold()),
                (skipped.as_str(), Style::new().fg(Color::DARK_GRAY)),
            ],
        );

        // Row 2: now playing
        let playing = view
            .surface
            .selection
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let sent = format!("  sent {}", view.surface.dispatch_count);
        buf.draw_line(
            Rect::new(x, inner.y + 2, width, 1),
            &[
                ("Now playing ", label),
                (playing.as_str(), Style::new().fg(Color::SLOT_CURRENT).bold()),
                (sent.as_str(), Style::new().fg(Color::DARK_GRAY)),
            ],
        );

        // Row 3: progress bar
        buf.meter(
            Rect::new(x, inner.y + 3, width, 1),
            view.surface.progress,
            Style::new().fg(Color::PROGRESS_FILL),
            Style::new().fg(Color::DARK_GRAY),
        );

        // Row 4: error banner
        if let Some(err) = &view.surface.error {
            let banner = Style::new().fg(Color::WHITE).bg(Color::ERROR_BG).bold();
            buf.banner(Rect::new(x, inner.y + 4, width, 1), &format!("Error: {}", err), banner);
        }

        // Separator under the header
        buf.hline(inner.x, inner.y + HEADER_ROWS, inner.width, border_style);

        // Status bar on the last inner row
        if let Some(msg) = self.status_bar.current() {
            let color = match msg.level {
                StatusLevel::Info => Color::SKY_BLUE,
                StatusLevel::Warning => Color::WARNING_COLOR,
            };
            let status_y = inner.y + inner.height.saturating_sub(1);
            buf.draw_str(x, status_y, &msg.text, Style::new().fg(color));
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

fn state_color(state: EngineState) -> Color {
    match state {
        EngineState::Idle => Color::IDLE_COLOR,
        EngineState::Waiting => Color::WAIT_COLOR,
        EngineState::Running => Color::RUN_COLOR,
    }
}
