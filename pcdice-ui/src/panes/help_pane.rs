use std::any::Any;

use crate::ui::action_id::{ActionId, HelpActionId};
use crate::ui::layout_helpers::center_rect;
use crate::ui::{
    Color, InputEvent, Keymap, NavAction, Pane, PaneAction, Rect, RenderBuf, SessionView, Style,
};

pub struct HelpPane {
    keymap: Keymap,
    /// (key, description) rows to display
    display_keymap: Vec<(String, String)>,
    /// Title showing which pane's help this is
    title: String,
    /// Scroll offset for long keymaps
    scroll: usize,
}

impl HelpPane {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            display_keymap: Vec::new(),
            title: String::new(),
            scroll: 0,
        }
    }

    /// Set the keymaps to display, in order
    pub fn set_context(&mut self, title: &str, keymaps: &[&Keymap]) {
        self.title = title.to_string();
        self.scroll = 0;
        self.display_keymap = keymaps
            .iter()
            .copied()
            .flat_map(Keymap::bindings)
            .map(|b| (b.pattern.label(), b.description.to_string()))
            .collect();
    }

    fn max_scroll(&self, visible_lines: usize) -> usize {
        self.display_keymap.len().saturating_sub(visible_lines)
    }
}

impl Pane for HelpPane {
    fn id(&self) -> &'static str {
        "help"
    }

    fn handle_action(&mut self, action: ActionId, _event: &InputEvent, _view: &SessionView) -> PaneAction {
        match action {
            ActionId::Help(HelpActionId::Close) => PaneAction::Nav(NavAction::PopPane),
            ActionId::Help(HelpActionId::ScrollUp) => {
                self.scroll = self.scroll.saturating_sub(1);
                PaneAction::None
            }
            ActionId::Help(HelpActionId::ScrollDown) => {
                if self.scroll + 1 < self.display_keymap.len() {
                    self.scroll += 1;
                }
                PaneAction::None
            }
            _ => PaneAction::None,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut RenderBuf, _view: &SessionView) {
        let rect = center_rect(area, 56, area.height);
        let title = format!(" Help: {} ", self.title);

        let border_style = Style::new().fg(Color::SKY_BLUE);
        let inner = buf.draw_block(rect, &title, border_style, border_style);
        buf.fill(inner, ' ', Style::new().bg(Color::BLACK));

        let visible_lines = inner.height.saturating_sub(2) as usize;
        let scroll = self.scroll.min(self.max_scroll(visible_lines));

        let key_style = Style::new().fg(Color::GOLD).bold();
        let desc_style = Style::new().fg(Color::WHITE);
        let max_desc_len = inner.width.saturating_sub(14) as usize;

        for (i, (key, desc)) in self
            .display_keymap
            .iter()
            .skip(scroll)
            .take(visible_lines)
            .enumerate()
        {
            let y = inner.y + i as u16;
            let desc_truncated: String = desc.chars().take(max_desc_len).collect();
            let key_formatted = format!("{:<12}", key);
            let line_area = Rect::new(inner.x + 1, y, inner.width.saturating_sub(1), 1);
            buf.draw_line(
                line_area,
                &[
                    (key_formatted.as_str(), key_style),
                    (desc_truncated.as_str(), desc_style),
                ],
            );
        }

        let footer_y = inner.y + inner.height.saturating_sub(1);
        let mut footer = String::from("[Esc/?] Close  [Up/Down] Scroll");
        if self.display_keymap.len() > visible_lines {
            footer.push_str(&format!(
                "  {}-{}/{}",
                scroll + 1,
                (scroll + visible_lines).min(self.display_keymap.len()),
                self.display_keymap.len()
            ));
        }
        buf.draw_str(inner.x + 1, footer_y, &footer, Style::new().fg(Color::DARK_GRAY));
    }

    fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
