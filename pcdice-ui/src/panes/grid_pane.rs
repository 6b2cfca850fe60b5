use std::any::Any;

use pcdice_types::{Action, BankIndex, OutputPort, PatternAction, SlotIndex, SLOTS_PER_BANK};

use crate::ui::action_id::{ActionId, GridActionId};
use crate::ui::{Color, InputEvent, Keymap, PaneAction, Rect, RenderBuf, SessionView, Style};

const COLUMNS: usize = 4;
const CELL_WIDTH: u16 = 7;
/// Left edge of the output list, relative to the pane.
const OUTPUTS_X: u16 = 36;

/// The main pane: bank selector, the 16-slot grid of the shown bank and the
/// output list.
pub struct GridPane {
    keymap: Keymap,
    bank: BankIndex,
    /// Key label per slot, taken from the keymap.
    slot_keys: [String; SLOTS_PER_BANK],
}

impl GridPane {
    pub fn new(keymap: Keymap) -> Self {
        let slot_keys = std::array::from_fn(|i| {
            keymap
                .bindings()
                .iter()
                .find(|b| {
                    matches!(b.action, ActionId::Grid(g) if g.slot() == Some(i as u8 + 1))
                })
                .map(|b| b.pattern.label())
                .unwrap_or_default()
        });
        Self {
            keymap,
            bank: BankIndex::default(),
            slot_keys,
        }
    }

    pub fn bank(&self) -> BankIndex {
        self.bank
    }

    fn render_bank_tabs(&self, x: u16, y: u16, buf: &mut RenderBuf, view: &SessionView) {
        buf.draw_str(x, y, "Bank", Style::new().fg(Color::GRAY));
        for bank in BankIndex::all() {
            let bx = x + 5 + (bank.get() as u16 - 1) * 6;
            let count = view.patterns.bank(bank).iter().filter(|on| **on).count();
            let style = if bank == self.bank {
                Style::new().fg(Color::BLACK).bg(Color::GOLD).bold()
            } else if count == 0 {
                Style::new().fg(Color::DARK_GRAY)
            } else {
                Style::new().fg(Color::WHITE)
            };
            buf.draw_str(bx, y, &format!(" {} ", bank), style);
            if highlighted_slot(view, bank).is_some() && bank != self.bank {
                buf.set_cell(bx + 3, y, '*', Style::new().fg(Color::SLOT_CURRENT));
            }
        }
    }

    fn render_grid(&self, x: u16, y: u16, buf: &mut RenderBuf, view: &SessionView) {
        let flags = view.patterns.bank(self.bank);
        let current = highlighted_slot(view, self.bank);
        for slot in SlotIndex::all() {
            let i = slot.get() as usize - 1;
            let cx = x + (i % COLUMNS) as u16 * (CELL_WIDTH + 1);
            let cy = y + (i / COLUMNS) as u16 * 2;
            let style = if current == Some(slot) {
                Style::new().fg(Color::BLACK).bg(Color::SLOT_CURRENT).bold()
            } else if flags[i] {
                Style::new().fg(Color::BLACK).bg(Color::SLOT_ON)
            } else {
                Style::new().fg(Color::GRAY).bg(Color::SLOT_OFF)
            };
            let text = format!("{:>2} {}", slot, self.slot_keys[i]);
            buf.label_cell(Rect::new(cx, cy, CELL_WIDTH, 1), &text, style);
        }
    }

    fn render_outputs(&self, area: Rect, buf: &mut RenderBuf, view: &SessionView) {
        buf.draw_str(area.x, area.y, "Outputs", Style::new().fg(Color::GRAY));
        if view.outputs.is_empty() {
            buf.draw_str(area.x, area.y + 1, "(none found)", Style::new().fg(Color::DARK_GRAY));
            return;
        }
        let rows = area.height.saturating_sub(1) as usize;
        let first = output_scroll(view.selected_output, rows);
        for (row, (i, port)) in view.outputs.iter().enumerate().skip(first).take(rows).enumerate() {
            let y = area.y + 1 + row as u16;
            let selected = view.selected_output == Some(i);
            let style = if selected {
                Style::new().fg(Color::WHITE).bg(Color::SELECTION_BG).bold()
            } else {
                Style::new().fg(Color::WHITE)
            };
            let text = output_label(port, selected, area.width as usize);
            buf.draw_str(area.x, y, &text, style);
        }
    }
}

impl crate::ui::Pane for GridPane {
    fn id(&self) -> &'static str {
        "grid"
    }

    fn handle_action(&mut self, action: ActionId, _event: &InputEvent, _view: &SessionView) -> PaneAction {
        let ActionId::Grid(grid) = action else {
            return PaneAction::None;
        };
        if let Some(bank) = grid.bank().and_then(BankIndex::new) {
            self.bank = bank;
            return PaneAction::None;
        }
        if let Some(slot) = grid.slot().and_then(SlotIndex::new) {
            return PaneAction::Engine(Action::Pattern(PatternAction::Toggle {
                bank: self.bank,
                slot,
            }));
        }
        match grid {
            GridActionId::FillAll => PaneAction::Engine(Action::Pattern(PatternAction::FillAll(self.bank))),
            GridActionId::FillNone => PaneAction::Engine(Action::Pattern(PatternAction::FillNone(self.bank))),
            _ => PaneAction::None,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut RenderBuf, view: &SessionView) {
        let x = area.x + 1;
        self.render_bank_tabs(x, area.y, buf, view);
        self.render_grid(x, area.y + 2, buf, view);

        let footer_y = area.y + 2 + (SLOTS_PER_BANK / COLUMNS) as u16 * 2;
        if footer_y < area.y + area.height {
            let active = view.patterns.active_count();
            buf.draw_str(
                x,
                footer_y,
                &format!("{} slots enabled  [?] help", active),
                Style::new().fg(Color::DARK_GRAY),
            );
        }

        if area.width > OUTPUTS_X + 8 {
            let outputs = Rect::new(
                area.x + OUTPUTS_X,
                area.y,
                area.width - OUTPUTS_X - 1,
                area.height,
            );
            self.render_outputs(outputs, buf, view);
        }
    }

    fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The slot to highlight in `bank`: the last dispatched one, only when it
/// belongs to that bank.
fn highlighted_slot(view: &SessionView, bank: BankIndex) -> Option<SlotIndex> {
    view.surface
        .selection
        .filter(|c| c.bank == bank)
        .map(|c| c.slot)
}

/// First visible row so the selected output stays on screen.
fn output_scroll(selected: Option<usize>, rows: usize) -> usize {
    match selected {
        Some(i) if rows > 0 && i >= rows => i + 1 - rows,
        _ => 0,
    }
}

fn output_label(port: &OutputPort, selected: bool, width: usize) -> String {
    let marker = if selected { "> " } else { "  " };
    let name: String = port.name.chars().take(width.saturating_sub(2)).collect();
    format!("{}{}", marker, name)
}
