//! Terminal input to dashboard actions.

use asset_search::NavEvent;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use ratatui::layout::Rect;

use crate::credentials::KeySlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    EditKey(KeySlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Retry,
    QueryChar(char),
    QueryBackspace,
    Nav(NavEvent),
    Escape,
    EditKey(KeySlot),
    KeyChar(char),
    KeyBackspace,
    FinishKeyEdit,
    ClearKeys,
    PointerMove { column: u16, row: u16 },
    PointerClick { column: u16, row: u16 },
    Ignore,
}

pub fn map_event(event: &Event, mode: Mode) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key, mode),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Moved => Action::PointerMove {
                column: mouse.column,
                row: mouse.row,
            },
            MouseEventKind::Down(MouseButton::Left) => Action::PointerClick {
                column: mouse.column,
                row: mouse.row,
            },
            _ => Action::Ignore,
        },
        _ => Action::Ignore,
    }
}

fn map_key(key: &KeyEvent, mode: Mode) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') => Action::Retry,
            KeyCode::Char('k') => Action::EditKey(KeySlot::Market),
            KeyCode::Char('g') => Action::EditKey(KeySlot::Insight),
            KeyCode::Char('x') => Action::ClearKeys,
            _ => Action::Ignore,
        };
    }

    match mode {
        Mode::Search => match key.code {
            KeyCode::Char(c) => Action::QueryChar(c),
            KeyCode::Backspace => Action::QueryBackspace,
            KeyCode::Down => Action::Nav(NavEvent::MoveDown),
            KeyCode::Up => Action::Nav(NavEvent::MoveUp),
            KeyCode::Enter => Action::Nav(NavEvent::Confirm),
            KeyCode::Esc => Action::Escape,
            KeyCode::F(5) => Action::Retry,
            _ => Action::Ignore,
        },
        Mode::EditKey(_) => match key.code {
            KeyCode::Char(c) => Action::KeyChar(c),
            KeyCode::Backspace => Action::KeyBackspace,
            KeyCode::Enter | KeyCode::Esc => Action::FinishKeyEdit,
            _ => Action::Ignore,
        },
    }
}

/// Screen areas recorded during the last draw, for pointer hit-testing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    pub search: Rect,
    /// One row per visible suggestion, in list order.
    pub suggestions: Vec<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Suggestion(usize),
    Search,
    Outside,
}

impl Regions {
    pub fn hit(&self, column: u16, row: u16) -> Hit {
        if let Some(i) = self.suggestions.iter().position(|r| contains(*r, column, row)) {
            Hit::Suggestion(i)
        } else if contains(self.search, column, row) {
            Hit::Search
        } else {
            Hit::Outside
        }
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
