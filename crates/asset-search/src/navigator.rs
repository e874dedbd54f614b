//! Suggestion Selection Module
//!
//! Cursor over the current suggestion list driven by keyboard and pointer
//! events. The cursor is either `None` (no selection) or a valid index into
//! the list it was last synced against.

/// Input events understood by [`SuggestionNavigator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// Query text changed; `empty` is whether the new query is empty
    QueryChanged { empty: bool },
    MoveDown,
    MoveUp,
    Confirm,
    Cancel,
    /// Interaction outside the search surface
    Dismiss,
    /// Pointer over suggestion `i`
    Hover(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionNavigator {
    cursor: Option<usize>,
    visible: bool,
}

impl SuggestionNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Whether the suggestion list should be drawn for a list of `len` entries
    pub fn is_open(&self, len: usize) -> bool {
        self.visible && len > 0
    }

    /// Apply `event` against a suggestion list of `len` entries. Returns the
    /// confirmed index for [`NavEvent::Confirm`], `None` otherwise.
    pub fn handle(&mut self, event: NavEvent, len: usize) -> Option<usize> {
        match event {
            NavEvent::QueryChanged { empty } => {
                self.query_changed(empty);
                None
            }
            NavEvent::MoveDown => {
                self.move_down(len);
                None
            }
            NavEvent::MoveUp => {
                self.move_up();
                None
            }
            NavEvent::Confirm => self.confirm(len),
            NavEvent::Cancel => {
                self.cancel();
                None
            }
            NavEvent::Dismiss => {
                self.dismiss();
                None
            }
            NavEvent::Hover(i) => {
                self.hover(i, len);
                None
            }
        }
    }

    pub fn query_changed(&mut self, empty: bool) {
        self.cursor = None;
        self.visible = !empty;
    }

    /// Saturates at the last index. Ignored while the list is hidden.
    pub fn move_down(&mut self, len: usize) {
        if !self.visible {
            return;
        }
        if len == 0 {
            self.cursor = None;
            return;
        }
        self.cursor = Some(match self.cursor {
            None => 0,
            Some(i) => (i + 1).min(len - 1),
        });
    }

    /// Saturates at "no selection".
    pub fn move_up(&mut self) {
        self.cursor = match self.cursor {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Hides the list and returns the highlighted index, if any. A no-op when
    /// nothing is highlighted or the list is hidden.
    pub fn confirm(&mut self, len: usize) -> Option<usize> {
        if !self.visible {
            return None;
        }
        let selected = self.cursor.filter(|&i| i < len)?;
        self.visible = false;
        self.cursor = None;
        Some(selected)
    }

    pub fn cancel(&mut self) {
        self.visible = false;
        self.cursor = None;
    }

    pub fn dismiss(&mut self) {
        self.cancel();
    }

    /// Out-of-range indices are ignored, as is any hover while hidden.
    pub fn hover(&mut self, index: usize, len: usize) {
        if self.visible && index < len {
            self.cursor = Some(index);
        }
    }

    /// Re-validate the cursor after the suggestion list was recomputed.
    pub fn sync(&mut self, len: usize) {
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            other => other,
        };
    }
}
