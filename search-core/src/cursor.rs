use serde::Deserialize;
use serde::Serialize;

/// Keys the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// Highlighted row in the suggestion list; `None` is the "-1" state.
///
/// Independent of mouse hover. Never wraps around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    index: Option<usize>,
}

impl SelectionCursor {
    pub fn index(self) -> Option<usize> {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = None;
    }

    pub fn down(&mut self, len: usize) {
        if len == 0 {
            self.index = None;
            return;
        }
        self.index = Some(match self.index {
            None => 0,
            Some(i) => (i + 1).min(len - 1),
        });
    }

    pub fn up(&mut self) {
        self.index = match self.index {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Row that Enter picks: the highlighted one, else the first.
    pub fn enter_target(self, len: usize) -> Option<usize> {
        match self.index {
            Some(i) if i < len => Some(i),
            Some(_) => None,
            None if len > 0 => Some(0),
            None => None,
        }
    }
}
