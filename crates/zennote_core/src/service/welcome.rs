//! Welcome Note lifecycle.
//!
//! The Welcome Note is a reserved singleton. Its visibility flag and its
//! content are tracked separately: deleting it only flips the flag, so the
//! content (including user edits) can always be offered back.
//!
//! ```text
//! NeverInitialized --load--> Present --delete--> SoftDeleted
//!                               ^                    |
//!                               +------restore-------+
//! ```

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Reserved title of the Welcome Note.
pub const WELCOME_NOTE_TITLE: &str = "Welcome to Zen Note";

/// Content seeded when the reserved key holds nothing.
pub const WELCOME_NOTE_DEFAULT_CONTENT: &str = "Welcome to Zen Note!

This minimalist note-taking application helps you organize your thoughts with a clean, distraction-free interface.

Getting Started:
- Click the + button next to \"FOLDERS\" to create a new folder
- Click the + button next to \"MY NOTES\" to create a new note
- Use folders to organize related notes
- Edit this welcome note or create a new one to begin

Features:
- Simple, focused note-taking
- Folder organization
- Clean, minimal interface
- Keyboard shortcuts:
  \u{2022} Ctrl/Cmd + S: Save current note
  \u{2022} Ctrl/Cmd + N: Create new note

Happy writing!";

/// Visibility state of the Welcome Note, derived from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WelcomeState {
    /// First run: no flag and no content.
    NeverInitialized,
    /// Shown in the tree.
    Present,
    /// Hidden by the user; content still stored.
    SoftDeleted,
}

impl WelcomeState {
    /// Derives the state from the stored flag and content presence.
    ///
    /// An unreadable flag counts as absent.
    pub fn from_store(flag: Option<bool>, has_content: bool) -> Self {
        match (flag, has_content) {
            (Some(false), _) => Self::SoftDeleted,
            (Some(true), _) | (None, true) => Self::Present,
            (None, false) => Self::NeverInitialized,
        }
    }

    /// State once loading has reconciled the store.
    pub fn after_load(self) -> Self {
        match self {
            Self::NeverInitialized | Self::Present => Self::Present,
            Self::SoftDeleted => Self::SoftDeleted,
        }
    }

    /// Whether the note belongs in the tree.
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::SoftDeleted)
    }

    /// Whether the UI should offer the restore affordance.
    pub fn can_restore(self) -> bool {
        matches!(self, Self::SoftDeleted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NeverInitialized => "never_initialized",
            Self::Present => "present",
            Self::SoftDeleted => "soft_deleted",
        }
    }
}

impl Display for WelcomeState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `title` is the reserved Welcome Note title.
pub fn is_welcome_title(title: &str) -> bool {
    title == WELCOME_NOTE_TITLE
}
