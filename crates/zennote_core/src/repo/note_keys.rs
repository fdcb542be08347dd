//! Key layout of the flat note namespace.
//!
//! Every note body lives under `note:<title>`; the title is stored
//! verbatim, without escaping. The Welcome Note visibility flag lives
//! under `has_welcome_note` as `"true"` or `"false"`.

/// Prefix shared by every note body key.
pub const NOTE_KEY_PREFIX: &str = "note:";

/// Key holding the Welcome Note visibility flag.
pub const HAS_WELCOME_NOTE_KEY: &str = "has_welcome_note";

/// Builds the store key for a note title.
pub fn note_key(title: &str) -> String {
    format!("{NOTE_KEY_PREFIX}{title}")
}

/// Extracts the note title from a store key.
///
/// Returns `None` for keys outside the note namespace.
pub fn note_title_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(NOTE_KEY_PREFIX)
}

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Parses a stored flag. Anything but `"true"`/`"false"` is unknown.
pub fn decode_flag(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
