//! The editable plan buffer.

use crate::fingerprint::Fingerprint;

/// Raw plan text as it appears in the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    /// Exact text of the textarea, entities decoded, leading newline removed
    pub text: String,

    /// Fingerprint declared by the server in the hidden form field.
    ///
    /// Only present when requested; it is verified against `text` before
    /// being handed out.
    pub fingerprint: Option<Fingerprint>,
}

impl EditBuffer {
    /// Whether `edited` differs from this buffer once line endings are
    /// normalized the way the server stores them.
    pub fn is_changed_by(&self, edited: &str) -> bool {
        crate::canon::normalize_newlines(edited) != crate::canon::normalize_newlines(&self.text)
    }
}
