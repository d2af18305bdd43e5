//! Local edits driven by collaborator output.

use super::types::Issue;
use crate::error::{RedpenError, Result};

/// Reject documents that must not be sent for review.
pub fn validate_document(text: &str, max_chars: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RedpenError::EmptyDocument);
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(RedpenError::DocumentTooLong {
            len,
            max: max_chars,
        });
    }
    Ok(())
}

/// Replace the first exact occurrence of the issue's quoted text with its
/// suggestion.
///
/// Fails with [`RedpenError::FixNotFound`] when the quote is no longer in
/// the document (or the replacement would change nothing); the document is
/// never partially edited.
pub fn apply_fix(document: &str, issue: &Issue) -> Result<String> {
    if issue.quoted_text.is_empty() {
        return Err(RedpenError::FixNotFound);
    }

    let updated = document.replacen(&issue.quoted_text, &issue.suggestion, 1);
    if updated == document {
        return Err(RedpenError::FixNotFound);
    }
    Ok(updated)
}

/// Replace the characters `start..end` of `document` with `replacement`.
///
/// Offsets count characters, as an editor selection does.
pub fn splice(document: &str, start: usize, end: usize, replacement: &str) -> Result<String> {
    let len = document.chars().count();
    if start > end || end > len {
        return Err(RedpenError::InvalidSelection { start, end, len });
    }

    let byte_at = |pos: usize| {
        document
            .char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(document.len())
    };
    let (from, to) = (byte_at(start), byte_at(end));

    let mut out = String::with_capacity(document.len() - (to - from) + replacement.len());
    out.push_str(&document[..from]);
    out.push_str(replacement);
    out.push_str(&document[to..]);
    Ok(out)
}

/// Characters `start..end` of `document`, if the range is valid.
pub fn selection(document: &str, start: usize, end: usize) -> Option<String> {
    if start > end || end > document.chars().count() {
        return None;
    }
    Some(document.chars().skip(start).take(end - start).collect())
}
