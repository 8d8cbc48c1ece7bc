//! Character escaping for text and attribute values.
//!
//! Escapers hand unescaped runs and replacement entities to `emit` in order,
//! so callers can stream into any sink without an intermediate buffer.

use std::borrow::Cow;
use std::convert::Infallible;

use memchr::{memchr2, memchr3};

/// Escape `&`, `<` and `>` in text content.
pub(crate) fn text<E>(s: &str, mut emit: impl FnMut(&str) -> Result<(), E>) -> Result<(), E> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while let Some(rel) = memchr3(b'&', b'<', b'>', &bytes[start..]) {
        let i = start + rel;
        if start < i {
            emit(&s[start..i])?;
        }
        emit(match bytes[i] {
            b'&' => "&amp;",
            b'<' => "&lt;",
            _ => "&gt;",
        })?;
        start = i + 1;
    }
    if start < s.len() {
        emit(&s[start..])?;
    }
    Ok(())
}

/// Escape an attribute value for use inside double quotes.
///
/// Contract:
/// - `<`, `>`, `"` and `'` are always replaced (`"` → `&#34;`, `'` → `&#39;`).
/// - `&` is kept when it starts a well-formed, semicolon-terminated entity:
///   named (`&amp;`, at most 32 alphanumerics starting with a letter),
///   decimal (`&#123;`, at most 7 digits) or hex (`&#x1F;`, at most 6 digits).
/// - Any other `&` becomes `&amp;`.
pub(crate) fn attribute_value<E>(
    s: &str,
    mut emit: impl FnMut(&str) -> Result<(), E>,
) -> Result<(), E> {
    let bytes = s.as_bytes();
    if !needs_attribute_escape(bytes) {
        return emit(s);
    }
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let replacement = match bytes[i] {
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&#34;",
            b'\'' => "&#39;",
            b'&' => match entity_len(bytes, i) {
                Some(len) => {
                    i += len;
                    continue;
                }
                None => "&amp;",
            },
            _ => {
                i += 1;
                continue;
            }
        };
        if start < i {
            emit(&s[start..i])?;
        }
        emit(replacement)?;
        i += 1;
        start = i;
    }
    if start < s.len() {
        emit(&s[start..])?;
    }
    Ok(())
}

fn needs_attribute_escape(bytes: &[u8]) -> bool {
    memchr3(b'&', b'"', b'\'', bytes).is_some() || memchr2(b'<', b'>', bytes).is_some()
}

/// Length of the entity reference starting at `bytes[amp] == b'&'`, including
/// the `&` and the `;`.
fn entity_len(bytes: &[u8], amp: usize) -> Option<usize> {
    const MAX_NAME: usize = 32;
    const MAX_DEC_DIGITS: usize = 7;
    const MAX_HEX_DIGITS: usize = 6;

    // Bounded scan of a digit or name run followed by `;`.
    fn run_then_semicolon(
        bytes: &[u8],
        start: usize,
        max: usize,
        ok: impl Fn(u8) -> bool,
    ) -> Option<usize> {
        let mut j = start;
        while j < bytes.len() && j - start <= max {
            let b = bytes[j];
            if b == b';' {
                return (j > start).then_some(j + 1);
            }
            if !ok(b) {
                return None;
            }
            j += 1;
        }
        None
    }

    let after = amp + 1;
    let end = match bytes.get(after)? {
        b'#' => match bytes.get(after + 1)? {
            b'x' | b'X' => {
                run_then_semicolon(bytes, after + 2, MAX_HEX_DIGITS, |b| b.is_ascii_hexdigit())?
            }
            _ => run_then_semicolon(bytes, after + 1, MAX_DEC_DIGITS, |b| b.is_ascii_digit())?,
        },
        b if b.is_ascii_alphabetic() => {
            run_then_semicolon(bytes, after, MAX_NAME, |b| b.is_ascii_alphanumeric())?
        }
        _ => return None,
    };
    Some(end - amp)
}

pub fn escape_text(s: &str) -> Cow<'_, str> {
    if memchr3(b'&', b'<', b'>', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    let Ok(()) = text::<Infallible>(s, |chunk| {
        out.push_str(chunk);
        Ok(())
    });
    Cow::Owned(out)
}

pub fn escape_attribute_value(s: &str) -> Cow<'_, str> {
    if !needs_attribute_escape(s.as_bytes()) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    let Ok(()) = attribute_value::<Infallible>(s, |chunk| {
        out.push_str(chunk);
        Ok(())
    });
    // Only intact entities, nothing replaced.
    if out == s {
        return Cow::Borrowed(s);
    }
    Cow::Owned(out)
}
