//! Word-level layouts of the recorded stream and the compiled bytecode.
//!
//! Both encodings are flat `u32` streams. Literal operands are `(offset, len)`
//! byte ranges into the document's literal pool; name operands are
//! [`crate::names`] codes.

/// Recorded stream tags, written by [`crate::recorder::Recorder`].
///
/// Layouts (words):
/// - `TEXT off len`, `RAW off len`, `DOCTYPE`
/// - `ATTR_VALUE name off len`, `ATTR_BOOLEAN name`
/// - `ELEMENT len name ... ref_1 .. ref_n n ELEMENT_END`, where the element
///   occupies `len` words from its tag, so `n` sits at `start + len - 2`
/// - `FRAGMENT n ref_1 .. ref_n`
/// - `ROOT n ref_1 .. ref_n`
///
/// A ref is the absolute stream offset of a child record. Records between an
/// element header and its refs belong to whatever refs point at them; the
/// compiler never scans them linearly.
pub mod recorded {
    pub const TEXT: u32 = 0xF0;
    pub const RAW: u32 = 0xF1;
    pub const DOCTYPE: u32 = 0xF2;
    pub const ATTR_VALUE: u32 = 0xF3;
    pub const ATTR_BOOLEAN: u32 = 0xF4;
    pub const ELEMENT: u32 = 0xF5;
    pub const ELEMENT_END: u32 = 0xF6;
    pub const FRAGMENT: u32 = 0xF7;
    pub const ROOT: u32 = 0xF8;

    pub fn tag_name(tag: u32) -> &'static str {
        match tag {
            TEXT => "TEXT",
            RAW => "RAW",
            DOCTYPE => "DOCTYPE",
            ATTR_VALUE => "ATTR_VALUE",
            ATTR_BOOLEAN => "ATTR_BOOLEAN",
            ELEMENT => "ELEMENT",
            ELEMENT_END => "ELEMENT_END",
            FRAGMENT => "FRAGMENT",
            ROOT => "ROOT",
            _ => "?",
        }
    }
}

/// Compiled bytecode opcodes, written by [`crate::compiler`].
///
/// Layouts (words):
/// - `DOCTYPE`
/// - `START_TAG name span`: the element occupies `span` words from here
/// - `ATTRIBUTE name`, then for valued attributes
///   `VALUE_FIRST off len`, `VALUE_NEXT off len`*, `VALUE_END`
/// - `START_TAG_END has_children` or `SELF_CLOSING_END` for void elements
/// - `TEXT off len`, `RAW off len`
/// - `END_TAG name`
pub mod bytecode {
    pub const DOCTYPE: u32 = 0xB0;
    pub const START_TAG: u32 = 0xB1;
    pub const ATTRIBUTE: u32 = 0xB2;
    pub const VALUE_FIRST: u32 = 0xB3;
    pub const VALUE_NEXT: u32 = 0xB4;
    pub const VALUE_END: u32 = 0xB5;
    pub const START_TAG_END: u32 = 0xB6;
    pub const SELF_CLOSING_END: u32 = 0xB7;
    pub const TEXT: u32 = 0xB8;
    pub const RAW: u32 = 0xB9;
    pub const END_TAG: u32 = 0xBA;

    /// Total words of the instruction starting with `op`.
    pub fn width(op: u32) -> Option<usize> {
        Some(match op {
            DOCTYPE | VALUE_END | SELF_CLOSING_END => 1,
            ATTRIBUTE | START_TAG_END | END_TAG => 2,
            START_TAG | VALUE_FIRST | VALUE_NEXT | TEXT | RAW => 3,
            _ => return None,
        })
    }

    pub fn op_name(op: u32) -> &'static str {
        match op {
            DOCTYPE => "DOCTYPE",
            START_TAG => "START_TAG",
            ATTRIBUTE => "ATTRIBUTE",
            VALUE_FIRST => "VALUE_FIRST",
            VALUE_NEXT => "VALUE_NEXT",
            VALUE_END => "VALUE_END",
            START_TAG_END => "START_TAG_END",
            SELF_CLOSING_END => "SELF_CLOSING_END",
            TEXT => "TEXT",
            RAW => "RAW",
            END_TAG => "END_TAG",
            _ => "?",
        }
    }
}

/// Width of `START_TAG name span`.
pub(crate) const START_TAG_WORDS: usize = 3;
/// Width of `END_TAG name`.
pub(crate) const END_TAG_WORDS: usize = 2;

/// Convert a length or offset to the stream index width.
///
/// # Panics
///
/// Panics with "document too large" when `n` does not fit in `u32`.
#[inline]
pub(crate) fn index(n: usize) -> u32 {
    match u32::try_from(n) {
        Ok(v) => v,
        Err(_) => document_too_large(),
    }
}

#[cold]
#[inline(never)]
pub(crate) fn document_too_large() -> ! {
    panic!("document too large: index exceeds u32 range")
}
