//! Indentation outlines of documents, recorded through the call-order
//! recorder API.
//!
//! ```text
//! !doctype
//! <html lang="en">
//!   <body class="a" class="b" hidden>
//!     "text with \"escapes\""
//!     raw "<!-- kept -->"
//! ```
//!
//! Two spaces per level. Lines starting with `#` are comments. Repeated
//! attributes record separate entries.

use std::fmt;

use template::{CompiledHtml, NameError, RecordedTemplate, Recorder};

use crate::unescape_text;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutlineNode {
    Doctype,
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<OutlineNode>,
    },
    Text(String),
    Raw(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for OutlineError {}

const INDENT: usize = 2;

struct OpenElement {
    name: String,
    attributes: Vec<(String, Option<String>)>,
    children: Vec<OutlineNode>,
}

pub fn parse_outline(src: &str) -> Result<Vec<OutlineNode>, OutlineError> {
    let mut roots = Vec::new();
    let mut open: Vec<OpenElement> = Vec::new();

    for (idx, raw_line) in src.lines().enumerate() {
        let line_no = idx + 1;
        let err = |message: String| OutlineError {
            line: line_no,
            message,
        };
        let line = raw_line.trim_end();
        let body = line.trim_start_matches(' ');
        if body.is_empty() || body.starts_with('#') {
            continue;
        }
        let indent = line.len() - body.len();
        if indent % INDENT != 0 {
            return Err(err(format!("indent of {indent} is not a multiple of {INDENT}")));
        }
        let depth = indent / INDENT;
        if depth > open.len() {
            return Err(err(format!(
                "unexpected indent: depth {depth} under {} open element(s)",
                open.len()
            )));
        }
        while open.len() > depth {
            close_innermost(&mut open, &mut roots);
        }

        let node = parse_line(body).map_err(err)?;
        match node {
            OutlineNode::Element {
                name, attributes, ..
            } => open.push(OpenElement {
                name,
                attributes,
                children: Vec::new(),
            }),
            other => match open.last_mut() {
                Some(parent) => parent.children.push(other),
                None => roots.push(other),
            },
        }
    }
    while !open.is_empty() {
        close_innermost(&mut open, &mut roots);
    }
    Ok(roots)
}

fn close_innermost(open: &mut Vec<OpenElement>, roots: &mut Vec<OutlineNode>) {
    let Some(done) = open.pop() else {
        return;
    };
    let node = OutlineNode::Element {
        name: done.name,
        attributes: done.attributes,
        children: done.children,
    };
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn parse_line(body: &str) -> Result<OutlineNode, String> {
    if body == "!doctype" {
        return Ok(OutlineNode::Doctype);
    }
    if body.starts_with('"') {
        let (text, rest) = quoted(body)?;
        expect_end(rest)?;
        return Ok(OutlineNode::Text(text));
    }
    if let Some(rest) = body.strip_prefix("raw ") {
        let (raw, rest) = quoted(rest.trim_start())?;
        expect_end(rest)?;
        return Ok(OutlineNode::Raw(raw));
    }
    let Some(inner) = body.strip_prefix('<').and_then(|b| b.strip_suffix('>')) else {
        return Err(format!("unrecognized line {body:?}"));
    };
    let name_end = inner.find(' ').unwrap_or(inner.len());
    let name = &inner[..name_end];
    if name.is_empty() {
        return Err("missing element name".to_string());
    }
    let mut attributes = Vec::new();
    let mut rest = inner[name_end..].trim_start();
    while !rest.is_empty() {
        let end = rest.find(['=', ' ']).unwrap_or(rest.len());
        let attr = &rest[..end];
        if attr.is_empty() {
            return Err(format!("empty attribute name in {body:?}"));
        }
        rest = &rest[end..];
        if let Some(after_eq) = rest.strip_prefix('=') {
            let (value, tail) = quoted(after_eq)?;
            attributes.push((attr.to_string(), Some(value)));
            rest = tail;
        } else {
            attributes.push((attr.to_string(), None));
        }
        rest = rest.trim_start();
    }
    Ok(OutlineNode::Element {
        name: name.to_string(),
        attributes,
        children: Vec::new(),
    })
}

/// Split a leading `"..."` literal off `s`.
fn quoted(s: &str) -> Result<(String, &str), String> {
    let Some(body) = s.strip_prefix('"') else {
        return Err(format!("expected a quoted string at {s:?}"));
    };
    let mut escaped = false;
    for (i, ch) in body.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                let text = unescape_text(&body[..i])
                    .ok_or_else(|| format!("malformed escape in {s:?}"))?;
                return Ok((text, &body[i + 1..]));
            }
            _ => {}
        }
    }
    Err(format!("unterminated string {s:?}"))
}

fn expect_end(rest: &str) -> Result<(), String> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(format!("trailing input {rest:?}"))
    }
}

/// Record `nodes` in document order with the open/close recorder API.
pub fn record_outline(
    recorder: &mut Recorder,
    nodes: &[OutlineNode],
) -> Result<(), NameError> {
    for node in nodes {
        match node {
            OutlineNode::Doctype => {
                recorder.doctype();
            }
            OutlineNode::Text(text) => {
                recorder.text(text);
            }
            OutlineNode::Raw(raw) => {
                recorder.raw(raw);
            }
            OutlineNode::Element {
                name,
                attributes,
                children,
            } => {
                let name = recorder.intern_element(name)?;
                recorder.open_element(name);
                for (attr, value) in attributes {
                    let attr = recorder.intern_attribute(attr)?;
                    match value {
                        Some(value) => recorder.attribute(attr, value),
                        None => recorder.boolean_attribute(attr),
                    };
                }
                record_outline(recorder, children)?;
                recorder.close_element();
            }
        }
    }
    Ok(())
}

/// Parse and record `src`.
///
/// # Panics
///
/// Panics if the outline is malformed or names a disallowed element or
/// attribute.
pub fn recorded(src: &str) -> RecordedTemplate {
    let nodes = parse_outline(src).unwrap_or_else(|err| panic!("bad outline: {err}"));
    let mut recorder = Recorder::new();
    record_outline(&mut recorder, &nodes).unwrap_or_else(|err| panic!("bad outline name: {err}"));
    recorder.finish()
}

pub fn compiled(src: &str) -> CompiledHtml {
    recorded(src).compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_outline() {
        let nodes = parse_outline(
            "!doctype\n<div id=\"x\" hidden>\n  \"a \\\"b\\\"\"\n  <br>\nraw \"<i>\"\n",
        )
        .unwrap();
        assert_eq!(
            nodes,
            vec![
                OutlineNode::Doctype,
                OutlineNode::Element {
                    name: "div".to_string(),
                    attributes: vec![
                        ("id".to_string(), Some("x".to_string())),
                        ("hidden".to_string(), None),
                    ],
                    children: vec![
                        OutlineNode::Text("a \"b\"".to_string()),
                        OutlineNode::Element {
                            name: "br".to_string(),
                            attributes: Vec::new(),
                            children: Vec::new(),
                        },
                    ],
                },
                OutlineNode::Raw("<i>".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_bad_indentation() {
        let err = parse_outline("<div>\n     \"x\"").unwrap_err();
        assert_eq!(err.line, 2);
        let err = parse_outline("<div>\n    \"x\"").unwrap_err();
        assert!(err.message.starts_with("unexpected indent"), "{err}");
    }

    #[test]
    fn rejects_unterminated_strings() {
        assert!(parse_outline("\"open").is_err());
        assert!(parse_outline("<a href=\"x>").is_err());
    }

    #[test]
    fn recorded_outline_compiles() {
        let html = compiled("<p class=\"a\" class=\"b\">\n  \"hi\"");
        assert_eq!(html.to_string(), "<p class=\"a b\">hi</p>");
    }
}
