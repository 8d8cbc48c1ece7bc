//! Human-readable dumps of recorded and compiled documents.

use std::fmt::Write;

use crate::compiler::CompiledHtml;
use crate::names::{AttributeName, ElementKind, ElementName};
use crate::proto::{bytecode, recorded};
use crate::pull::{Node, Nodes};
use crate::recorder::RecordedTemplate;
use crate::visitor::Visitor;

/// One line per bytecode instruction: `offset OPCODE operands`.
pub fn disassemble(html: &CompiledHtml) -> String {
    let code = &html.code;
    let mut out = String::new();
    let mut pc = 0;
    while pc < code.len() {
        let op = code[pc];
        let _ = write!(&mut out, "{pc:04} {}", bytecode::op_name(op));
        match op {
            bytecode::START_TAG => {
                let name = html.names.element(ElementName(code[pc + 1]));
                let _ = write!(&mut out, " {name} span={}", code[pc + 2]);
            }
            bytecode::END_TAG => {
                let _ = write!(&mut out, " {}", html.names.element(ElementName(code[pc + 1])));
            }
            bytecode::ATTRIBUTE => {
                let _ = write!(&mut out, " {}", html.names.attribute(AttributeName(code[pc + 1])));
            }
            bytecode::VALUE_FIRST | bytecode::VALUE_NEXT | bytecode::TEXT | bytecode::RAW => {
                let _ = write!(&mut out, " {:?}", html.literal(code[pc + 1], code[pc + 2]));
            }
            bytecode::START_TAG_END => {
                out.push_str(if code[pc + 1] != 0 { " children" } else { " empty" });
            }
            _ => {}
        }
        out.push('\n');
        let Some(width) = bytecode::width(op) else {
            out.push_str("<unknown opcode>\n");
            break;
        };
        pc += width;
    }
    out
}

/// One line per recorded record, in stream order.
pub fn dump_recorded(template: &RecordedTemplate) -> String {
    let s = template.stream();
    let mut out = String::new();
    // (refs start, end) of the elements whose header has been printed.
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut pc = 0;
    while pc < s.len() {
        if let Some(&(refs_start, end)) = open.last() {
            if pc == refs_start {
                let _ = writeln!(&mut out, "{pc:04} REFS {:?}", &s[refs_start..end - 2]);
                open.pop();
                pc = end;
                continue;
            }
        }
        let tag = s[pc];
        let _ = write!(&mut out, "{pc:04} {}", recorded::tag_name(tag));
        let width = match tag {
            recorded::TEXT | recorded::RAW => {
                let (off, len) = (s[pc + 1] as usize, s[pc + 2] as usize);
                let _ = write!(&mut out, " {:?}", &template.pool()[off..off + len]);
                3
            }
            recorded::DOCTYPE => 1,
            recorded::ATTR_VALUE => {
                let (off, len) = (s[pc + 2] as usize, s[pc + 3] as usize);
                let name = template.names().attribute(AttributeName(s[pc + 1]));
                let _ = write!(&mut out, " {name}={:?}", &template.pool()[off..off + len]);
                4
            }
            recorded::ATTR_BOOLEAN => {
                let _ = write!(&mut out, " {}", template.names().attribute(AttributeName(s[pc + 1])));
                2
            }
            recorded::ELEMENT => {
                let name = template.names().element(ElementName(s[pc + 2]));
                let _ = write!(&mut out, " {name} len={}", s[pc + 1]);
                let end = pc + s[pc + 1] as usize;
                open.push((end - 2 - s[end - 2] as usize, end));
                3
            }
            recorded::FRAGMENT | recorded::ROOT => {
                let n = s[pc + 1] as usize;
                let _ = write!(&mut out, " refs={:?}", &s[pc + 2..pc + 2 + n]);
                2 + n
            }
            _ => 1,
        };
        out.push('\n');
        pc += width;
    }
    out
}

/// Visitor recording each event as one line.
#[derive(Debug, Default)]
pub struct EventLog {
    pub lines: Vec<String>,
}

impl Visitor for EventLog {
    fn document_start(&mut self) {
        self.lines.push("document_start".to_string());
    }
    fn doctype(&mut self) {
        self.lines.push("doctype".to_string());
    }
    fn start_tag(&mut self, name: &str, _kind: ElementKind) {
        self.lines.push(format!("start_tag {name}"));
    }
    fn attribute(&mut self, name: &str) {
        self.lines.push(format!("attribute {name}"));
    }
    fn attribute_first_value(&mut self, value: &str) {
        self.lines.push(format!("value_first {value:?}"));
    }
    fn attribute_next_value(&mut self, value: &str) {
        self.lines.push(format!("value_next {value:?}"));
    }
    fn attribute_value_end(&mut self) {
        self.lines.push("value_end".to_string());
    }
    fn start_tag_end(&mut self, has_children: bool) {
        let tail = if has_children { "children" } else { "empty" };
        self.lines.push(format!("start_tag_end {tail}"));
    }
    fn self_closing_end(&mut self) {
        self.lines.push("self_closing_end".to_string());
    }
    fn text(&mut self, text: &str) {
        self.lines.push(format!("text {text:?}"));
    }
    fn raw(&mut self, raw: &str) {
        self.lines.push(format!("raw {raw:?}"));
    }
    fn end_tag(&mut self, name: &str, _kind: ElementKind) {
        self.lines.push(format!("end_tag {name}"));
    }
    fn document_end(&mut self) {
        self.lines.push("document_end".to_string());
    }
}

fn strip_document_events(mut lines: Vec<String>) -> Vec<String> {
    lines.retain(|l| l != "document_start" && l != "document_end");
    lines
}

/// Push events of `html`, without the document start/end markers.
pub fn event_lines(html: &CompiledHtml) -> Vec<String> {
    let mut log = EventLog::default();
    html.play(&mut log);
    strip_document_events(log.lines)
}

/// Drain the pull iterators into the same lines [`event_lines`] produces.
pub fn pull_event_lines(html: &CompiledHtml) -> Vec<String> {
    let mut log = EventLog::default();
    let mut stack: Vec<(Nodes<'_>, Option<(&str, ElementKind)>)> = vec![(html.pull(), None)];
    while let Some((nodes, _)) = stack.last_mut() {
        match nodes.next() {
            Some(Node::Doctype) => log.doctype(),
            Some(Node::Text(text)) => log.text(text),
            Some(Node::Raw(raw)) => log.raw(raw),
            Some(Node::Element(element)) => {
                log.start_tag(element.name(), element.kind());
                for attr in element.attributes() {
                    log.attribute(attr.name());
                    let mut values = attr.values();
                    if let Some(first) = values.next() {
                        log.attribute_first_value(first);
                        for value in values {
                            log.attribute_next_value(value);
                        }
                        log.attribute_value_end();
                    }
                }
                if element.kind().is_void {
                    log.self_closing_end();
                } else {
                    log.start_tag_end(element.has_children());
                    let children = element.children();
                    stack.push((children, Some((element.name(), element.kind()))));
                }
            }
            None => {
                if let Some((_, Some((name, kind)))) = stack.pop() {
                    log.end_tag(name, kind);
                }
            }
        }
    }
    log.lines
}

/// Indented outline of the document, at most `cap` lines.
pub fn outline(html: &CompiledHtml, cap: usize) -> Vec<String> {
    const INDENT_STEP: &str = "  ";
    const PREVIEW_CHARS: usize = 40;

    fn preview(s: &str) -> String {
        let mut out: String = s
            .chars()
            .take(PREVIEW_CHARS)
            .map(|ch| if ch == '\n' { ' ' } else { ch })
            .collect();
        if s.chars().count() > PREVIEW_CHARS {
            out.push('…');
        }
        out
    }

    let mut out = Vec::new();
    let mut stack = vec![html.pull()];
    while out.len() < cap {
        let indent = INDENT_STEP.repeat(stack.len().saturating_sub(1));
        let Some(nodes) = stack.last_mut() else {
            break;
        };
        match nodes.next() {
            Some(Node::Doctype) => out.push(format!("{indent}<!DOCTYPE html>")),
            Some(Node::Text(text)) => out.push(format!("{indent}\"{}\"", preview(text))),
            Some(Node::Raw(raw)) => out.push(format!("{indent}raw \"{}\"", preview(raw))),
            Some(Node::Element(element)) => {
                let mut line = format!("{indent}<{}", element.name());
                for attr in element.attributes() {
                    line.push(' ');
                    line.push_str(attr.name());
                    let values: Vec<&str> = attr.values().collect();
                    if !values.is_empty() {
                        let _ = write!(&mut line, "={:?}", values.join(" "));
                    }
                }
                line.push('>');
                out.push(line);
                stack.push(element.children());
            }
            None => {
                stack.pop();
            }
        }
    }
    out
}
