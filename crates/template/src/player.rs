//! Push playback: one linear pass over the bytecode driving a [`Visitor`].

use crate::compiler::CompiledHtml;
use crate::names::{AttributeName, ElementName};
use crate::proto::bytecode;
use crate::visitor::Visitor;

impl CompiledHtml {
    /// # Panics
    ///
    /// Panics on an unknown opcode or an `END_TAG` that does not close the
    /// innermost open element.
    pub fn play<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        let code = &self.code[..];
        // START_TAG offsets of the open elements.
        let mut open: Vec<usize> = Vec::new();
        let mut pc = 0usize;

        visitor.document_start();
        while pc < code.len() {
            let op = code[pc];
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(target: "template.player", "{pc:04} {}", bytecode::op_name(op));
            match op {
                bytecode::DOCTYPE => visitor.doctype(),
                bytecode::START_TAG => {
                    let name = ElementName(code[pc + 1]);
                    visitor.start_tag(self.names.element(name), self.names.element_kind(name));
                    open.push(pc);
                }
                bytecode::ATTRIBUTE => {
                    let name = AttributeName(code[pc + 1]);
                    visitor.attribute(self.names.attribute(name));
                }
                bytecode::VALUE_FIRST => {
                    visitor.attribute_first_value(self.literal(code[pc + 1], code[pc + 2]))
                }
                bytecode::VALUE_NEXT => {
                    visitor.attribute_next_value(self.literal(code[pc + 1], code[pc + 2]))
                }
                bytecode::VALUE_END => visitor.attribute_value_end(),
                bytecode::START_TAG_END => visitor.start_tag_end(code[pc + 1] != 0),
                bytecode::SELF_CLOSING_END => {
                    if open.pop().is_none() {
                        panic!("unbalanced bytecode: SELF_CLOSING_END at {pc} without START_TAG");
                    }
                    visitor.self_closing_end();
                }
                bytecode::TEXT => visitor.text(self.literal(code[pc + 1], code[pc + 2])),
                bytecode::RAW => visitor.raw(self.literal(code[pc + 1], code[pc + 2])),
                bytecode::END_TAG => {
                    let name = ElementName(code[pc + 1]);
                    match open.pop() {
                        Some(start) if code[start + 1] == name.0 => {}
                        _ => panic!(
                            "unbalanced bytecode: END_TAG {} at {pc} does not close the open element",
                            self.names.element(name)
                        ),
                    }
                    visitor.end_tag(self.names.element(name), self.names.element_kind(name));
                }
                _ => panic!("unknown opcode {op:#x} at {pc}"),
            }
            let Some(width) = bytecode::width(op) else {
                unreachable!("opcode validated above");
            };
            pc += width;
        }
        if !open.is_empty() {
            panic!("unbalanced bytecode: {} element(s) left open", open.len());
        }
        visitor.document_end();
    }
}

#[cfg(test)]
mod tests {
    use crate::debug::EventLog;
    use crate::dsl::Html;
    use crate::names::{attribute, element};

    #[test]
    fn events_follow_document_order() {
        let h = Html::new();
        h.doctype();
        h.element(
            element::HTML,
            &[h.element(
                element::HEAD,
                &[h.element(element::META, &[h.attr(attribute::CHARSET, "utf-8")])],
            )],
        );
        let mut log = EventLog::default();
        h.finish().compile().play(&mut log);
        assert_eq!(
            log.lines,
            vec![
                "document_start",
                "doctype",
                "start_tag html",
                "start_tag_end children",
                "start_tag head",
                "start_tag_end children",
                "start_tag meta",
                "attribute charset",
                "value_first \"utf-8\"",
                "value_end",
                "self_closing_end",
                "end_tag head",
                "end_tag html",
                "document_end",
            ]
        );
    }

    #[test]
    fn multi_value_attributes_separate_first_from_next() {
        let h = Html::new();
        h.element(element::P, &[h.class("a"), h.class("b"), h.class("c")]);
        let mut log = EventLog::default();
        h.finish().compile().play(&mut log);
        assert_eq!(
            &log.lines[2..7],
            &[
                "attribute class",
                "value_first \"a\"",
                "value_next \"b\"",
                "value_next \"c\"",
                "value_end",
            ]
        );
    }

    #[test]
    #[should_panic(expected = "unbalanced bytecode")]
    fn mismatched_end_tag_panics() {
        let h = Html::new();
        h.element(element::DIV, &[h.element(element::P, &[])]);
        let mut html = h.finish().compile();
        let last = html.code.len() - 1;
        html.code[last] = element::P.code();
        html.play(&mut EventLog::default());
    }

    #[test]
    #[should_panic(expected = "unknown opcode")]
    fn unknown_opcode_panics() {
        let h = Html::new();
        h.text("x");
        let mut html = h.finish().compile();
        html.code[0] = 0x1;
        html.play(&mut EventLog::default());
    }
}
