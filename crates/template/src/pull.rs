//! Pull playback: lazy iterators over a compiled document.
//!
//! All iterators of one traversal share a cursor holding a stack of frames,
//! one per node iterator (the document's and each requested child list).
//! Advancing a node iterator discards the frames above it, so iterators
//! handed out for an earlier sibling become stale; using a stale iterator is a
//! protocol violation and panics. Exhausted iterators go stale too, so node
//! and attribute iterators are not fused.
//!
//! Per returned element the protocol is: optionally iterate its attributes,
//! then optionally iterate its children. Requesting attributes after the
//! children were requested panics.

use std::cell::RefCell;
use std::iter::FusedIterator;
use std::rc::Rc;

use crate::compiler::CompiledHtml;
use crate::names::{AttributeName, ElementKind, ElementName};
use crate::proto::{END_TAG_WORDS, START_TAG_WORDS, bytecode};

const NO_ELEMENT: usize = usize::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameKind {
    Document,
    Children,
}

/// What has been requested of the element a frame last returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ElementState {
    Fresh,
    AttributesRequested,
    ChildrenRequested,
}

#[derive(Debug)]
struct Frame {
    id: u32,
    kind: FrameKind,
    /// Resume offset.
    pc: usize,
    end: usize,
    /// `START_TAG` offset of the element last returned by this frame.
    current: usize,
    state: ElementState,
}

#[derive(Debug)]
struct Cursor {
    frames: Vec<Frame>,
    next_id: u32,
}

impl Cursor {
    fn frame(&self, depth: usize, id: u32) -> &Frame {
        match self.frames.get(depth) {
            Some(frame) if frame.id == id => frame,
            _ => stale(),
        }
    }

    fn element_frame(&self, depth: usize, id: u32, start: usize) -> &Frame {
        let frame = self.frame(depth, id);
        if frame.current != start {
            stale();
        }
        frame
    }

    fn element_frame_mut(&mut self, depth: usize, id: u32, start: usize) -> &mut Frame {
        self.element_frame(depth, id, start);
        &mut self.frames[depth]
    }
}

#[cold]
#[inline(never)]
fn stale() -> ! {
    panic!("iterator protocol violation: parent iterator has moved past this node");
}

type Shared = Rc<RefCell<Cursor>>;

impl CompiledHtml {
    /// Iterate the document's top-level nodes.
    pub fn pull(&self) -> Nodes<'_> {
        let cursor = Cursor {
            frames: vec![Frame {
                id: 0,
                kind: FrameKind::Document,
                pc: 0,
                end: self.code.len(),
                current: NO_ELEMENT,
                state: ElementState::Fresh,
            }],
            next_id: 1,
        };
        Nodes {
            html: self,
            cursor: Rc::new(RefCell::new(cursor)),
            depth: 0,
            id: 0,
        }
    }
}

#[derive(Clone)]
pub enum Node<'a> {
    Doctype,
    Element(Element<'a>),
    Text(&'a str),
    Raw(&'a str),
}

/// Document nodes or an element's child nodes.
pub struct Nodes<'a> {
    html: &'a CompiledHtml,
    cursor: Shared,
    depth: usize,
    id: u32,
}

impl<'a> Nodes<'a> {
    /// # Panics
    ///
    /// Panics if the parent iterator has moved past the element owning these
    /// nodes.
    pub fn has_next(&self) -> bool {
        let cursor = self.cursor.borrow();
        let frame = cursor.frame(self.depth, self.id);
        frame.pc < frame.end
    }

    /// True for the document's own node iterator.
    pub fn is_document(&self) -> bool {
        self.cursor.borrow().frame(self.depth, self.id).kind == FrameKind::Document
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Node<'a>;

    /// # Panics
    ///
    /// Panics if the parent iterator has moved past the element owning these
    /// nodes.
    fn next(&mut self) -> Option<Node<'a>> {
        let html = self.html;
        let code = &html.code;
        let mut cursor = self.cursor.borrow_mut();
        cursor.frame(self.depth, self.id);
        cursor.frames.truncate(self.depth + 1);
        let frame = &mut cursor.frames[self.depth];
        if frame.pc >= frame.end {
            return None;
        }
        let pc = frame.pc;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "template.player", "pull depth={} {pc:04} {}", self.depth, bytecode::op_name(code[pc]));
        let node = match code[pc] {
            bytecode::DOCTYPE => {
                frame.pc += 1;
                Node::Doctype
            }
            bytecode::TEXT => {
                frame.pc += 3;
                Node::Text(html.literal(code[pc + 1], code[pc + 2]))
            }
            bytecode::RAW => {
                frame.pc += 3;
                Node::Raw(html.literal(code[pc + 1], code[pc + 2]))
            }
            bytecode::START_TAG => {
                frame.pc += code[pc + 2] as usize;
                frame.current = pc;
                frame.state = ElementState::Fresh;
                Node::Element(Element {
                    html,
                    cursor: Rc::clone(&self.cursor),
                    owner_depth: self.depth,
                    owner_id: self.id,
                    start: pc,
                })
            }
            op => panic!("unknown opcode {op:#x} at {pc} in node position"),
        };
        Some(node)
    }
}

/// An element returned by a [`Nodes`] iterator. Valid until that iterator
/// advances.
#[derive(Clone)]
pub struct Element<'a> {
    html: &'a CompiledHtml,
    cursor: Shared,
    owner_depth: usize,
    owner_id: u32,
    start: usize,
}

impl<'a> Element<'a> {
    pub fn name_code(&self) -> ElementName {
        ElementName(self.html.code[self.start + 1])
    }

    pub fn name(&self) -> &'a str {
        self.html.names.element(self.name_code())
    }

    pub fn kind(&self) -> ElementKind {
        self.html.names.element_kind(self.name_code())
    }

    /// Offset of the first instruction after the attributes.
    fn attributes_end(&self) -> usize {
        let code = &self.html.code;
        let mut pc = self.start + START_TAG_WORDS;
        while matches!(
            code[pc],
            bytecode::ATTRIBUTE | bytecode::VALUE_FIRST | bytecode::VALUE_NEXT | bytecode::VALUE_END
        ) {
            pc += bytecode::width(code[pc]).unwrap_or(1);
        }
        pc
    }

    pub fn has_children(&self) -> bool {
        let code = &self.html.code;
        let pc = self.attributes_end();
        code[pc] == bytecode::START_TAG_END && code[pc + 1] != 0
    }

    /// Look an attribute up by name without affecting iteration state.
    ///
    /// # Panics
    ///
    /// Panics if the owning iterator has moved past this element.
    pub fn attribute(&self, name: AttributeName) -> Option<Attribute<'a>> {
        self.cursor
            .borrow()
            .element_frame(self.owner_depth, self.owner_id, self.start);
        let mut attrs = AttributeScan {
            html: self.html,
            pc: self.start + START_TAG_WORDS,
        };
        attrs.find(|a| a.name == name)
    }

    /// # Panics
    ///
    /// Panics if the owning iterator has moved past this element, or if
    /// children were already requested.
    pub fn attributes(&self) -> Attributes<'a> {
        let mut cursor = self.cursor.borrow_mut();
        let frame = cursor.element_frame_mut(self.owner_depth, self.owner_id, self.start);
        if frame.state == ElementState::ChildrenRequested {
            panic!("iterator protocol violation: attributes requested after children");
        }
        frame.state = ElementState::AttributesRequested;
        Attributes {
            cursor: Rc::clone(&self.cursor),
            owner_depth: self.owner_depth,
            owner_id: self.owner_id,
            element: self.start,
            scan: AttributeScan {
                html: self.html,
                pc: self.start + START_TAG_WORDS,
            },
        }
    }

    /// # Panics
    ///
    /// Panics if the owning iterator has moved past this element, or if
    /// children were already requested.
    pub fn children(&self) -> Nodes<'a> {
        let code = &self.html.code;
        let pc = self.attributes_end();
        let (first, end) = match code[pc] {
            bytecode::START_TAG_END => {
                let span = code[self.start + 2] as usize;
                (pc + 2, self.start + span - END_TAG_WORDS)
            }
            bytecode::SELF_CLOSING_END => (pc + 1, pc + 1),
            op => panic!("unknown opcode {op:#x} at {pc} after attributes"),
        };

        let mut cursor = self.cursor.borrow_mut();
        let frame = cursor.element_frame_mut(self.owner_depth, self.owner_id, self.start);
        if frame.state == ElementState::ChildrenRequested {
            panic!("iterator protocol violation: children requested twice");
        }
        frame.state = ElementState::ChildrenRequested;
        let depth = self.owner_depth + 1;
        let id = cursor.next_id;
        cursor.next_id = cursor.next_id.wrapping_add(1);
        cursor.frames.truncate(depth);
        cursor.frames.push(Frame {
            id,
            kind: FrameKind::Children,
            pc: first,
            end,
            current: NO_ELEMENT,
            state: ElementState::Fresh,
        });
        Nodes {
            html: self.html,
            cursor: Rc::clone(&self.cursor),
            depth,
            id,
        }
    }
}

/// Unchecked walk over an element's attribute instructions.
#[derive(Clone)]
struct AttributeScan<'a> {
    html: &'a CompiledHtml,
    pc: usize,
}

impl<'a> AttributeScan<'a> {
    fn peek(&self) -> bool {
        self.html.code[self.pc] == bytecode::ATTRIBUTE
    }
}

impl<'a> Iterator for AttributeScan<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        let code = &self.html.code;
        if !self.peek() {
            return None;
        }
        let attr = Attribute {
            html: self.html,
            name: AttributeName(code[self.pc + 1]),
            values: self.pc + 2,
        };
        self.pc += 2;
        while matches!(
            code[self.pc],
            bytecode::VALUE_FIRST | bytecode::VALUE_NEXT | bytecode::VALUE_END
        ) {
            self.pc += bytecode::width(code[self.pc]).unwrap_or(1);
        }
        Some(attr)
    }
}

/// Attributes of one element, grouped by name in first-seen order.
pub struct Attributes<'a> {
    cursor: Shared,
    owner_depth: usize,
    owner_id: u32,
    element: usize,
    scan: AttributeScan<'a>,
}

impl<'a> Attributes<'a> {
    fn check(&self) {
        let cursor = self.cursor.borrow();
        let frame = cursor.element_frame(self.owner_depth, self.owner_id, self.element);
        if frame.state != ElementState::AttributesRequested {
            panic!("iterator protocol violation: attribute iterator used after children were requested");
        }
    }

    /// # Panics
    ///
    /// Panics if the element's children were requested, or its owning
    /// iterator moved on.
    pub fn has_next(&self) -> bool {
        self.check();
        self.scan.peek()
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        self.check();
        self.scan.next()
    }
}

#[derive(Clone, Copy)]
pub struct Attribute<'a> {
    html: &'a CompiledHtml,
    name: AttributeName,
    /// Offset of the first value instruction, if any.
    values: usize,
}

impl<'a> Attribute<'a> {
    pub fn name_code(&self) -> AttributeName {
        self.name
    }

    pub fn name(&self) -> &'a str {
        self.html.names.attribute(self.name)
    }

    /// Values in recording order; empty for boolean attributes.
    pub fn values(&self) -> Values<'a> {
        Values {
            html: self.html,
            pc: self.values,
        }
    }

    pub fn value(&self) -> Option<&'a str> {
        self.values().next()
    }

    pub fn is_boolean(&self) -> bool {
        !self.values().has_next()
    }
}

/// Values read straight from the immutable bytecode; never stale.
#[derive(Clone)]
pub struct Values<'a> {
    html: &'a CompiledHtml,
    pc: usize,
}

impl<'a> Values<'a> {
    pub fn has_next(&self) -> bool {
        matches!(
            self.html.code.get(self.pc),
            Some(&bytecode::VALUE_FIRST) | Some(&bytecode::VALUE_NEXT)
        )
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if !self.has_next() {
            return None;
        }
        let code = &self.html.code;
        let value = self.html.literal(code[self.pc + 1], code[self.pc + 2]);
        self.pc += 3;
        Some(value)
    }
}

impl FusedIterator for Values<'_> {}
