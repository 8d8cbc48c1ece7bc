//! Recorded stream → finalized bytecode.
//!
//! One forward pass over the document in child order. Each element's refs are
//! located from its back-patched length; descending into a child pushes a
//! frame instead of recursing.

use crate::names::{AttributeName, ElementName, Names};
use crate::proto::{bytecode, index, recorded};
use crate::recorder::RecordedTemplate;

/// Finalized document, ready for playback.
#[derive(Clone, Debug)]
pub struct CompiledHtml {
    pub(crate) code: Vec<u32>,
    pub(crate) pool: String,
    pub(crate) names: Names,
}

impl CompiledHtml {
    pub fn code(&self) -> &[u32] {
        &self.code
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    pub(crate) fn literal(&self, off: u32, len: u32) -> &str {
        &self.pool[off as usize..off as usize + len as usize]
    }
}

impl RecordedTemplate {
    /// Compile without consuming the recording; compiling twice yields
    /// identical bytecode.
    pub fn compile(&self) -> CompiledHtml {
        let mut compiler = Compiler::new(self);
        compiler.run();
        let code = compiler.code;
        log::debug!(
            target: "template.compiler",
            "compiled {} recorded words into {} bytecode words",
            self.stream.len(),
            code.len()
        );
        CompiledHtml {
            code,
            pool: self.pool.clone(),
            names: self.names.clone(),
        }
    }
}

struct Frame {
    /// Next ref to visit.
    cursor: usize,
    /// One past the last ref.
    end: usize,
    /// `START_TAG` offset in the output, or `None` for the root.
    start_tag: Option<usize>,
    name: ElementName,
}

struct Compiler<'t> {
    stream: &'t [u32],
    names: &'t Names,
    root: usize,
    code: Vec<u32>,
    frames: Vec<Frame>,
    /// Attribute refs of the element being opened.
    attrs: Vec<u32>,
}

impl<'t> Compiler<'t> {
    fn new(template: &'t RecordedTemplate) -> Self {
        Self {
            stream: &template.stream,
            names: &template.names,
            root: template.root as usize,
            code: Vec::with_capacity(template.stream.len()),
            frames: Vec::new(),
            attrs: Vec::new(),
        }
    }

    fn run(&mut self) {
        let root = self.root;
        if self.stream.get(root) != Some(&recorded::ROOT) {
            panic!("unknown instruction at root offset {root}");
        }
        let n = self.stream[root + 1] as usize;
        self.frames.push(Frame {
            cursor: root + 2,
            end: root + 2 + n,
            start_tag: None,
            name: ElementName(0),
        });

        while let Some(frame) = self.frames.last_mut() {
            if frame.cursor == frame.end {
                let Some(frame) = self.frames.pop() else {
                    break;
                };
                if let Some(start_tag) = frame.start_tag {
                    self.code.extend_from_slice(&[bytecode::END_TAG, frame.name.0]);
                    self.patch_span(start_tag);
                }
                continue;
            }
            let at_root = frame.start_tag.is_none();
            let r = self.stream[frame.cursor] as usize;
            frame.cursor += 1;
            self.node(r, at_root);
        }
    }

    fn node(&mut self, r: usize, at_root: bool) {
        let s = self.stream;
        match s[r] {
            recorded::TEXT => self.code.extend_from_slice(&[bytecode::TEXT, s[r + 1], s[r + 2]]),
            recorded::RAW => self.code.extend_from_slice(&[bytecode::RAW, s[r + 1], s[r + 2]]),
            recorded::DOCTYPE => self.code.push(bytecode::DOCTYPE),
            recorded::ATTR_VALUE | recorded::ATTR_BOOLEAN => {
                if at_root {
                    panic!("attribute at document root (offset {r})");
                }
                // Emitted with the owning start tag.
            }
            recorded::ELEMENT => self.element(r),
            tag => panic!(
                "unknown instruction {} ({tag:#x}) at offset {r}",
                recorded::tag_name(tag)
            ),
        }
    }

    fn element(&mut self, r: usize) {
        let s = self.stream;
        let end = r + s[r + 1] as usize;
        if s.get(end - 1) != Some(&recorded::ELEMENT_END) {
            panic!("unknown instruction: element at offset {r} is not terminated");
        }
        let name = ElementName(s[r + 2]);
        let kind = self.names.element_kind(name);
        let n = s[end - 2] as usize;
        let refs_start = end - 2 - n;
        let refs_end = end - 2;

        let start_tag = self.code.len();
        self.code.extend_from_slice(&[bytecode::START_TAG, name.0, 0]);

        self.attrs.clear();
        let mut has_children = false;
        for &child in &s[refs_start..refs_end] {
            match s[child as usize] {
                recorded::ATTR_VALUE | recorded::ATTR_BOOLEAN => self.attrs.push(child),
                _ => has_children = true,
            }
        }
        self.attributes();

        if kind.is_void {
            if has_children {
                panic!("void element <{}> cannot have children", self.names.element(name));
            }
            self.code.push(bytecode::SELF_CLOSING_END);
            self.patch_span(start_tag);
            return;
        }
        self.code
            .extend_from_slice(&[bytecode::START_TAG_END, u32::from(has_children)]);
        self.frames.push(Frame {
            cursor: refs_start,
            end: refs_end,
            start_tag: Some(start_tag),
            name,
        });
    }

    /// Group `self.attrs` by name in first-seen order.
    fn attributes(&mut self) {
        let s = self.stream;
        for (i, &first) in self.attrs.iter().enumerate() {
            let name = AttributeName(s[first as usize + 1]);
            let seen = self.attrs[..i]
                .iter()
                .any(|&prev| s[prev as usize + 1] == name.0);
            if seen {
                continue;
            }
            self.code.extend_from_slice(&[bytecode::ATTRIBUTE, name.0]);
            let mut values = 0usize;
            for &a in &self.attrs[i..] {
                let a = a as usize;
                if s[a + 1] != name.0 || s[a] != recorded::ATTR_VALUE {
                    continue;
                }
                let op = if values == 0 {
                    bytecode::VALUE_FIRST
                } else {
                    bytecode::VALUE_NEXT
                };
                self.code.extend_from_slice(&[op, s[a + 2], s[a + 3]]);
                values += 1;
            }
            if values > 0 {
                self.code.push(bytecode::VALUE_END);
            }
        }
    }

    fn patch_span(&mut self, start_tag: usize) {
        self.code[start_tag + 2] = index(self.code.len() - start_tag);
    }
}
