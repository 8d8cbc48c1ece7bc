//! Builder surface over the [`Recorder`].
//!
//! Arguments are evaluated before the call that receives them, so
//! `h.element(DIV, &[h.id("x"), h.text("hi")])` records the attribute and the
//! text first; the element then claims them by their tokens.

use std::borrow::Cow;
use std::cell::RefCell;

use crate::compiler::CompiledHtml;
use crate::names::{AttributeName, ElementName, NameError, attribute};
use crate::recorder::{RecordedTemplate, Recorder, RecorderConfig};
use crate::writer::WriterConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Attribute,
    Element,
    Text,
    Raw,
    Doctype,
    Fragment,
    NoOp,
}

/// Token returned by every builder call; passed back as an argument to the
/// element or fragment that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    kind: InstructionKind,
    record: u32,
}

impl Instruction {
    pub const NOOP: Instruction = Instruction {
        kind: InstructionKind::NoOp,
        record: u32::MAX,
    };

    pub(crate) fn new(kind: InstructionKind, record: u32) -> Self {
        Self { kind, record }
    }

    pub fn kind(self) -> InstructionKind {
        self.kind
    }

    pub(crate) fn record(self) -> Option<u32> {
        (self.kind != InstructionKind::NoOp).then_some(self.record)
    }
}

/// An attribute with its value, owned outside any recording. The same value
/// can be passed to any number of elements, in any number of templates; it is
/// recorded each time an element receives it.
///
/// Custom attribute names are interned per recording, so objects meant for
/// reuse across templates should use standard names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeObject {
    name: AttributeName,
    value: Cow<'static, str>,
}

impl AttributeObject {
    pub const fn new(name: AttributeName, value: &'static str) -> Self {
        Self {
            name,
            value: Cow::Borrowed(value),
        }
    }

    pub fn owned(name: AttributeName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: Cow::Owned(value.into()),
        }
    }

    pub const fn id(value: &'static str) -> Self {
        Self::new(attribute::ID, value)
    }

    pub const fn class_name(value: &'static str) -> Self {
        Self::new(attribute::CLASS, value)
    }

    pub fn name(&self) -> AttributeName {
        self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A reusable piece of markup.
pub trait Template {
    fn render(&self, h: &Html);

    fn record(&self) -> RecordedTemplate {
        let h = Html::new();
        self.render(&h);
        h.finish()
    }

    fn compile(&self) -> CompiledHtml {
        self.record().compile()
    }

    fn to_html_string(&self) -> String {
        self.compile().to_string()
    }

    fn to_pretty_string(&self) -> String {
        self.compile().display(WriterConfig::pretty()).to_string()
    }
}

pub struct Html {
    recorder: RefCell<Recorder>,
}

impl Html {
    pub fn new() -> Self {
        Self::from_recorder(Recorder::new())
    }

    pub fn with_config(config: RecorderConfig) -> Self {
        Self::from_recorder(Recorder::with_config(config))
    }

    pub fn from_recorder(recorder: Recorder) -> Self {
        Self {
            recorder: RefCell::new(recorder),
        }
    }

    pub fn finish(self) -> RecordedTemplate {
        self.recorder.into_inner().finish()
    }

    /// Finish the current recording and keep the recorder for another one.
    pub fn take(&self) -> RecordedTemplate {
        self.recorder.borrow_mut().finish()
    }

    pub fn doctype(&self) -> Instruction {
        let record = self.recorder.borrow_mut().doctype();
        Instruction::new(InstructionKind::Doctype, record)
    }

    /// # Panics
    ///
    /// Panics if `args` are not the latest instructions recorded at this
    /// nesting level, in order, or if `name` is void and `args` contain
    /// anything but attributes.
    pub fn element(&self, name: ElementName, args: &[Instruction]) -> Instruction {
        let mut rec = self.recorder.borrow_mut();
        rec.open_element_claiming(name, args);
        let record = rec.close_element();
        Instruction::new(InstructionKind::Element, record)
    }

    /// Element whose leading attributes are `objects`, followed by `args`.
    ///
    /// # Panics
    ///
    /// Panics as [`Html::element`] does.
    pub fn element_with(
        &self,
        name: ElementName,
        objects: &[AttributeObject],
        args: &[Instruction],
    ) -> Instruction {
        let mut rec = self.recorder.borrow_mut();
        rec.open_element_with(name, objects, args);
        let record = rec.close_element();
        Instruction::new(InstructionKind::Element, record)
    }

    /// Element whose only child is `text`.
    pub fn element_text(&self, name: ElementName, text: &str) -> Instruction {
        let child = self.text(text);
        self.element(name, &[child])
    }

    pub fn attr(&self, name: AttributeName, value: &str) -> Instruction {
        let record = self.recorder.borrow_mut().attribute(name, value);
        Instruction::new(InstructionKind::Attribute, record)
    }

    pub fn bool_attr(&self, name: AttributeName) -> Instruction {
        let record = self.recorder.borrow_mut().boolean_attribute(name);
        Instruction::new(InstructionKind::Attribute, record)
    }

    pub fn id(&self, value: &str) -> Instruction {
        self.attr(attribute::ID, value)
    }

    pub fn class(&self, value: &str) -> Instruction {
        self.attr(attribute::CLASS, value)
    }

    /// Record `object` as an ordinary argument.
    pub fn object(&self, object: &AttributeObject) -> Instruction {
        let record = self.recorder.borrow_mut().attribute_object(object);
        Instruction::new(InstructionKind::Attribute, record)
    }

    pub fn text(&self, value: &str) -> Instruction {
        let record = self.recorder.borrow_mut().text(value);
        Instruction::new(InstructionKind::Text, record)
    }

    /// Markup written verbatim, without escaping.
    pub fn raw(&self, value: &str) -> Instruction {
        let record = self.recorder.borrow_mut().raw(value);
        Instruction::new(InstructionKind::Raw, record)
    }

    pub fn noop(&self) -> Instruction {
        Instruction::NOOP
    }

    /// Group `args` so they can be passed around as one instruction.
    pub fn flatten(&self, args: &[Instruction]) -> Instruction {
        let record = self.recorder.borrow_mut().fragment_claiming(args);
        Instruction::new(InstructionKind::Fragment, record)
    }

    /// Everything recorded inside `f` becomes one fragment.
    pub fn include(&self, f: impl FnOnce(&Html)) -> Instruction {
        self.recorder.borrow_mut().fragment_begin();
        f(self);
        let record = self.recorder.borrow_mut().fragment_end();
        Instruction::new(InstructionKind::Fragment, record)
    }

    /// Like [`Html::include`], for fallible content. On error nothing that `f`
    /// recorded is kept.
    pub fn try_include<E>(&self, f: impl FnOnce(&Html) -> Result<(), E>) -> Result<Instruction, E> {
        self.recorder.borrow_mut().fragment_begin();
        match f(self) {
            Ok(()) => {
                let record = self.recorder.borrow_mut().fragment_end();
                Ok(Instruction::new(InstructionKind::Fragment, record))
            }
            Err(err) => {
                self.recorder.borrow_mut().fragment_abort();
                Err(err)
            }
        }
    }

    pub fn template(&self, template: &dyn Template) -> Instruction {
        self.include(|h| template.render(h))
    }

    /// # Panics
    ///
    /// Panics if `name` is not a valid markup name.
    pub fn custom_element(&self, name: &str) -> ElementName {
        self.try_custom_element(name)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_custom_element(&self, name: &str) -> Result<ElementName, NameError> {
        self.recorder.borrow_mut().intern_element(name)
    }

    /// # Panics
    ///
    /// Panics if `name` is not a valid markup name.
    pub fn custom_attribute(&self, name: &str) -> AttributeName {
        self.try_custom_attribute(name)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_custom_attribute(&self, name: &str) -> Result<AttributeName, NameError> {
        self.recorder.borrow_mut().intern_attribute(name)
    }

    /// Unique id within this recording: `html-1`, `html-2`, ...
    pub fn next_id(&self) -> String {
        self.recorder.borrow_mut().next_id()
    }
}

impl Default for Html {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::event_lines;
    use crate::names::{attribute, element};

    fn events(t: RecordedTemplate) -> Vec<String> {
        event_lines(&t.compile())
    }

    #[test]
    fn nested_arguments_play_in_document_order() {
        let h = Html::new();
        h.element(
            element::DIV,
            &[h.id("x"), h.element(element::SPAN, &[h.text("hi")])],
        );
        assert_eq!(
            events(h.finish()),
            vec![
                "start_tag div",
                "attribute id",
                "value_first \"x\"",
                "value_end",
                "start_tag_end children",
                "start_tag span",
                "start_tag_end children",
                "text \"hi\"",
                "end_tag span",
                "end_tag div",
            ]
        );
    }

    #[test]
    fn noop_arguments_are_ignored() {
        let h = Html::new();
        let show_title = false;
        h.element(
            element::DIV,
            &[
                if show_title { h.text("title") } else { h.noop() },
                h.text("body"),
            ],
        );
        assert_eq!(h.finish().compile().to_string(), "<div>body</div>");
    }

    #[test]
    fn include_and_flatten_splice_in_place() {
        let h = Html::new();
        let items = ["a", "b"];
        h.element(
            element::UL,
            &[
                h.class("list"),
                h.include(|h| {
                    for item in items {
                        h.element_text(element::LI, item);
                    }
                }),
                h.flatten(&[h.element_text(element::LI, "c"), h.noop()]),
            ],
        );
        assert_eq!(
            h.finish().compile().to_string(),
            "<ul class=\"list\"><li>a</li><li>b</li><li>c</li></ul>"
        );
    }

    #[test]
    fn templates_inline_into_their_caller() {
        struct Item<'a>(&'a str);
        impl Template for Item<'_> {
            fn render(&self, h: &Html) {
                h.element(element::LI, &[h.text(self.0)]);
            }
        }
        struct List;
        impl Template for List {
            fn render(&self, h: &Html) {
                h.element(
                    element::OL,
                    &[h.template(&Item("one")), h.template(&Item("two"))],
                );
            }
        }
        assert_eq!(List.to_html_string(), "<ol><li>one</li><li>two</li></ol>");
        assert_eq!(
            List.to_pretty_string(),
            "<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n"
        );
    }

    const CARD: AttributeObject = AttributeObject::class_name("card");

    struct Note;
    impl Template for Note {
        fn render(&self, h: &Html) {
            h.element_with(element::DIV, &[CARD], &[h.text("note")]);
        }
    }

    struct Panel(&'static str);
    impl Template for Panel {
        fn render(&self, h: &Html) {
            h.element_with(
                element::SECTION,
                &[CARD, AttributeObject::id(self.0)],
                &[h.class("wide"), h.element(element::P, &[h.object(&CARD)])],
            );
        }
    }

    #[test]
    fn attribute_objects_are_reused_across_templates() {
        assert_eq!(Note.to_html_string(), "<div class=\"card\">note</div>");
        assert_eq!(
            Panel("p1").to_html_string(),
            "<section class=\"card wide\" id=\"p1\"><p class=\"card\"></p></section>"
        );
        assert_eq!(Note.to_html_string(), "<div class=\"card\">note</div>");
        assert_eq!(CARD.value(), "card");
    }

    #[test]
    fn owned_attribute_objects_and_void_elements() {
        let alt = AttributeObject::owned(attribute::ALT, format!("photo {}", 1));
        let h = Html::new();
        h.element_with(element::IMG, &[alt.clone()], &[h.attr(attribute::SRC, "a.png")]);
        h.element_with(element::IMG, &[alt], &[]);
        assert_eq!(
            h.finish().compile().to_string(),
            "<img alt=\"photo 1\" src=\"a.png\"><img alt=\"photo 1\">"
        );
    }

    #[test]
    #[should_panic(expected = "malformed nesting")]
    fn objects_do_not_relax_argument_claiming() {
        let h = Html::new();
        let text = h.text("once");
        h.element_with(element::P, &[CARD], &[text]);
        h.element_with(element::P, &[CARD], &[text]);
    }

    #[test]
    fn try_include_discards_failed_content() {
        let h = Html::new();
        let failed: Result<Instruction, &str> = h.try_include(|h| {
            h.element_text(element::P, "partial");
            Err("boom")
        });
        assert_eq!(failed, Err("boom"));
        let ok: Result<Instruction, &str> = h.try_include(|h| {
            h.element_text(element::P, "kept");
            Ok(())
        });
        let ok = ok.unwrap();
        h.element(element::DIV, &[ok]);
        assert_eq!(h.finish().compile().to_string(), "<div><p>kept</p></div>");
    }

    #[test]
    fn generated_ids_are_unique_per_recording() {
        let h = Html::new();
        let a = h.next_id();
        let b = h.next_id();
        h.element(element::LABEL, &[h.attr(attribute::FOR, &a)]);
        h.element(element::INPUT, &[h.id(&a), h.attr(attribute::NAME, &b)]);
        assert_eq!((a.as_str(), b.as_str()), ("html-1", "html-2"));
        assert_eq!(
            h.finish().compile().to_string(),
            "<label for=\"html-1\"></label><input id=\"html-1\" name=\"html-2\">"
        );
        assert_eq!(Html::new().next_id(), "html-1");
    }

    #[test]
    fn custom_names_render_like_standard_ones() {
        let h = Html::new();
        let widget = h.custom_element("x-widget");
        let role = h.custom_attribute("data-role");
        h.element(widget, &[h.attr(role, "main"), h.bool_attr(attribute::HIDDEN)]);
        assert_eq!(
            h.finish().compile().to_string(),
            "<x-widget data-role=\"main\" hidden></x-widget>"
        );
    }

    #[test]
    fn take_allows_recording_again() {
        let h = Html::new();
        h.element_text(element::P, "one");
        let first = h.take();
        h.element_text(element::P, "two");
        let second = h.take();
        assert_eq!(first.compile().to_string(), "<p>one</p>");
        assert_eq!(second.compile().to_string(), "<p>two</p>");
    }

    #[test]
    #[should_panic(expected = "invalid markup name")]
    fn invalid_custom_name_panics() {
        Html::new().custom_element("not valid");
    }

    #[test]
    #[should_panic(expected = "void element <img> cannot have children")]
    fn void_element_rejects_children() {
        let h = Html::new();
        h.element(element::IMG, &[h.attr(attribute::SRC, "a.png"), h.text("x")]);
    }

    #[test]
    #[should_panic(expected = "malformed nesting")]
    fn reusing_a_claimed_instruction_panics() {
        let h = Html::new();
        let text = h.text("once");
        h.element(element::P, &[text]);
        h.element(element::P, &[text]);
    }
}
