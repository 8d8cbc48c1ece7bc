use crate::names::ElementKind;

/// Receives a compiled document's events, once and in document order.
///
/// For every element the sequence is `start_tag`, its attributes, then either
/// `self_closing_end` (void elements) or `start_tag_end`, the children and
/// `end_tag`. Each attribute is `attribute` followed, when it has values, by
/// `attribute_first_value`, any `attribute_next_value` and
/// `attribute_value_end`.
pub trait Visitor {
    fn document_start(&mut self) {}

    fn doctype(&mut self);

    fn start_tag(&mut self, name: &str, kind: ElementKind);

    fn attribute(&mut self, name: &str);

    fn attribute_first_value(&mut self, value: &str);

    fn attribute_next_value(&mut self, value: &str);

    fn attribute_value_end(&mut self);

    /// `has_children` is false for `<tag></tag>`.
    fn start_tag_end(&mut self, has_children: bool);

    fn self_closing_end(&mut self);

    fn text(&mut self, text: &str);

    fn raw(&mut self, raw: &str);

    fn end_tag(&mut self, name: &str, kind: ElementKind);

    fn document_end(&mut self) {}
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn document_start(&mut self) {
        (**self).document_start();
    }
    fn doctype(&mut self) {
        (**self).doctype();
    }
    fn start_tag(&mut self, name: &str, kind: ElementKind) {
        (**self).start_tag(name, kind);
    }
    fn attribute(&mut self, name: &str) {
        (**self).attribute(name);
    }
    fn attribute_first_value(&mut self, value: &str) {
        (**self).attribute_first_value(value);
    }
    fn attribute_next_value(&mut self, value: &str) {
        (**self).attribute_next_value(value);
    }
    fn attribute_value_end(&mut self) {
        (**self).attribute_value_end();
    }
    fn start_tag_end(&mut self, has_children: bool) {
        (**self).start_tag_end(has_children);
    }
    fn self_closing_end(&mut self) {
        (**self).self_closing_end();
    }
    fn text(&mut self, text: &str) {
        (**self).text(text);
    }
    fn raw(&mut self, raw: &str) {
        (**self).raw(raw);
    }
    fn end_tag(&mut self, name: &str, kind: ElementKind) {
        (**self).end_tag(name, kind);
    }
    fn document_end(&mut self) {
        (**self).document_end();
    }
}
