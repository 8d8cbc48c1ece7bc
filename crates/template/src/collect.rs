//! Structural queries over the pull iterators.
//!
//! Queries never build a tree; subtrees a query does not need are skipped
//! without being visited.

use crate::compiler::CompiledHtml;
use crate::names::{AttributeName, ElementName, attribute};
use crate::pull::{Element, Node, Nodes};

/// What [`walk`] does after visiting a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
    /// Visit the node's children next (elements only).
    Descend,
    /// Continue with the node's next sibling.
    Skip,
    Stop,
}

/// Depth-first pre-order traversal starting at `root`, on an explicit stack.
pub fn walk<'a>(root: Nodes<'a>, mut visit: impl FnMut(&Node<'a>) -> Walk) {
    let mut stack = vec![root];
    while let Some(nodes) = stack.last_mut() {
        let Some(node) = nodes.next() else {
            stack.pop();
            continue;
        };
        match visit(&node) {
            Walk::Stop => return,
            Walk::Skip => {}
            Walk::Descend => {
                if let Node::Element(e) = &node {
                    stack.push(e.children());
                }
            }
        }
    }
}

/// First element in document order whose `id` is `id`.
pub fn element_by_id<'a>(html: &'a CompiledHtml, id: &str) -> Option<Element<'a>> {
    let mut found = None;
    walk(html.pull(), |node| {
        if let Node::Element(e) = node
            && e.attribute(attribute::ID).and_then(|a| a.value()) == Some(id)
        {
            found = Some(e.clone());
            return Walk::Stop;
        }
        Walk::Descend
    });
    found
}

/// Concatenated text of all descendants of `element`. Raw markup is not text.
///
/// # Panics
///
/// Panics if the element's children were already requested.
pub fn text_content(element: &Element<'_>) -> String {
    let mut out = String::new();
    walk(element.children(), |node| {
        if let Node::Text(text) = node {
            out.push_str(text);
        }
        Walk::Descend
    });
    out
}

pub fn count_elements(html: &CompiledHtml) -> usize {
    let mut count = 0;
    walk(html.pull(), |node| {
        if matches!(node, Node::Element(_)) {
            count += 1;
        }
        Walk::Descend
    });
    count
}

/// Every value of `attr` on elements named `name`, in document order.
pub fn attribute_values<'a>(
    html: &'a CompiledHtml,
    name: ElementName,
    attr: AttributeName,
) -> Vec<&'a str> {
    let mut out = Vec::new();
    walk(html.pull(), |node| {
        if let Node::Element(e) = node
            && e.name_code() == name
            && let Some(a) = e.attribute(attr)
        {
            out.extend(a.values());
        }
        Walk::Descend
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Html;
    use crate::names::element;

    fn page() -> CompiledHtml {
        let h = Html::new();
        h.element(
            element::HTML,
            &[
                h.element(
                    element::HEAD,
                    &[
                        h.element(
                            element::LINK,
                            &[h.attr(attribute::REL, "preload Stylesheet"), h.attr(attribute::HREF, "a.css")],
                        ),
                        h.element(element::LINK, &[h.attr(attribute::REL, "icon"), h.attr(attribute::HREF, "i.png")]),
                        h.element(element::STYLE, &[h.text("p { color: red }")]),
                    ],
                ),
                h.element(
                    element::BODY,
                    &[
                        h.element(
                            element::DIV,
                            &[
                                h.id("main"),
                                h.class("x"),
                                h.text("Hello "),
                                h.element_text(element::EM, "world"),
                                h.raw("<!-- -->"),
                            ],
                        ),
                        h.element(element::DIV, &[h.id("other"), h.class("y"), h.class("z")]),
                    ],
                ),
            ],
        );
        h.finish().compile()
    }

    #[test]
    fn finds_elements_by_id() {
        let html = page();
        let main = element_by_id(&html, "main").unwrap();
        assert_eq!(main.name(), "div");
        assert_eq!(text_content(&main), "Hello world");
        assert!(element_by_id(&html, "missing").is_none());
    }

    #[test]
    fn counts_and_collects_attribute_values() {
        let html = page();
        assert_eq!(count_elements(&html), 9);
        assert_eq!(
            attribute_values(&html, element::DIV, attribute::CLASS),
            vec!["x", "y", "z"]
        );
    }

    #[test]
    fn walk_skips_subtrees() {
        let html = page();
        let mut seen = 0;
        walk(html.pull(), |node| {
            let Node::Element(e) = node else {
                return Walk::Descend;
            };
            seen += 1;
            if e.name_code() == element::HEAD {
                Walk::Skip
            } else {
                Walk::Descend
            }
        });
        assert_eq!(seen, 6);
    }

    #[test]
    fn walk_stops_early() {
        let html = page();
        let mut seen = Vec::new();
        walk(html.pull(), |node| {
            if let Node::Element(e) = node {
                seen.push(e.name());
                if e.name_code() == element::HEAD {
                    return Walk::Stop;
                }
            }
            Walk::Descend
        });
        assert_eq!(seen, vec!["html", "head"]);
    }
}
