//! Pretty and minified HTML rendering as a [`Visitor`].

use std::fmt;
use std::io;

use crate::compiler::CompiledHtml;
use crate::error::RenderError;
use crate::escape;
use crate::names::ElementKind;
use crate::visitor::Visitor;

/// Character output of an [`HtmlWriter`].
pub trait Sink {
    fn write_str(&mut self, s: &str) -> Result<(), RenderError>;
}

impl Sink for String {
    fn write_str(&mut self, s: &str) -> Result<(), RenderError> {
        self.push_str(s);
        Ok(())
    }
}

/// Adapts any [`fmt::Write`].
pub struct FmtSink<W>(pub W);

impl<W: fmt::Write> Sink for FmtSink<W> {
    fn write_str(&mut self, s: &str) -> Result<(), RenderError> {
        Ok(self.0.write_str(s)?)
    }
}

/// Adapts any [`io::Write`]. Output is UTF-8.
pub struct IoSink<W>(pub W);

impl<W: io::Write> Sink for IoSink<W> {
    fn write_str(&mut self, s: &str) -> Result<(), RenderError> {
        Ok(self.0.write_all(s.as_bytes())?)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriterMode {
    #[default]
    Minified,
    Pretty,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// How void elements end: `<br>` or `<br />`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoidStyle {
    #[default]
    Html,
    SelfClosing,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriterConfig {
    pub mode: WriterMode,
    pub line_ending: LineEnding,
    pub void_style: VoidStyle,
}

impl WriterConfig {
    pub fn minified() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            mode: WriterMode::Pretty,
            ..Self::default()
        }
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_void_style(mut self, void_style: VoidStyle) -> Self {
        self.void_style = void_style;
        self
    }
}

/// Where the pretty printer stands relative to the last thing written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// Nothing written yet.
    Start,
    /// Right after a block element's start tag.
    BlockStart,
    /// Right after a block element (or doctype) ended.
    BlockEnd,
    /// Inline content.
    Phrase,
    /// Inside a raw-text element, or right after one closed.
    Script,
}

#[derive(Clone, Copy, Debug)]
struct Open {
    /// Layout once this element is closed.
    after: Layout,
    /// Layout of this element's content.
    inside: Layout,
    children: u32,
    raw_text: bool,
}

pub struct HtmlWriter<S: Sink> {
    sink: S,
    config: WriterConfig,
    error: Option<RenderError>,
    layout: Layout,
    open: Vec<Open>,
}

impl<S: Sink> HtmlWriter<S> {
    pub fn new(sink: S, config: WriterConfig) -> Self {
        Self {
            sink,
            config,
            error: None,
            layout: Layout::Start,
            open: Vec::new(),
        }
    }

    /// The first sink failure, if any. Once set, further events write nothing.
    pub fn error(&self) -> Option<&RenderError> {
        self.error.as_ref()
    }

    pub fn finish(self) -> Result<S, RenderError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.sink),
        }
    }

    fn pretty(&self) -> bool {
        self.config.mode == WriterMode::Pretty
    }

    fn fail(&mut self, err: RenderError) {
        log::debug!(target: "template.writer", "sink failed, discarding remaining output: {err}");
        self.error = Some(err);
    }

    fn write(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.sink.write_str(s) {
            self.fail(err);
        }
    }

    fn newline(&mut self) {
        if self.pretty() {
            self.write(self.config.line_ending.as_str());
        }
    }

    fn write_text_escaped(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        let sink = &mut self.sink;
        if let Err(err) = escape::text(s, |chunk| sink.write_str(chunk)) {
            self.fail(err);
        }
    }

    fn write_attribute_escaped(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        let sink = &mut self.sink;
        if let Err(err) = escape::attribute_value(s, |chunk| sink.write_str(chunk)) {
            self.fail(err);
        }
    }

    fn count_child(&mut self) {
        if let Some(parent) = self.open.last_mut() {
            parent.children += 1;
        }
    }

    fn in_raw_text(&self) -> bool {
        self.open.last().is_some_and(|o| o.raw_text)
    }

    /// Text is verbatim inside raw-text elements and escaped everywhere else.
    fn write_text(&mut self, text: &str) {
        if self.in_raw_text() {
            self.write(text);
        } else {
            self.write_text_escaped(text);
        }
    }
}

fn starts_with_newline(s: &str) -> bool {
    s.starts_with(['\n', '\r'])
}

fn ends_with_newline(s: &str) -> bool {
    s.ends_with(['\n', '\r'])
}

impl<S: Sink> Visitor for HtmlWriter<S> {
    fn doctype(&mut self) {
        self.count_child();
        if self.layout != Layout::Start {
            self.newline();
        }
        self.write("<!DOCTYPE html>");
        self.layout = Layout::BlockEnd;
    }

    fn start_tag(&mut self, name: &str, kind: ElementKind) {
        self.count_child();
        let open = if kind.is_raw_text {
            Open {
                after: Layout::Script,
                inside: Layout::Script,
                children: 0,
                raw_text: true,
            }
        } else if kind.is_phrasing {
            Open {
                after: Layout::Phrase,
                inside: Layout::Phrase,
                children: 0,
                raw_text: false,
            }
        } else {
            Open {
                after: Layout::BlockEnd,
                inside: Layout::BlockStart,
                children: 0,
                raw_text: false,
            }
        };
        let newline = if kind.is_phrasing {
            self.layout == Layout::BlockEnd
        } else {
            self.layout != Layout::Start
        };
        if newline {
            self.newline();
        }
        self.write("<");
        self.write(name);
        self.open.push(open);
    }

    fn attribute(&mut self, name: &str) {
        self.write(" ");
        self.write(name);
    }

    fn attribute_first_value(&mut self, value: &str) {
        self.write("=\"");
        self.write_attribute_escaped(value);
    }

    fn attribute_next_value(&mut self, value: &str) {
        self.write(" ");
        self.write_attribute_escaped(value);
    }

    fn attribute_value_end(&mut self) {
        self.write("\"");
    }

    fn start_tag_end(&mut self, _has_children: bool) {
        self.write(">");
        if let Some(open) = self.open.last() {
            self.layout = open.inside;
        }
    }

    fn self_closing_end(&mut self) {
        match self.config.void_style {
            VoidStyle::Html => self.write(">"),
            VoidStyle::SelfClosing => self.write(" />"),
        }
        if let Some(open) = self.open.pop() {
            self.layout = open.after;
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.count_child();
        match self.layout {
            Layout::Script => {
                if !starts_with_newline(text) {
                    self.newline();
                }
                self.write_text(text);
                if !ends_with_newline(text) {
                    self.newline();
                }
            }
            Layout::BlockEnd => {
                if !starts_with_newline(text) {
                    self.newline();
                }
                self.write_text(text);
            }
            _ => self.write_text(text),
        }
        self.layout = Layout::Phrase;
    }

    fn raw(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.count_child();
        self.write(raw);
        self.layout = Layout::Phrase;
    }

    fn end_tag(&mut self, name: &str, _kind: ElementKind) {
        if let Some(open) = self.open.pop() {
            if open.children > 0 {
                let newline = if open.after == Layout::Phrase {
                    self.layout == Layout::BlockEnd
                } else {
                    self.layout != Layout::Phrase
                };
                if newline {
                    self.newline();
                }
            }
            self.layout = open.after;
        }
        self.write("</");
        self.write(name);
        self.write(">");
    }

    fn document_end(&mut self) {
        if self.layout != Layout::Start {
            self.newline();
        }
    }
}

/// [`fmt::Display`] adapter rendering a document with a given configuration.
pub struct Render<'a> {
    html: &'a CompiledHtml,
    config: WriterConfig,
}

impl fmt::Display for Render<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = HtmlWriter::new(FmtSink(f), self.config.clone());
        self.html.play(&mut writer);
        writer.finish().map(|_| ()).map_err(|_| fmt::Error)
    }
}

impl CompiledHtml {
    /// Render into `sink`, returning it once the whole document is written.
    pub fn render<S: Sink>(&self, sink: S, config: WriterConfig) -> Result<S, RenderError> {
        let mut writer = HtmlWriter::new(sink, config);
        self.play(&mut writer);
        writer.finish()
    }

    pub fn write_to<W: io::Write>(&self, out: W, config: WriterConfig) -> Result<W, RenderError> {
        self.render(IoSink(out), config).map(|sink| sink.0)
    }

    pub fn display(&self, config: WriterConfig) -> Render<'_> {
        Render { html: self, config }
    }
}

/// Minified rendering.
impl fmt::Display for CompiledHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(WriterConfig::minified()), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Html;
    use crate::names::{attribute, element};

    fn document(h: &Html) {
        h.doctype();
        h.element(
            element::HTML,
            &[
                h.element(
                    element::HEAD,
                    &[h.element(element::META, &[h.attr(attribute::CHARSET, "utf-8")])],
                ),
                h.element(element::BODY, &[]),
            ],
        );
    }

    fn list(h: &Html) {
        h.element(
            element::UL,
            &[
                h.element_text(element::LI, "a"),
                h.element(element::LI, &[h.element_text(element::P, "b")]),
                h.element(element::LI, &[h.element_text(element::EM, "c")]),
            ],
        );
    }

    fn render(f: impl Fn(&Html), config: WriterConfig) -> String {
        let h = Html::new();
        f(&h);
        h.finish().compile().display(config).to_string()
    }

    #[test]
    fn pretty_document_skeleton() {
        assert_eq!(
            render(document, WriterConfig::pretty()),
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n<body></body>\n</html>\n"
        );
    }

    #[test]
    fn minified_document_skeleton() {
        assert_eq!(
            render(document, WriterConfig::minified()),
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body></body></html>"
        );
    }

    #[test]
    fn pretty_mixes_block_and_phrasing_children() {
        assert_eq!(
            render(list, WriterConfig::pretty()),
            "<ul>\n<li>a</li>\n<li>\n<p>b</p>\n</li>\n<li><em>c</em></li>\n</ul>\n"
        );
    }

    #[test]
    fn empty_element_followed_by_inline_sibling_has_no_blank_line() {
        let out = render(
            |h| {
                h.element(
                    element::DIV,
                    &[h.element(element::DIV, &[]), h.element_text(element::SPAN, "x")],
                );
            },
            WriterConfig::pretty(),
        );
        assert_eq!(out, "<div>\n<div></div>\n<span>x</span></div>\n");
        assert!(!out.contains("\n\n"));
    }

    #[test]
    fn phrasing_ending_after_block_content_breaks_the_line() {
        let out = render(
            |h| {
                h.element(element::A, &[h.element_text(element::DIV, "x")]);
            },
            WriterConfig::pretty(),
        );
        assert_eq!(out, "<a>\n<div>x</div>\n</a>\n");
    }

    #[test]
    fn text_after_block_starts_a_new_line() {
        let out = render(
            |h| {
                h.element(
                    element::DIV,
                    &[h.element_text(element::P, "x"), h.text("tail"), h.text("\nnl")],
                );
            },
            WriterConfig::pretty(),
        );
        assert_eq!(out, "<div>\n<p>x</p>\ntail\nnl</div>\n");
    }

    #[test]
    fn raw_text_elements_are_verbatim_on_their_own_lines() {
        let script = "if (a < b && c) { run(); }";
        let pretty = render(
            |h| {
                h.element(
                    element::HEAD,
                    &[h.element(element::SCRIPT, &[h.text(script)])],
                );
            },
            WriterConfig::pretty(),
        );
        assert_eq!(pretty, format!("<head>\n<script>\n{script}\n</script>\n</head>\n"));
        let minified = render(
            |h| {
                h.element(element::SCRIPT, &[h.text(script)]);
            },
            WriterConfig::minified(),
        );
        assert_eq!(minified, format!("<script>{script}</script>"));
    }

    #[test]
    fn raw_after_block_stays_on_the_same_line() {
        let out = render(
            |h| {
                h.element(element::DIV, &[h.element_text(element::P, "x"), h.raw("<!--c-->")]);
            },
            WriterConfig::pretty(),
        );
        assert_eq!(out, "<div>\n<p>x</p><!--c--></div>\n");
    }

    #[test]
    fn siblings_after_raw_text_element() {
        let inline = render(
            |h| {
                h.element(
                    element::BODY,
                    &[h.element_text(element::SCRIPT, "x"), h.element_text(element::SPAN, "y")],
                );
            },
            WriterConfig::pretty(),
        );
        assert_eq!(inline, "<body>\n<script>\nx\n</script><span>y</span></body>\n");

        let block = render(
            |h| {
                h.element(
                    element::BODY,
                    &[h.element_text(element::STYLE, "p {}\n"), h.element_text(element::DIV, "y")],
                );
            },
            WriterConfig::pretty(),
        );
        assert_eq!(block, "<body>\n<style>\np {}\n</style>\n<div>y</div>\n</body>\n");

        let text = render(
            |h| {
                h.element(element::BODY, &[h.element_text(element::SCRIPT, "x"), h.text("a<b")]);
            },
            WriterConfig::pretty(),
        );
        assert_eq!(text, "<body>\n<script>\nx\n</script>\na&lt;b\n</body>\n");
    }

    #[test]
    fn text_and_attributes_are_escaped_raw_is_not() {
        let out = render(
            |h| {
                h.element(
                    element::P,
                    &[h.attr(attribute::TITLE, "\"a&b\" &amp;"), h.text("1 < 2"), h.raw("<b>!</b>")],
                );
            },
            WriterConfig::minified(),
        );
        assert_eq!(out, "<p title=\"&#34;a&amp;b&#34; &amp;\">1 &lt; 2<b>!</b></p>");
    }

    #[test]
    fn void_style_and_line_ending_are_configurable() {
        let config = WriterConfig::pretty()
            .with_line_ending(LineEnding::CrLf)
            .with_void_style(VoidStyle::SelfClosing);
        let out = render(
            |h| {
                h.element(element::DIV, &[h.element(element::HR, &[])]);
            },
            config,
        );
        assert_eq!(out, "<div>\r\n<hr />\r\n</div>\r\n");
    }

    #[test]
    fn io_sink_collects_bytes() {
        let h = Html::new();
        h.element_text(element::P, "ü");
        let out = h
            .finish()
            .compile()
            .write_to(Vec::new(), WriterConfig::default())
            .unwrap();
        assert_eq!(out, "<p>ü</p>".as_bytes());
    }

    struct FailAfter {
        budget: usize,
        written: String,
        calls: usize,
    }

    impl Sink for FailAfter {
        fn write_str(&mut self, s: &str) -> Result<(), RenderError> {
            self.calls += 1;
            if self.written.len() + s.len() > self.budget {
                return Err(RenderError::Io(io::Error::other("disk full")));
            }
            self.written.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn first_sink_error_is_reported_once_and_output_stops() {
        let h = Html::new();
        list(&h);
        let html = h.finish().compile();
        let mut writer = HtmlWriter::new(
            FailAfter {
                budget: 6,
                written: String::new(),
                calls: 0,
            },
            WriterConfig::minified(),
        );
        html.play(&mut writer);
        assert!(writer.error().is_some());
        let calls = writer.sink.calls;
        assert_eq!(writer.sink.written, "<ul><");
        let err = writer.finish().err().unwrap();
        assert!(err.to_string().contains("disk full"));
        // Events after the failure never reach the sink.
        assert_eq!(calls, 5);
    }
}
