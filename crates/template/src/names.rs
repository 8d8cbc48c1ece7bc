//! Element and attribute name codes.
//!
//! Standard HTML names have fixed codes exposed as constants in [`element`]
//! and [`attribute`]. Any other name is interned per template in a
//! [`NameTable`] and receives a code above the standard range.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque element name code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementName(pub(crate) u32);

/// Opaque attribute name code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeName(pub(crate) u32);

impl ElementName {
    pub fn code(self) -> u32 {
        self.0
    }
}

impl AttributeName {
    pub fn code(self) -> u32 {
        self.0
    }
}

/// Rendering category of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ElementKind {
    /// Never has children and never has an end tag.
    pub is_void: bool,
    /// Laid out inline by the pretty writer.
    pub is_phrasing: bool,
    /// Text children are written verbatim (`script`, `style`).
    pub is_raw_text: bool,
}

impl ElementKind {
    pub const NORMAL: ElementKind = ElementKind {
        is_void: false,
        is_phrasing: false,
        is_raw_text: false,
    };
    pub const VOID: ElementKind = ElementKind {
        is_void: true,
        is_phrasing: false,
        is_raw_text: false,
    };
    pub const PHRASING: ElementKind = ElementKind {
        is_void: false,
        is_phrasing: true,
        is_raw_text: false,
    };
    pub const VOID_PHRASING: ElementKind = ElementKind {
        is_void: true,
        is_phrasing: true,
        is_raw_text: false,
    };
    pub const RAW_TEXT: ElementKind = ElementKind {
        is_void: false,
        is_phrasing: false,
        is_raw_text: true,
    };
}

macro_rules! element_names {
    ($($ident:ident => $name:literal, $kind:ident;)*) => {
        #[allow(dead_code, non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u32)]
        enum ElementIndex {
            $($ident,)*
        }

        /// Standard HTML element names.
        pub mod element {
            use super::{ElementIndex, ElementName};
            $(pub const $ident: ElementName = ElementName(ElementIndex::$ident as u32);)*
        }

        const ELEMENT_TABLE: &[(&str, ElementKind)] = &[$(($name, ElementKind::$kind),)*];

        fn standard_element(name: &str) -> Option<ElementName> {
            match name {
                $($name => Some(element::$ident),)*
                _ => None,
            }
        }
    };
}

macro_rules! attribute_names {
    ($($ident:ident => $name:literal;)*) => {
        #[allow(dead_code, non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u32)]
        enum AttributeIndex {
            $($ident,)*
        }

        /// Standard HTML attribute names.
        pub mod attribute {
            use super::{AttributeIndex, AttributeName};
            $(pub const $ident: AttributeName = AttributeName(AttributeIndex::$ident as u32);)*
        }

        const ATTRIBUTE_TABLE: &[&str] = &[$($name,)*];

        fn standard_attribute(name: &str) -> Option<AttributeName> {
            match name {
                $($name => Some(attribute::$ident),)*
                _ => None,
            }
        }
    };
}

element_names! {
    A => "a", PHRASING;
    ABBR => "abbr", PHRASING;
    ADDRESS => "address", NORMAL;
    AREA => "area", VOID;
    ARTICLE => "article", NORMAL;
    ASIDE => "aside", NORMAL;
    AUDIO => "audio", NORMAL;
    B => "b", PHRASING;
    BASE => "base", VOID;
    BDI => "bdi", NORMAL;
    BDO => "bdo", NORMAL;
    BLOCKQUOTE => "blockquote", NORMAL;
    BODY => "body", NORMAL;
    BR => "br", VOID_PHRASING;
    BUTTON => "button", PHRASING;
    CANVAS => "canvas", NORMAL;
    CAPTION => "caption", NORMAL;
    CITE => "cite", NORMAL;
    CODE => "code", PHRASING;
    COL => "col", VOID;
    COLGROUP => "colgroup", NORMAL;
    DATA => "data", NORMAL;
    DATALIST => "datalist", NORMAL;
    DD => "dd", NORMAL;
    DEL => "del", NORMAL;
    DETAILS => "details", NORMAL;
    DFN => "dfn", NORMAL;
    DIALOG => "dialog", NORMAL;
    DIV => "div", NORMAL;
    DL => "dl", NORMAL;
    DT => "dt", NORMAL;
    EM => "em", PHRASING;
    EMBED => "embed", VOID;
    FIELDSET => "fieldset", NORMAL;
    FIGCAPTION => "figcaption", NORMAL;
    FIGURE => "figure", NORMAL;
    FOOTER => "footer", NORMAL;
    FORM => "form", NORMAL;
    H1 => "h1", NORMAL;
    H2 => "h2", NORMAL;
    H3 => "h3", NORMAL;
    H4 => "h4", NORMAL;
    H5 => "h5", NORMAL;
    H6 => "h6", NORMAL;
    HEAD => "head", NORMAL;
    HEADER => "header", NORMAL;
    HGROUP => "hgroup", NORMAL;
    HR => "hr", VOID;
    HTML => "html", NORMAL;
    I => "i", NORMAL;
    IFRAME => "iframe", NORMAL;
    IMG => "img", VOID_PHRASING;
    INPUT => "input", VOID_PHRASING;
    INS => "ins", NORMAL;
    KBD => "kbd", PHRASING;
    LABEL => "label", PHRASING;
    LEGEND => "legend", NORMAL;
    LI => "li", NORMAL;
    LINK => "link", VOID;
    MAIN => "main", NORMAL;
    MAP => "map", NORMAL;
    MARK => "mark", NORMAL;
    MENU => "menu", NORMAL;
    META => "meta", VOID;
    METER => "meter", NORMAL;
    NAV => "nav", NORMAL;
    NOSCRIPT => "noscript", NORMAL;
    OBJECT => "object", NORMAL;
    OL => "ol", NORMAL;
    OPTGROUP => "optgroup", NORMAL;
    OPTION => "option", NORMAL;
    OUTPUT => "output", NORMAL;
    P => "p", NORMAL;
    PICTURE => "picture", NORMAL;
    PRE => "pre", NORMAL;
    PROGRESS => "progress", PHRASING;
    Q => "q", NORMAL;
    RP => "rp", NORMAL;
    RT => "rt", NORMAL;
    RUBY => "ruby", NORMAL;
    S => "s", NORMAL;
    SAMP => "samp", PHRASING;
    SCRIPT => "script", RAW_TEXT;
    SEARCH => "search", NORMAL;
    SECTION => "section", NORMAL;
    SELECT => "select", PHRASING;
    SLOT => "slot", NORMAL;
    SMALL => "small", PHRASING;
    SOURCE => "source", VOID;
    SPAN => "span", PHRASING;
    STRONG => "strong", PHRASING;
    STYLE => "style", RAW_TEXT;
    SUB => "sub", PHRASING;
    SUMMARY => "summary", NORMAL;
    SUP => "sup", PHRASING;
    SVG => "svg", PHRASING;
    TABLE => "table", NORMAL;
    TBODY => "tbody", NORMAL;
    TD => "td", NORMAL;
    TEMPLATE => "template", PHRASING;
    TEXTAREA => "textarea", PHRASING;
    TFOOT => "tfoot", NORMAL;
    TH => "th", NORMAL;
    THEAD => "thead", NORMAL;
    TIME => "time", NORMAL;
    TITLE => "title", NORMAL;
    TR => "tr", NORMAL;
    TRACK => "track", VOID;
    U => "u", NORMAL;
    UL => "ul", NORMAL;
    VAR => "var", NORMAL;
    VIDEO => "video", NORMAL;
    WBR => "wbr", VOID;
}

attribute_names! {
    ACCEPT => "accept";
    ACCESSKEY => "accesskey";
    ACTION => "action";
    ALT => "alt";
    ARIA_HIDDEN => "aria-hidden";
    ARIA_LABEL => "aria-label";
    AS => "as";
    ASYNC => "async";
    AUTOCOMPLETE => "autocomplete";
    AUTOFOCUS => "autofocus";
    AUTOPLAY => "autoplay";
    CHARSET => "charset";
    CHECKED => "checked";
    CITE => "cite";
    CLASS => "class";
    COLS => "cols";
    COLSPAN => "colspan";
    CONTENT => "content";
    CONTENTEDITABLE => "contenteditable";
    CONTROLS => "controls";
    CROSSORIGIN => "crossorigin";
    DATA => "data";
    DATETIME => "datetime";
    DECODING => "decoding";
    DEFAULT => "default";
    DEFER => "defer";
    DIR => "dir";
    DISABLED => "disabled";
    DOWNLOAD => "download";
    DRAGGABLE => "draggable";
    ENCTYPE => "enctype";
    FOR => "for";
    FORM => "form";
    FORMACTION => "formaction";
    HEADERS => "headers";
    HEIGHT => "height";
    HIDDEN => "hidden";
    HIGH => "high";
    HREF => "href";
    HREFLANG => "hreflang";
    HTTP_EQUIV => "http-equiv";
    ID => "id";
    INERT => "inert";
    INPUTMODE => "inputmode";
    INTEGRITY => "integrity";
    IS => "is";
    ITEMPROP => "itemprop";
    KIND => "kind";
    LABEL => "label";
    LANG => "lang";
    LIST => "list";
    LOADING => "loading";
    LOOP => "loop";
    LOW => "low";
    MAX => "max";
    MAXLENGTH => "maxlength";
    MEDIA => "media";
    METHOD => "method";
    MIN => "min";
    MINLENGTH => "minlength";
    MULTIPLE => "multiple";
    MUTED => "muted";
    NAME => "name";
    NONCE => "nonce";
    NOVALIDATE => "novalidate";
    OPEN => "open";
    OPTIMUM => "optimum";
    PATTERN => "pattern";
    PING => "ping";
    PLACEHOLDER => "placeholder";
    POPOVER => "popover";
    POSTER => "poster";
    PRELOAD => "preload";
    READONLY => "readonly";
    REFERRERPOLICY => "referrerpolicy";
    REL => "rel";
    REQUIRED => "required";
    REVERSED => "reversed";
    ROLE => "role";
    ROWS => "rows";
    ROWSPAN => "rowspan";
    SANDBOX => "sandbox";
    SCOPE => "scope";
    SELECTED => "selected";
    SHAPE => "shape";
    SIZE => "size";
    SIZES => "sizes";
    SLOT => "slot";
    SPAN => "span";
    SPELLCHECK => "spellcheck";
    SRC => "src";
    SRCDOC => "srcdoc";
    SRCLANG => "srclang";
    SRCSET => "srcset";
    START => "start";
    STEP => "step";
    STYLE => "style";
    TABINDEX => "tabindex";
    TARGET => "target";
    TITLE => "title";
    TRANSLATE => "translate";
    TYPE => "type";
    USEMAP => "usemap";
    VALUE => "value";
    WIDTH => "width";
    WRAP => "wrap";
}

/// Number of standard element codes; custom element codes start here.
pub const STANDARD_ELEMENTS: u32 = ELEMENT_TABLE.len() as u32;
/// Number of standard attribute codes; custom attribute codes start here.
pub const STANDARD_ATTRIBUTES: u32 = ATTRIBUTE_TABLE.len() as u32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    /// Empty name, or a name containing whitespace, quotes, `<`, `>`, `/` or `=`.
    Invalid(String),
    OutOfCodes,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Invalid(name) => write!(f, "invalid markup name {name:?}"),
            NameError::OutOfCodes => write!(f, "document too large: name table exhausted"),
        }
    }
}

impl std::error::Error for NameError {}

/// Per-template interning table for names outside the standard set.
///
/// Codes are assigned densely starting at `base`, in first-intern order.
#[derive(Clone, Debug)]
pub struct NameTable {
    base: u32,
    names: Vec<Arc<str>>,
    map: HashMap<Arc<str>, u32>,
}

impl NameTable {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            names: Vec::new(),
            map: HashMap::new(),
        }
    }

    pub fn intern(&mut self, name: &str) -> Result<u32, NameError> {
        if let Some(code) = self.map.get(name) {
            return Ok(*code);
        }
        if !is_valid_name(name) {
            return Err(NameError::Invalid(name.to_string()));
        }
        let idx: u32 = self
            .names
            .len()
            .try_into()
            .map_err(|_| NameError::OutOfCodes)?;
        let code = self.base.checked_add(idx).ok_or(NameError::OutOfCodes)?;
        let name = Arc::<str>::from(name);
        self.names.push(Arc::clone(&name));
        self.map.insert(name, code);
        Ok(code)
    }

    pub fn resolve(&self, code: u32) -> Option<&str> {
        let idx = code.checked_sub(self.base)?;
        self.names.get(idx as usize).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.map.clear();
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            !b.is_ascii_whitespace()
                && !b.is_ascii_control()
                && !matches!(b, b'"' | b'\'' | b'<' | b'>' | b'/' | b'=')
        })
}

/// Name resolution for one document: the standard tables plus its custom names.
#[derive(Clone, Debug)]
pub struct Names {
    elements: NameTable,
    attributes: NameTable,
}

impl Names {
    pub fn new() -> Self {
        Self {
            elements: NameTable::new(STANDARD_ELEMENTS),
            attributes: NameTable::new(STANDARD_ATTRIBUTES),
        }
    }

    /// Look a name up in the standard table, interning it as custom otherwise.
    pub fn intern_element(&mut self, name: &str) -> Result<ElementName, NameError> {
        if let Some(std) = standard_element(name) {
            return Ok(std);
        }
        self.elements.intern(name).map(ElementName)
    }

    pub fn intern_attribute(&mut self, name: &str) -> Result<AttributeName, NameError> {
        if let Some(std) = standard_attribute(name) {
            return Ok(std);
        }
        self.attributes.intern(name).map(AttributeName)
    }

    pub fn lookup_element(&self, name: &str) -> Option<ElementName> {
        standard_element(name).or_else(|| self.elements.map.get(name).copied().map(ElementName))
    }

    pub fn lookup_attribute(&self, name: &str) -> Option<AttributeName> {
        standard_attribute(name)
            .or_else(|| self.attributes.map.get(name).copied().map(AttributeName))
    }

    /// # Panics
    ///
    /// Panics if `name` is neither standard nor interned in this document.
    pub fn element(&self, name: ElementName) -> &str {
        match ELEMENT_TABLE.get(name.0 as usize) {
            Some((s, _)) => s,
            None => self
                .elements
                .resolve(name.0)
                .unwrap_or_else(|| panic!("unknown element name code {}", name.0)),
        }
    }

    pub fn element_kind(&self, name: ElementName) -> ElementKind {
        ELEMENT_TABLE
            .get(name.0 as usize)
            .map(|(_, kind)| *kind)
            .unwrap_or(ElementKind::NORMAL)
    }

    /// # Panics
    ///
    /// Panics if `name` is neither standard nor interned in this document.
    pub fn attribute(&self, name: AttributeName) -> &str {
        match ATTRIBUTE_TABLE.get(name.0 as usize) {
            Some(s) => s,
            None => self
                .attributes
                .resolve(name.0)
                .unwrap_or_else(|| panic!("unknown attribute name code {}", name.0)),
        }
    }

    pub fn custom_len(&self) -> usize {
        self.elements.len() + self.attributes.len()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.attributes.clear();
    }
}

impl Default for Names {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names_resolve_to_their_strings() {
        let names = Names::new();
        assert_eq!(names.element(element::DIV), "div");
        assert_eq!(names.element(element::WBR), "wbr");
        assert_eq!(names.attribute(attribute::HTTP_EQUIV), "http-equiv");
        assert_eq!(names.attribute(attribute::TITLE), "title");
        assert_eq!(names.lookup_element("title"), Some(element::TITLE));
        assert_eq!(names.lookup_attribute("title"), Some(attribute::TITLE));
    }

    #[test]
    fn element_kinds_follow_html_categories() {
        let names = Names::new();
        assert!(names.element_kind(element::BR).is_void);
        assert!(names.element_kind(element::BR).is_phrasing);
        assert!(names.element_kind(element::META).is_void);
        assert!(!names.element_kind(element::META).is_phrasing);
        assert!(names.element_kind(element::SCRIPT).is_raw_text);
        assert!(names.element_kind(element::SPAN).is_phrasing);
        assert_eq!(names.element_kind(element::DIV), ElementKind::NORMAL);
    }

    #[test]
    fn custom_names_get_codes_after_the_standard_range() {
        let mut names = Names::new();
        let x = names.intern_element("x-widget").unwrap();
        let y = names.intern_element("y-widget").unwrap();
        assert_eq!(x.code(), STANDARD_ELEMENTS);
        assert_eq!(y.code(), STANDARD_ELEMENTS + 1);
        assert_eq!(names.intern_element("x-widget").unwrap(), x);
        assert_eq!(names.element(y), "y-widget");
        assert_eq!(names.element_kind(x), ElementKind::NORMAL);

        let a = names.intern_attribute("data-role").unwrap();
        assert_eq!(a.code(), STANDARD_ATTRIBUTES);
        assert_eq!(names.attribute(a), "data-role");
    }

    #[test]
    fn standard_names_are_not_interned() {
        let mut names = Names::new();
        assert_eq!(names.intern_element("div").unwrap(), element::DIV);
        assert_eq!(names.intern_attribute("class").unwrap(), attribute::CLASS);
        assert_eq!(names.custom_len(), 0);
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut names = Names::new();
        for bad in ["", "a b", "x\"y", "<p", "a=b", "a/b"] {
            assert_eq!(
                names.intern_element(bad),
                Err(NameError::Invalid(bad.to_string()))
            );
        }
    }

    #[test]
    #[should_panic(expected = "unknown element name code")]
    fn resolving_a_foreign_code_panics() {
        let names = Names::new();
        names.element(ElementName(STANDARD_ELEMENTS + 7));
    }
}
