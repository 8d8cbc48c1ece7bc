//! Builder calls → flat recorded stream.
//!
//! Every record is appended to the stream as soon as its call runs, then its
//! offset is registered on the current nesting level's deferred segment. When
//! a level closes, its deferred segment is spliced into the owning record as
//! absolute refs in recording order, and the element's length field is
//! back-patched so the compiler can find the refs in O(1).
//!
//! Two entry styles share this machinery:
//! - call order: `open_element`, child calls, `close_element`;
//! - eager arguments: children are recorded first (as arguments), then
//!   `open_element_claiming` adopts exactly those trailing deferred entries.
//!   `open_element_with` also records [`AttributeObject`]s at that point,
//!   ahead of the claimed entries.

use crate::dsl::{AttributeObject, Instruction, InstructionKind};
use crate::names::{AttributeName, ElementName, NameError, Names};
use crate::proto::{index, recorded};

/// Initial buffer capacities for a [`Recorder`].
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    /// Words reserved in the recorded stream.
    pub stream_capacity: usize,
    /// Bytes reserved in the literal pool.
    pub pool_capacity: usize,
    /// Entries reserved in the deferred and level scratch tables.
    pub scratch_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            stream_capacity: 256,
            pool_capacity: 1024,
            scratch_capacity: 64,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub elements: u64,
    pub attributes: u64,
    pub texts: u64,
    pub fragments: u64,
    /// Refs re-emitted when levels close.
    pub splices: u64,
    pub max_depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LevelKind {
    Root,
    Element,
    Fragment,
}

#[derive(Clone, Copy, Debug)]
struct Level {
    kind: LevelKind,
    /// Stream offset of the owning record header.
    start: u32,
    /// First deferred entry owned by this level.
    deferred_start: usize,
    /// Pool length when the level opened; fragment rollback truncates to it.
    pool_start: usize,
    name: Option<ElementName>,
}

/// Output of a finished recording, consumed by [`RecordedTemplate::compile`].
#[derive(Clone, Debug)]
pub struct RecordedTemplate {
    pub(crate) stream: Vec<u32>,
    pub(crate) pool: String,
    pub(crate) names: Names,
    pub(crate) root: u32,
    pub(crate) counters: Counters,
}

impl RecordedTemplate {
    pub fn stream(&self) -> &[u32] {
        &self.stream
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

pub struct Recorder {
    config: RecorderConfig,
    stream: Vec<u32>,
    pool: String,
    names: Names,
    deferred: Vec<u32>,
    levels: Vec<Level>,
    counters: Counters,
    ids: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_config(RecorderConfig::default())
    }

    pub fn with_config(config: RecorderConfig) -> Self {
        let mut recorder = Self {
            stream: Vec::with_capacity(config.stream_capacity),
            pool: String::with_capacity(config.pool_capacity),
            names: Names::new(),
            deferred: Vec::with_capacity(config.scratch_capacity),
            levels: Vec::with_capacity(config.scratch_capacity),
            counters: Counters::default(),
            ids: 0,
            config,
        };
        recorder.push_root();
        recorder
    }

    /// Drop everything recorded so far. Scratch capacity is kept.
    pub fn reset(&mut self) {
        self.stream.clear();
        self.pool.clear();
        self.names.clear();
        self.deferred.clear();
        self.levels.clear();
        self.counters = Counters::default();
        self.ids = 0;
        self.push_root();
    }

    fn push_root(&mut self) {
        self.levels.push(Level {
            kind: LevelKind::Root,
            start: 0,
            deferred_start: 0,
            pool_start: 0,
            name: None,
        });
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    /// Open element depth, not counting fragments.
    pub fn depth(&self) -> usize {
        self.levels
            .iter()
            .filter(|l| l.kind == LevelKind::Element)
            .count()
    }

    pub fn intern_element(&mut self, name: &str) -> Result<ElementName, NameError> {
        self.names.intern_element(name)
    }

    pub fn intern_attribute(&mut self, name: &str) -> Result<AttributeName, NameError> {
        self.names.intern_attribute(name)
    }

    /// Next generated id for this recording: `html-1`, `html-2`, ...
    pub fn next_id(&mut self) -> String {
        self.ids += 1;
        format!("html-{}", self.ids)
    }

    fn here(&self) -> u32 {
        index(self.stream.len())
    }

    fn literal(&mut self, value: &str) -> (u32, u32) {
        let offset = index(self.pool.len());
        self.pool.push_str(value);
        // The end offset must stay addressable too.
        index(self.pool.len());
        (offset, index(value.len()))
    }

    fn register(&mut self, record: u32) -> u32 {
        self.deferred.push(record);
        record
    }

    pub fn text(&mut self, value: &str) -> u32 {
        let start = self.here();
        let (off, len) = self.literal(value);
        self.stream.extend_from_slice(&[recorded::TEXT, off, len]);
        self.counters.texts += 1;
        self.register(start)
    }

    pub fn raw(&mut self, value: &str) -> u32 {
        let start = self.here();
        let (off, len) = self.literal(value);
        self.stream.extend_from_slice(&[recorded::RAW, off, len]);
        self.counters.texts += 1;
        self.register(start)
    }

    pub fn doctype(&mut self) -> u32 {
        let start = self.here();
        self.stream.push(recorded::DOCTYPE);
        self.register(start)
    }

    pub fn attribute(&mut self, name: AttributeName, value: &str) -> u32 {
        self.names.attribute(name);
        let start = self.here();
        let (off, len) = self.literal(value);
        self.stream
            .extend_from_slice(&[recorded::ATTR_VALUE, name.0, off, len]);
        self.counters.attributes += 1;
        self.register(start)
    }

    /// An attribute rendered by name only, such as `hidden`.
    pub fn boolean_attribute(&mut self, name: AttributeName) -> u32 {
        self.names.attribute(name);
        let start = self.here();
        self.stream.extend_from_slice(&[recorded::ATTR_BOOLEAN, name.0]);
        self.counters.attributes += 1;
        self.register(start)
    }

    pub fn attribute_object(&mut self, object: &AttributeObject) -> u32 {
        self.attribute(object.name(), object.value())
    }

    /// Open an element whose children will be recorded by subsequent calls.
    pub fn open_element(&mut self, name: ElementName) {
        let deferred_start = self.deferred.len();
        self.open_level(LevelKind::Element, Some(name), deferred_start);
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "template.recorder", "open <{}>", self.names.element(name));
    }

    /// Open an element that adopts `args`, which must be the most recently
    /// recorded entries of the current level, in order.
    ///
    /// # Panics
    ///
    /// Panics if the arguments were not recorded at this level, were recorded
    /// in a different order, or were already claimed by another element.
    pub fn open_element_claiming(&mut self, name: ElementName, args: &[Instruction]) {
        self.open_element_with(name, &[], args);
    }

    /// [`Recorder::open_element_claiming`] with `objects` recorded now, as the
    /// element's leading attributes.
    ///
    /// # Panics
    ///
    /// Panics as [`Recorder::open_element_claiming`] does.
    pub fn open_element_with(
        &mut self,
        name: ElementName,
        objects: &[AttributeObject],
        args: &[Instruction],
    ) {
        let deferred_start = self.claim(args);
        self.open_level(LevelKind::Element, Some(name), deferred_start);
        for object in objects {
            self.attribute_object(object);
        }
        self.deferred[deferred_start..].rotate_right(objects.len());
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "template.recorder",
            "open <{}> claiming {} entries",
            self.names.element(name),
            self.deferred.len() - deferred_start
        );
    }

    /// Open an element that adopts the last `count` entries recorded at this
    /// level, without checking them against instruction tokens.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `count` entries were recorded at this level.
    pub fn adopt(&mut self, name: ElementName, count: usize) {
        let available = self.deferred.len() - self.current().deferred_start;
        if count > available {
            panic!(
                "malformed nesting: {count} entries adopted but only {available} recorded at this level"
            );
        }
        let deferred_start = self.deferred.len() - count;
        self.open_level(LevelKind::Element, Some(name), deferred_start);
    }

    fn open_level(&mut self, kind: LevelKind, name: Option<ElementName>, deferred_start: usize) {
        let start = self.here();
        if let Some(name) = name {
            // Rejects codes interned by another document.
            self.names.element(name);
            self.stream.extend_from_slice(&[recorded::ELEMENT, 0, name.0]);
        }
        self.levels.push(Level {
            kind,
            start,
            deferred_start,
            pool_start: self.pool.len(),
            name,
        });
        self.counters.max_depth = self.counters.max_depth.max(self.levels.len() - 1);
    }

    fn claim(&self, args: &[Instruction]) -> usize {
        let level = self.current();
        let expected = args.iter().filter(|i| i.kind() != InstructionKind::NoOp).count();
        let available = self.deferred.len() - level.deferred_start;
        if expected > available {
            panic!(
                "malformed nesting: {expected} arguments claimed but only {available} recorded at this level"
            );
        }
        let start = self.deferred.len() - expected;
        let records = args.iter().filter_map(|i| i.record());
        for (pos, (arg, recorded)) in records.zip(&self.deferred[start..]).enumerate() {
            if arg != *recorded {
                panic!(
                    "malformed nesting: argument {pos} is not the entry recorded in its position \
                     (reused, reordered or recorded by another template)"
                );
            }
        }
        start
    }

    fn current(&self) -> &Level {
        match self.levels.last() {
            Some(level) => level,
            None => unreachable!("root level is always present"),
        }
    }

    /// Close the innermost open element. Returns the element's record offset.
    ///
    /// # Panics
    ///
    /// Panics if the innermost level is not an element, or if a void element
    /// received children.
    pub fn close_element(&mut self) -> u32 {
        let level = *self.current();
        if level.kind != LevelKind::Element {
            panic!("malformed nesting: close_element without a matching open element");
        }
        let Some(name) = level.name else {
            unreachable!("element levels carry a name");
        };
        self.levels.pop();
        if self.names.element_kind(name).is_void
            && self.any_expanded(level.deferred_start, |r| !self.is_attribute(r))
        {
            panic!(
                "void element <{}> cannot have children",
                self.names.element(name)
            );
        }
        let n = self.splice(level.deferred_start);
        self.stream.extend_from_slice(&[n, recorded::ELEMENT_END]);
        let len = index(self.stream.len() - level.start as usize);
        self.stream[level.start as usize + 1] = len;
        self.counters.elements += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "template.recorder",
            "close <{}> @{} refs={n} len={len}",
            self.names.element(name),
            level.start
        );
        self.register(level.start)
    }

    fn is_attribute(&self, record: u32) -> bool {
        matches!(
            self.stream[record as usize],
            recorded::ATTR_VALUE | recorded::ATTR_BOOLEAN
        )
    }

    /// Test the deferred entries from `from` onward, looking through fragments.
    fn any_expanded(&self, from: usize, pred: impl Fn(u32) -> bool) -> bool {
        self.deferred[from..].iter().any(|&r| {
            let at = r as usize;
            if self.stream[at] == recorded::FRAGMENT {
                let n = self.stream[at + 1] as usize;
                self.stream[at + 2..at + 2 + n].iter().any(|&c| pred(c))
            } else {
                pred(r)
            }
        })
    }

    /// Emit the deferred entries from `from` onward as refs, expanding
    /// fragments in place, and drop them from the deferred table.
    fn splice(&mut self, from: usize) -> u32 {
        let mut count = 0usize;
        for i in from..self.deferred.len() {
            let r = self.deferred[i] as usize;
            if self.stream[r] == recorded::FRAGMENT {
                let n = self.stream[r + 1] as usize;
                for j in 0..n {
                    let child = self.stream[r + 2 + j];
                    self.stream.push(child);
                }
                count += n;
            } else {
                self.stream.push(r as u32);
                count += 1;
            }
        }
        self.deferred.truncate(from);
        self.counters.splices += count as u64;
        index(count)
    }

    /// Start collecting entries into a fragment.
    pub fn fragment_begin(&mut self) {
        let deferred_start = self.deferred.len();
        self.open_level(LevelKind::Fragment, None, deferred_start);
    }

    /// Group `args` into a fragment without an owning element.
    pub fn fragment_claiming(&mut self, args: &[Instruction]) -> u32 {
        let deferred_start = self.claim(args);
        self.open_level(LevelKind::Fragment, None, deferred_start);
        self.fragment_end()
    }

    /// Close the innermost fragment. Returns the fragment's record offset.
    ///
    /// # Panics
    ///
    /// Panics if the innermost level is not a fragment.
    pub fn fragment_end(&mut self) -> u32 {
        let level = *self.current();
        if level.kind != LevelKind::Fragment {
            panic!("malformed nesting: fragment_end without a matching fragment_begin");
        }
        self.levels.pop();
        let start = self.here();
        self.stream.extend_from_slice(&[recorded::FRAGMENT, 0]);
        let n = self.splice(level.deferred_start);
        self.stream[start as usize + 1] = n;
        self.counters.fragments += 1;
        self.register(start)
    }

    /// Discard the innermost fragment and everything recorded inside it.
    ///
    /// # Panics
    ///
    /// Panics if the innermost level is not a fragment.
    pub fn fragment_abort(&mut self) {
        let level = *self.current();
        if level.kind != LevelKind::Fragment {
            panic!("malformed nesting: fragment_abort without a matching fragment_begin");
        }
        self.levels.pop();
        self.deferred.truncate(level.deferred_start);
        self.stream.truncate(level.start as usize);
        self.pool.truncate(level.pool_start);
    }

    /// Close the document and hand its buffers over. The recorder is left
    /// reset and ready for another recording.
    ///
    /// # Panics
    ///
    /// Panics if an element or fragment is still open, or if an attribute was
    /// recorded outside of any element.
    pub fn finish(&mut self) -> RecordedTemplate {
        if self.levels.len() != 1 {
            let open = self.levels.len() - 1;
            match self.current().name {
                Some(name) => panic!(
                    "malformed nesting: finish with {open} open level(s), innermost <{}>",
                    self.names.element(name)
                ),
                None => panic!("malformed nesting: finish with {open} open level(s), innermost fragment"),
            }
        }
        let stray = self.any_expanded(0, |r| self.is_attribute(r));
        if stray {
            panic!("malformed nesting: attribute recorded outside of any element");
        }
        let root = self.here();
        self.stream.extend_from_slice(&[recorded::ROOT, 0]);
        let n = self.splice(0);
        self.stream[root as usize + 1] = n;
        log::debug!(
            target: "template.recorder",
            "recorded {} words, {} pool bytes, {} elements",
            self.stream.len(),
            self.pool.len(),
            self.counters.elements
        );

        let template = RecordedTemplate {
            stream: std::mem::replace(
                &mut self.stream,
                Vec::with_capacity(self.config.stream_capacity),
            ),
            pool: std::mem::replace(
                &mut self.pool,
                String::with_capacity(self.config.pool_capacity),
            ),
            names: std::mem::take(&mut self.names),
            root,
            counters: std::mem::take(&mut self.counters),
        };
        self.reset();
        template
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
