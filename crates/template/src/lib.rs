pub mod collect;
pub mod debug;
pub mod names;

mod compiler;
mod dsl;
mod error;
mod escape;
mod player;
mod proto;
mod pull;
mod recorder;
mod visitor;
mod writer;

pub use crate::compiler::CompiledHtml;
pub use crate::dsl::{AttributeObject, Html, Instruction, InstructionKind, Template};
pub use crate::error::RenderError;
pub use crate::escape::{escape_attribute_value, escape_text};
pub use crate::names::{AttributeName, ElementKind, ElementName, NameError, Names, attribute, element};
pub use crate::pull::{Attribute, Attributes, Element, Node, Nodes, Values};
pub use crate::recorder::{Counters, RecordedTemplate, Recorder, RecorderConfig};
pub use crate::visitor::Visitor;
pub use crate::writer::{
    FmtSink, HtmlWriter, IoSink, LineEnding, Render, Sink, VoidStyle, WriterConfig, WriterMode,
};

#[cfg(feature = "internal-api")]
pub mod internal {
    pub use super::proto::{END_TAG_WORDS, START_TAG_WORDS, bytecode, recorded};
}
