use std::fmt;
use std::io;

/// A sink failure while rendering. The writer stops writing at the first one
/// and reports it from [`crate::HtmlWriter::finish`].
#[derive(Debug)]
pub enum RenderError {
    Fmt(fmt::Error),
    Io(io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Fmt(_) => write!(f, "formatter error while rendering"),
            RenderError::Io(err) => write!(f, "i/o error while rendering: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Fmt(err) => Some(err),
            RenderError::Io(err) => Some(err),
        }
    }
}

impl From<fmt::Error> for RenderError {
    fn from(err: fmt::Error) -> Self {
        RenderError::Fmt(err)
    }
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(err)
    }
}
