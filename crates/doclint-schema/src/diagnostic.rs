//! Lint results.

use std::fmt;

use doclint_markup::Position;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message anchored to a place in a source file.
///
/// Built with [`Diagnostic::error`] or [`Diagnostic::warning`] and the
/// chained setters:
///
/// ```
/// use doclint_markup::Position;
/// use doclint_schema::Diagnostic;
///
/// let diag = Diagnostic::error("Option pageSiz not found")
///     .at(Position::new(3, 5, 40))
///     .with_length(7)
///     .in_file("index.html");
/// assert_eq!(diag.to_string(), "index.html:3:5: error: Option pageSiz not found");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub position: Option<Position>,
    /// Length of the offending text in bytes.
    pub length: Option<usize>,
    pub filename: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            position: None,
            length: None,
            filename: None,
        }
    }

    /// An error with no position yet.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// A warning with no position yet.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Anchor the diagnostic at `position`.
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the file name unless one is already set.
    pub fn in_file(mut self, filename: impl Into<String>) -> Self {
        if self.filename.is_none() {
            self.filename = Some(filename.into());
        }
        self
    }

    /// Move a diagnostic found inside an embedded region into the
    /// coordinates of the enclosing text. See [`Position::translate`].
    pub fn translate(mut self, origin: Position) -> Self {
        self.position = self.position.map(|p| p.translate(origin));
        self
    }

    /// 1-based line, when positioned.
    pub fn line(&self) -> Option<usize> {
        self.position.map(|p| p.line)
    }

    pub fn column(&self) -> Option<usize> {
        self.position.map(|p| p.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(filename) = &self.filename {
            write!(f, "{filename}:")?;
        }
        if let Some(position) = self.position {
            write!(f, "{position}: ")?;
        } else if self.filename.is_some() {
            f.write_str(" ")?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Flat form consumed by editors and the JS bindings:
/// `{ message, severity, filename, line, column, offset, length }`.
impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 7)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("filename", &self.filename)?;
        state.serialize_field("line", &self.line())?;
        state.serialize_field("column", &self.column())?;
        state.serialize_field("offset", &self.position.map(|p| p.offset))?;
        state.serialize_field("length", &self.length)?;
        state.end()
    }
}
