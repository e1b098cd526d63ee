//! Error types with rich diagnostics using miette
//!
//! Configuration errors carry the parameter file and the offending row so
//! the driver can print a line-level diagnostic.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    /// Name of the source (filename or "<parameters>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Context for parameters that did not come from a file
    pub fn in_memory() -> Self {
        Self::new("<parameters>", "")
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors in the layout of a parameter or cross-section file
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("malformed parameter file: {message}")]
    #[diagnostic(code(gad::parse::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("empty parameter file")]
    #[diagnostic(
        code(gad::parse::empty),
        help("the first row must be a header: `Parameter,Value,Description` or `Value,Variable,Description`")
    )]
    Empty {
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("unrecognised header row")]
    #[diagnostic(
        code(gad::parse::unknown_header),
        help("expected `Parameter,Value,Description` or `Value,Variable,Description`")
    )]
    UnknownHeader {
        #[source_code]
        src: NamedSource<String>,
        #[label("this header")]
        span: SourceSpan,
    },

    #[error("invalid number for {name}: {value:?}")]
    #[diagnostic(code(gad::parse::invalid_number))]
    InvalidNumber {
        name: String,
        value: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a number")]
        span: SourceSpan,
    },

    #[error("parameter {name} is defined twice")]
    #[diagnostic(code(gad::parse::duplicate))]
    Duplicate {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("first definition")]
        first: SourceSpan,
        #[label("second definition")]
        second: SourceSpan,
    },

    #[error("cross-section point {index} has {present} but no {missing}")]
    #[diagnostic(code(gad::parse::unpaired_point))]
    UnpairedPoint {
        index: usize,
        present: &'static str,
        missing: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("defined here")]
        span: SourceSpan,
    },
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// What kind of configuration check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A mandatory parameter has no value
    Missing,
    /// A value lies outside its permitted range
    OutOfRange,
    /// Several values contradict each other
    Inconsistent,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::Missing => write!(f, "missing"),
            ConfigErrorKind::OutOfRange => write!(f, "out of range"),
            ConfigErrorKind::Inconsistent => write!(f, "inconsistent"),
        }
    }
}

/// A parameter set that cannot be drawn
#[derive(Error, Diagnostic, Debug)]
#[error("{kind} parameter {name}: {message}")]
#[diagnostic(code(gad::config))]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    /// The parameter the driver reports
    pub name: String,
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("defined here")]
    pub span: Option<SourceSpan>,
    #[help]
    pub help: Option<String>,
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors raised inside a back-end
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("empty drawing")]
    #[diagnostic(code(gad::render::empty_drawing))]
    EmptyDrawing,

    #[error("infinite or NaN in bounds")]
    #[diagnostic(code(gad::render::invalid_bounds))]
    InvalidBounds,

    #[error("cannot allocate a {width}x{height} raster")]
    #[diagnostic(code(gad::render::raster_size))]
    RasterSize { width: u32, height: u32 },

    #[error("{backend} encoder failed: {message}")]
    #[diagnostic(code(gad::render::encode))]
    Encode {
        backend: &'static str,
        message: String,
    },

    #[error("cannot read back {backend} output: {message}")]
    #[diagnostic(code(gad::render::decode))]
    Decode {
        backend: &'static str,
        message: String,
    },
}

// ============================================================================
// Top-level error
// ============================================================================

/// Every fatal error the pipeline can raise
#[derive(Error, Diagnostic, Debug)]
pub enum GadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown parameter {name}")]
    #[diagnostic(
        code(gad::unknown_parameter),
        help("a builder asked for a parameter with no value and no default")
    )]
    UnknownParameter { name: String },

    #[error("cannot read {}", path.display())]
    #[diagnostic(code(gad::io::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}", path.display())]
    #[diagnostic(code(gad::io::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),
}

/// Process exit codes of the driver
pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const INVALID_ARGUMENTS: u8 = 2;
    pub const CONFIG: u8 = 3;
    pub const IO: u8 = 4;
    pub const INTERNAL: u8 = 5;

    /// Human description of an exit code, for batch summaries
    pub fn describe(code: i32) -> &'static str {
        match code {
            0 => "ok",
            2 => "invalid arguments",
            3 => "configuration error",
            4 => "i/o failure",
            5 => "internal error",
            _ => "unexpected exit",
        }
    }
}

impl GadError {
    /// The exit code the driver reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            GadError::Parse(_) | GadError::Config(_) => exit::CONFIG,
            GadError::Read { .. } | GadError::Write { .. } => exit::IO,
            GadError::UnknownParameter { .. } | GadError::Render(_) => exit::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: ConfigErrorKind) -> GadError {
        GadError::Config(ConfigError {
            kind,
            name: "FUTRL".into(),
            message: "footing top above cap bottom".into(),
            src: SourceContext::in_memory().named_source(),
            span: None,
            help: None,
        })
    }

    #[test]
    fn exit_codes() {
        assert_eq!(config(ConfigErrorKind::Inconsistent).exit_code(), 3);
        assert_eq!(
            GadError::UnknownParameter { name: "X".into() }.exit_code(),
            5
        );
        let io = GadError::Read {
            path: "a.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io.exit_code(), 4);
        assert_eq!(GadError::Render(RenderError::EmptyDrawing).exit_code(), 5);
    }

    #[test]
    fn config_message_names_parameter() {
        insta::assert_snapshot!(
            config(ConfigErrorKind::Inconsistent).to_string(),
            @"inconsistent parameter FUTRL: footing top above cap bottom"
        );
    }

    #[test]
    fn describe_codes() {
        assert_eq!(exit::describe(3), "configuration error");
        assert_eq!(exit::describe(42), "unexpected exit");
    }
}
