//! Diagnostic creation, severity management, and terminal rendering.
//!
//! The grammar collaborator reports every syntax or semantic problem it finds
//! as a [`Diagnostic`] with a 1-based [`Location`]. Diagnostics are gathered in
//! a per-scan [`DiagnosticSink`] and printed with a [`TerminalRenderer`].

#![warn(missing_docs)]

pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
