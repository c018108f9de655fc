//! Parsing of circuit files for the build.
//!
//! [`FileParser`] is the integration layer between the build and a
//! [`GrammarParser`]: it serves repeated content from memory, adopts parse
//! results from the durable [`CompileCache`](circa_cache::CompileCache) when
//! the content hash still matches, and otherwise runs the grammar. The bundled
//! grammar is [`HeaderScanner`].

#![warn(missing_docs)]

pub mod error;
pub mod file_parser;
pub mod grammar;
pub mod scanner;

mod expr;
mod lexer;

pub use error::ParseError;
pub use file_parser::{FileParser, ParseFile, ParserStats};
pub use grammar::GrammarParser;
pub use scanner::HeaderScanner;
