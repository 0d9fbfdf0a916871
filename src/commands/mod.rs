//! Command implementations behind the `map2struct` binary.

pub mod generate;

pub use generate::{Diagnostic, DiagnosticKind, Generated, GenerationReport, Generator};
