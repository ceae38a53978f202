//! Toolchain feedback for candidate transforms.
//!
//! - Run the transform over the example input and capture failures
//! - Run the type checker in check-only mode and parse diagnostics
//!
//! ```text
//! Candidate → TransformRunner → RuntimeErrorParser ─┐
//!          └→ TypeChecker     → TscErrorParser     ─┴→ ErrorReport
//! ```

pub mod compiler;
pub mod error_parser;
pub mod executor;

pub use compiler::{CheckResult, TypeChecker};
pub use error_parser::{RuntimeErrorParser, TscErrorParser};
pub use executor::{Execution, TransformRunner};
