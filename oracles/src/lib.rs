//! Codemod Oracles Library
//!
//! Deterministic, model-free checks for synthesized source transforms:
//! - Equivalence normalizer tolerant to quoting and formatting
//! - Type-check wrapper (`tsc --noEmit`) with diagnostic parsing
//! - Transform runner (`jscodeshift`) with runtime failure extraction
//! - Layered [`Oracle`] pipeline applying the runtime > compiler > mismatch
//!   priority policy
//!
//! External tools are black boxes reached through a narrow
//! request/response contract; nothing here understands their ASTs.

pub mod equivalence;
pub mod example;
pub mod feedback;
pub mod pipeline;
pub mod report;
pub mod toolchain;
pub mod workspace;

pub use equivalence::{equivalent, normalize, NormalizedText};
pub use example::Example;
pub use feedback::{Execution, RuntimeErrorParser, TransformRunner, TscErrorParser, TypeChecker};
pub use pipeline::{JscodeshiftOracle, Oracle};
pub use report::{CompilerError, ErrorKind, ErrorReport, Evaluation, RuntimeError, Verdict};
pub use toolchain::{ToolError, ToolOutput, ToolchainConfig};
pub use workspace::ScratchWorkspace;
