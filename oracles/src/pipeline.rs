//! Layered oracle pipeline: execution, type check, equivalence.
//!
//! ```text
//! candidate ─→ execute ─(runtime error)──────────────→ Fail(Runtime)
//!                 │
//!                 └─→ type_check ─(diagnostics)──────→ Fail(Compiler)
//!                          │
//!                          └─→ equivalence ─(differ)─→ Fail(Mismatch)
//!                                   │
//!                                   └────────────────→ Pass
//! ```
//!
//! One implementation per transform-engine family. Each instance owns
//! the scratch files of exactly one session and must not be shared
//! between concurrent sessions.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::equivalence::equivalent;
use crate::example::Example;
use crate::feedback::compiler::TypeChecker;
use crate::feedback::executor::{Execution, TransformRunner};
use crate::report::{CompilerError, ErrorReport, Evaluation};
use crate::toolchain::{ToolError, ToolchainConfig};
use crate::workspace::ScratchWorkspace;

/// Capability interface for checking candidates of one engine family.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Engine family name, e.g. `"jscodeshift"`.
    fn engine(&self) -> &'static str;

    /// Check-only compile of the candidate. Empty means clean.
    async fn type_check(&self, candidate_source: &str) -> Result<Vec<CompilerError>, ToolError>;

    /// Apply the candidate to `input`.
    async fn execute(&self, candidate_source: &str, input: &str) -> Result<Execution, ToolError>;

    fn check_equivalence(&self, produced: &str, expected: &str) -> bool {
        equivalent(produced, expected)
    }

    /// Run every oracle and report the highest-priority failure.
    ///
    /// Runtime failures win over compiler diagnostics, which win over an
    /// output mismatch. `Err` only when a toolchain could not be invoked.
    async fn run_all(
        &self,
        candidate_source: &str,
        example: &Example,
    ) -> Result<Evaluation, ToolError> {
        let execution = self.execute(candidate_source, example.before()).await?;
        if let Some(error) = execution.error {
            debug!(engine = self.engine(), "runtime failure");
            return Ok(Evaluation::fail(ErrorReport::Runtime(error), execution.produced));
        }

        let errors = self.type_check(candidate_source).await?;
        if !errors.is_empty() {
            debug!(engine = self.engine(), count = errors.len(), "compiler diagnostics");
            return Ok(Evaluation::fail(
                ErrorReport::Compiler { errors },
                execution.produced,
            ));
        }

        let produced = execution.produced.unwrap_or_default();
        if !self.check_equivalence(&produced, example.after()) {
            debug!(engine = self.engine(), "output mismatch");
            return Ok(Evaluation::fail(ErrorReport::Mismatch, Some(produced)));
        }

        Ok(Evaluation::pass(produced))
    }
}

/// Oracle for jscodeshift transforms written in TypeScript.
pub struct JscodeshiftOracle {
    workspace: ScratchWorkspace,
    checker: TypeChecker,
    runner: TransformRunner,
}

impl JscodeshiftOracle {
    pub const ENGINE: &'static str = "jscodeshift";

    /// Create an oracle with its own scratch workspace for `session_id`.
    pub fn new(config: &ToolchainConfig, session_id: &str) -> Result<Self, ToolError> {
        let workspace = ScratchWorkspace::create(session_id, config.scratch_dir.as_deref())?;
        Ok(Self {
            workspace,
            checker: TypeChecker::new(config.tsc_bin.clone(), config.tool_timeout()),
            runner: TransformRunner::new(
                config.jscodeshift_bin.clone(),
                config.parser.clone(),
                config.tool_timeout(),
            ),
        })
    }

    pub fn workspace_root(&self) -> &Path {
        self.workspace.root()
    }
}

#[async_trait]
impl Oracle for JscodeshiftOracle {
    fn engine(&self) -> &'static str {
        Self::ENGINE
    }

    async fn type_check(&self, candidate_source: &str) -> Result<Vec<CompilerError>, ToolError> {
        self.workspace.write_candidate(candidate_source)?;
        let result = self.checker.check(self.workspace.candidate_path()).await?;
        Ok(result.errors)
    }

    async fn execute(&self, candidate_source: &str, input: &str) -> Result<Execution, ToolError> {
        let execution = self.runner.execute(&self.workspace, candidate_source, input).await;
        self.workspace.clear_subject()?;
        execution
    }
}
