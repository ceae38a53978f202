//! jscodeshift wrapper: applies a candidate transform to a subject file.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::feedback::error_parser::RuntimeErrorParser;
use crate::report::RuntimeError;
use crate::toolchain::{run_tool, ToolError};
use crate::workspace::ScratchWorkspace;

/// Result of applying a candidate to the example input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Subject contents after the run; `None` if the file vanished.
    pub produced: Option<String>,
    pub error: Option<RuntimeError>,
}

/// Runs candidate transforms with jscodeshift in in-place mode.
pub struct TransformRunner {
    jscodeshift_bin: String,
    parser: String,
    timeout: Duration,
}

impl TransformRunner {
    pub fn new(
        jscodeshift_bin: impl Into<String>,
        parser: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            jscodeshift_bin: jscodeshift_bin.into(),
            parser: parser.into(),
            timeout,
        }
    }

    pub fn args(&self, candidate: &Path, subject: &Path) -> Vec<String> {
        vec![
            "--fail-on-error".to_string(),
            "--parser".to_string(),
            self.parser.clone(),
            "-t".to_string(),
            candidate.display().to_string(),
            subject.display().to_string(),
        ]
    }

    /// Apply `candidate_source` to `input` inside `workspace`.
    ///
    /// Always yields either produced output or a [`RuntimeError`]; a run that
    /// leaves no subject file behind is reported as a runtime error.
    pub async fn execute(
        &self,
        workspace: &ScratchWorkspace,
        candidate_source: &str,
        input: &str,
    ) -> Result<Execution, ToolError> {
        workspace.write_candidate(candidate_source)?;
        workspace.write_subject(input)?;

        let args = self.args(workspace.candidate_path(), workspace.subject_path());
        let output = run_tool(&self.jscodeshift_bin, args, workspace.root(), self.timeout).await?;
        let produced = workspace.read_subject();

        let error = if RuntimeErrorParser::has_failure(&output.stdout) {
            RuntimeErrorParser::parse(&output.stdout, workspace.candidate_path(), candidate_source)
        } else if !output.success() {
            let combined = output.combined();
            let first = combined
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("transform runner exited with a failure status");
            Some(RuntimeError::new(first))
        } else {
            None
        };

        let error = match (error, &produced) {
            (None, None) => Some(RuntimeError::new(
                "The codemod run did not produce an output file.",
            )),
            (error, _) => error,
        };

        debug!(failed = error.is_some(), "transform run complete");
        Ok(Execution { produced, error })
    }
}
