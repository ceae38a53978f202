//! TypeScript check-only wrapper.
//!
//! Runs `tsc --noEmit` over one candidate file and parses its diagnostics.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::feedback::error_parser::TscErrorParser;
use crate::report::CompilerError;
use crate::toolchain::{run_tool, ToolError, ToolOutput};

/// Type checker for candidate transforms.
pub struct TypeChecker {
    tsc_bin: String,
    timeout: Duration,
}

impl TypeChecker {
    pub fn new(tsc_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tsc_bin: tsc_bin.into(),
            timeout,
        }
    }

    /// Arguments for a no-emit pass over `candidate`.
    pub fn args(candidate: &Path) -> Vec<String> {
        vec![
            "--noEmit".to_string(),
            "--pretty".to_string(),
            "false".to_string(),
            "--esModuleInterop".to_string(),
            "true".to_string(),
            "--lib".to_string(),
            "es2020".to_string(),
            candidate.display().to_string(),
        ]
    }

    /// Check `candidate`, returning diagnostics in output order.
    ///
    /// An empty list means the candidate type-checks.
    pub async fn check(&self, candidate: &Path) -> Result<CheckResult, ToolError> {
        let working_dir = candidate
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let output =
            run_tool(&self.tsc_bin, Self::args(candidate), &working_dir, self.timeout).await?;
        let errors = TscErrorParser::parse(&output.stdout);
        debug!(errors = errors.len(), "type check complete");
        Ok(CheckResult { errors, output })
    }
}

/// Result of one type-check pass.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub errors: Vec<CompilerError>,
    pub output: ToolOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_are_check_only() {
        let args = TypeChecker::args(Path::new("/tmp/codemod.ts"));
        assert_eq!(args[0], "--noEmit");
        assert!(args.contains(&"es2020".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/codemod.ts"));
    }

    #[tokio::test]
    async fn test_missing_tsc_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("codemod.ts");
        std::fs::write(&candidate, "export {};").unwrap();
        let checker = TypeChecker::new("no-such-tsc-binary-4242", Duration::from_secs(5));
        assert!(checker.check(&candidate).await.is_err());
    }
}
