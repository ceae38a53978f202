//! Parsers for type-checker diagnostics and transform-runner failures.
//!
//! Both tools print human-readable text; these parsers pull out exactly the
//! pieces the correction prompts need.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::report::{CompilerError, RuntimeError};

/// `<path>(<line>,<col>): error TS<code>: <message>`
static TSC_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+?)\((?P<line>\d+),(?P<col>\d+)\): error TS(?P<code>\d+): (?P<message>.*)$")
        .expect("TSC_DIAGNOSTIC regex should compile")
});

/// `at <frame> (<path>:<row>:<col>)`
static STACK_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at .* \((?P<path>.*):(?P<row>\d+):(?P<col>\d+)\)")
        .expect("STACK_FRAME regex should compile")
});

/// Marker jscodeshift prints in front of a failed file.
pub const RUNNER_ERROR_MARKER: &str = " ERR ";

/// Line jscodeshift prints after its summary.
const RUNNER_DONE_MARKER: &str = "All done.";

/// Fields preceding the message on the marker line (blank, `ERR`, file).
const RUNNER_PREFIX_FIELDS: usize = 3;

/// Parses `tsc --pretty false` output.
pub struct TscErrorParser;

impl TscErrorParser {
    /// One [`CompilerError`] per matching line, in output order.
    ///
    /// Lines are reported 0-based.
    pub fn parse(output: &str) -> Vec<CompilerError> {
        output
            .lines()
            .filter_map(|line| {
                let caps = TSC_DIAGNOSTIC.captures(line.trim_end())?;
                let line_no: usize = caps["line"].parse().ok()?;
                Some(CompilerError {
                    line: line_no.saturating_sub(1),
                    message: caps["message"].to_string(),
                })
            })
            .collect()
    }
}

/// Parses jscodeshift output for transformation failures.
pub struct RuntimeErrorParser;

impl RuntimeErrorParser {
    /// Whether the output carries the runner's failure marker.
    pub fn has_failure(output: &str) -> bool {
        output.contains(RUNNER_ERROR_MARKER)
    }

    /// Extract the first error and, when a stack frame points into
    /// `candidate_path`, the trimmed candidate line it names.
    pub fn parse(
        output: &str,
        candidate_path: &Path,
        candidate_source: &str,
    ) -> Option<RuntimeError> {
        let start = output.find(RUNNER_ERROR_MARKER)?;
        let region = &output[start..];
        let region = match region.find(RUNNER_DONE_MARKER) {
            Some(end) => &region[..end],
            None => region,
        };

        let first_line = region.lines().next().unwrap_or_default();
        let mut message = first_line
            .split(' ')
            .skip(RUNNER_PREFIX_FIELDS)
            .collect::<Vec<_>>()
            .join(" ");
        if message.trim().is_empty() {
            message = first_line.trim().to_string();
        }

        let mut error = RuntimeError::new(message.trim());
        if let Some(line) = Self::locate(region, candidate_path, candidate_source) {
            error = error.with_source_location(line);
        }
        Some(error)
    }

    /// First stack frame whose path is the candidate file.
    fn locate(region: &str, candidate_path: &Path, candidate_source: &str) -> Option<String> {
        let lines: Vec<&str> = candidate_source.lines().collect();
        STACK_FRAME.captures_iter(region).find_map(|caps| {
            if Path::new(&caps["path"]) != candidate_path {
                return None;
            }
            let row: usize = caps["row"].parse().ok()?;
            let line = lines.get(row.checked_sub(1)?)?;
            Some(line.trim().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSC_OUTPUT: &str = "\
/tmp/codemod-session-x/codemod-1.ts(12,9): error TS2339: Property 'name' does not exist on type 'Expression'.
/tmp/codemod-session-x/codemod-1.ts(30,1): error TS1005: ';' expected.
Found 2 errors.";

    #[test]
    fn test_parse_tsc_diagnostics() {
        let errors = TscErrorParser::parse(TSC_OUTPUT);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 11);
        assert_eq!(
            errors[0].message,
            "Property 'name' does not exist on type 'Expression'."
        );
        assert_eq!(errors[1].line, 29);
        assert_eq!(errors[1].message, "';' expected.");
    }

    #[test]
    fn test_parse_tsc_clean_output() {
        assert!(TscErrorParser::parse("").is_empty());
        assert!(TscErrorParser::parse("warning: something unrelated").is_empty());
    }

    #[test]
    fn test_parse_runtime_error_with_location() {
        let candidate = Path::new("/work/codemod-7.ts");
        let source = "import type { API } from 'jscodeshift';\nconst x = 1;\n  root.find(j.Foo).forEach(p => p.node.bar.baz);\n";
        let output = "\
Processing 1 files...
 ERR /work/actual.codemod-7.tsx Transformation error (Cannot read properties of undefined (reading 'baz'))
TypeError: Cannot read properties of undefined (reading 'baz')
    at NodePath.<anonymous> (/work/codemod-7.ts:3:45)
    at __paths.forEach (/node_modules/jscodeshift/src/Collection.js:75:36)
All done.
Results:
1 errors";

        assert!(RuntimeErrorParser::has_failure(output));
        let error = RuntimeErrorParser::parse(output, candidate, source).unwrap();
        assert_eq!(
            error.message,
            "Transformation error (Cannot read properties of undefined (reading 'baz'))"
        );
        assert_eq!(
            error.source_location.as_deref(),
            Some("root.find(j.Foo).forEach(p => p.node.bar.baz);")
        );
    }

    #[test]
    fn test_parse_runtime_error_outside_candidate() {
        let output = " ERR /work/a.tsx Transformation error (boom)\n    at x (/elsewhere/lib.js:1:1)\nAll done.";
        let error =
            RuntimeErrorParser::parse(output, Path::new("/work/codemod.ts"), "line one").unwrap();
        assert_eq!(error.message, "Transformation error (boom)");
        assert!(error.source_location.is_none());
    }

    #[test]
    fn test_no_marker_means_no_runtime_error() {
        let output = "Processing 1 files...\nAll done.\n0 errors";
        assert!(!RuntimeErrorParser::has_failure(output));
        assert!(RuntimeErrorParser::parse(output, Path::new("/c.ts"), "").is_none());
    }

    #[test]
    fn test_out_of_range_frame_is_ignored() {
        let output = " ERR /w/a.tsx Transformation error (x)\n at f (/w/c.ts:99:1)\n";
        let error = RuntimeErrorParser::parse(output, Path::new("/w/c.ts"), "one\ntwo").unwrap();
        assert!(error.source_location.is_none());
    }
}
