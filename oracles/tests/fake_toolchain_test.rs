//! Oracle pipeline against stand-in toolchain scripts.
//!
//! The scripts mimic the output formats of `tsc --pretty false` and
//! `jscodeshift` so the full spawn → parse → classify path runs without node.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use codemod_oracles::{
    ErrorReport, Example, JscodeshiftOracle, Oracle, ToolchainConfig, Verdict,
};

/// Writes "const b = 2;" into the subject unless the candidate says CRASH,
/// in which case it prints a jscodeshift-style failure pointing at line 2.
const FAKE_RUNNER: &str = r#"#!/bin/sh
for last; do :; done
transform=""
prev=""
for arg; do
  if [ "$prev" = "-t" ]; then transform="$arg"; fi
  prev="$arg"
done
if grep -q CRASH "$transform"; then
  echo "Processing 1 files..."
  echo " ERR $last Transformation error (boom)"
  echo "Error: boom"
  echo "    at transform ($transform:2:7)"
  echo "All done."
  exit 1
fi
if grep -q IDENTITY "$transform"; then
  echo "All done."
  exit 0
fi
printf 'const b = 2;' > "$last"
echo "All done."
"#;

/// Reports one diagnostic on line 3 when the candidate says BROKEN.
const FAKE_TSC: &str = r#"#!/bin/sh
for last; do :; done
if grep -q BROKEN "$last"; then
  echo "$last(3,5): error TS2304: Cannot find name 'BROKEN'."
  exit 2
fi
exit 0
"#;

fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn oracle(bin_dir: &Path, session: &str) -> JscodeshiftOracle {
    let config = ToolchainConfig {
        tsc_bin: install(bin_dir, "tsc", FAKE_TSC).display().to_string(),
        jscodeshift_bin: install(bin_dir, "jscodeshift", FAKE_RUNNER).display().to_string(),
        ..ToolchainConfig::default()
    };
    JscodeshiftOracle::new(&config, session).unwrap()
}

#[tokio::test]
async fn identity_transform_passes_identity_example() {
    let bins = tempfile::tempdir().unwrap();
    let oracle = oracle(bins.path(), "identity");
    let eval = oracle
        .run_all("// IDENTITY\nexport default (f) => f.source;", &Example::new("a", "a"))
        .await
        .unwrap();
    assert_eq!(eval.verdict, Verdict::Pass);
    assert_eq!(eval.produced.as_deref(), Some("a"));
}

#[tokio::test]
async fn rewritten_output_is_compared_loosely() {
    let bins = tempfile::tempdir().unwrap();
    let oracle = oracle(bins.path(), "loose");
    let eval = oracle
        .run_all("export default () => 'x';", &Example::new("const a = 1;", "const b = 2"))
        .await
        .unwrap();
    assert!(eval.is_pass());
}

#[tokio::test]
async fn wrong_output_is_mismatch() {
    let bins = tempfile::tempdir().unwrap();
    let oracle = oracle(bins.path(), "mismatch");
    let eval = oracle
        .run_all("export default () => 'x';", &Example::new("a", "a"))
        .await
        .unwrap();
    assert_eq!(eval.verdict, Verdict::Fail(ErrorReport::Mismatch));
    assert_eq!(eval.produced.as_deref(), Some("const b = 2;"));
}

#[tokio::test]
async fn compiler_diagnostics_are_parsed() {
    let bins = tempfile::tempdir().unwrap();
    let oracle = oracle(bins.path(), "tsc");
    let eval = oracle
        .run_all("line one\nline two\nBROKEN;\n", &Example::new("a", "a"))
        .await
        .unwrap();
    match eval.verdict {
        Verdict::Fail(ErrorReport::Compiler { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].line, 2);
            assert_eq!(errors[0].message, "Cannot find name 'BROKEN'.");
        }
        other => panic!("expected compiler failure, got {other:?}"),
    }
}

#[tokio::test]
async fn runtime_failure_wins_over_compiler_failure() {
    let bins = tempfile::tempdir().unwrap();
    let oracle = oracle(bins.path(), "both");
    let candidate = "// CRASH\nconst node = root.nope;\nBROKEN;\n";
    let eval = oracle.run_all(candidate, &Example::new("a", "a")).await.unwrap();
    match eval.verdict {
        Verdict::Fail(ErrorReport::Runtime(err)) => {
            assert_eq!(err.message, "Transformation error (boom)");
            assert_eq!(err.source_location.as_deref(), Some("const node = root.nope;"));
        }
        other => panic!("expected runtime failure, got {other:?}"),
    }
}
