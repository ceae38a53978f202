//! Coarse syntactic equivalence between produced and expected output.
//!
//! Tolerates quoting style, statement terminators, commas and formatting.
//! Structural differences still compare unequal; this is not an AST diff.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Text after normalization. Only constructible through [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Double quotes become single quotes; semicolons, commas and all
/// whitespace are removed. Total, pure and idempotent.
pub fn normalize(text: &str) -> NormalizedText {
    let normalized = text
        .chars()
        .filter(|c| !matches!(c, ';' | ',') && !c.is_whitespace())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect();
    NormalizedText(normalized)
}

/// `normalize(a) == normalize(b)`.
pub fn equivalent(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &[&str] = &[
        "",
        "a",
        "   \n\t ",
        "import { a, b } from \"x\";",
        "import {a b} from 'x'",
        "const s = \"it's\";\nconsole.log(s);",
        "foo(1,\n  2,\r\n  3);;",
        "\"\"\"'''",
        "let x = 'a' ; let y = \"b\"",
        "\u{00a0}non\u{2003}breaking\u{00a0}",
    ];

    #[test]
    fn test_quote_style_is_ignored() {
        assert!(equivalent("import a from \"b\";", "import a from 'b'"));
    }

    #[test]
    fn test_formatting_is_ignored() {
        let a = "foo(\n  a,\n  b\n);";
        let b = "foo(a, b)";
        assert!(equivalent(a, b));
    }

    #[test]
    fn test_structural_difference_is_detected() {
        assert!(!equivalent("foo(a, b)", "foo(b, a)"));
        assert!(!equivalent("a", "b"));
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize("a \"b\";\n c,d").as_str(), "a'b'cd");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for text in CORPUS {
            let once = normalize(text);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn test_equivalence_is_symmetric() {
        for a in CORPUS {
            for b in CORPUS {
                assert_eq!(equivalent(a, b), equivalent(b, a), "{a:?} vs {b:?}");
            }
        }
    }
}
