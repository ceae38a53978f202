//! Reference types quoted back to the model on missing-property diagnostics.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use codemod_oracles::CompilerError;

static MISSING_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Property '(.*)' does not exist on type '(.*)'\.")
        .expect("MISSING_PROPERTY regex should compile")
});

static JSCODESHIFT: LazyLock<TypeCatalogue> = LazyLock::new(|| {
    TypeCatalogue::from_text(
        include_str!("../assets/types.txt"),
        include_str!("../assets/type_aliases.txt"),
    )
});

const TYPES_HEADER: &str = "If any of the errors are caused by missing properties, \
use the following list of available types along with their properties:\n";
const ALIASES_HEADER: &str = "\n\nThe following lines are type aliases:\n";

/// Line-oriented catalogue of node types and type aliases.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalogue {
    types: Vec<String>,
    aliases: Vec<String>,
}

impl TypeCatalogue {
    pub fn from_text(types: &str, aliases: &str) -> Self {
        let lines = |text: &str| {
            text.lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            types: lines(types),
            aliases: lines(aliases),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Bundled catalogue for jscodeshift / ast-types.
    pub fn jscodeshift() -> &'static Self {
        &JSCODESHIFT
    }

    /// Reference block for the missing-property diagnostics in `errors`.
    ///
    /// Type lines are selected when they contain any ` | `-separated token
    /// of the property or the type; alias lines when they contain the
    /// property or any token of the type. Empty when nothing matched.
    pub fn relevant_information(&self, errors: &[CompilerError]) -> String {
        let mut type_hits = BTreeSet::new();
        let mut alias_hits = BTreeSet::new();

        for error in errors {
            let Some(caps) = MISSING_PROPERTY.captures(&error.message) else {
                continue;
            };
            let property = &caps[1];
            let ty = &caps[2];

            let type_tokens: Vec<&str> = property.split(" | ").chain(ty.split(" | ")).collect();
            collect_matches(&self.types, &type_tokens, &mut type_hits);

            let alias_tokens: Vec<&str> =
                std::iter::once(property).chain(ty.split(" | ")).collect();
            collect_matches(&self.aliases, &alias_tokens, &mut alias_hits);
        }

        let mut info = String::new();
        if !type_hits.is_empty() {
            info.push_str(TYPES_HEADER);
            for idx in type_hits {
                info.push_str(&self.types[idx]);
                info.push('\n');
            }
        }
        if !alias_hits.is_empty() {
            info.push_str(ALIASES_HEADER);
            for idx in alias_hits {
                info.push_str(&self.aliases[idx]);
                info.push('\n');
            }
        }
        info
    }
}

/// Record indices of `lines` containing any non-empty token.
fn collect_matches(lines: &[String], tokens: &[&str], hits: &mut BTreeSet<usize>) {
    for (idx, line) in lines.iter().enumerate() {
        if tokens.iter().any(|t| !t.is_empty() && line.contains(t)) {
            hits.insert(idx);
        }
    }
}
