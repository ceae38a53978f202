//! Prompt texts for drafting and correcting transforms.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any text here changes,
//! so a logged session can be traced back to the prompts that produced it.

use codemod_oracles::{CompilerError, Example, RuntimeError};

use crate::type_catalogue::TypeCatalogue;

/// Prompt version. Bump on any content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// System instruction for the jscodeshift engine.
pub const JSCODESHIFT_SYSTEM_INSTRUCTION: &str = "\
You are an expert in code migrations, jscodeshift, and TypeScript. \
You will help the user write a codemod using jscodeshift given a pair of \
a before and an after code snippet.";

/// Worked examples appended to the jscodeshift drafting request.
pub const JSCODESHIFT_EXAMPLES: &str = r#"Here are examples of valid codemods written for example BEFORE and AFTER code snippets:

Example 1 BEFORE:
```
import { Redirect, Route } from 'react-router';
```

Example 1 AFTER:
```
import { Redirect, Route } from 'react-router-dom';
```

Example 1 codemod:
```typescript
import type { API, FileInfo, Options } from "jscodeshift";

export default function transform(
  file: FileInfo,
  api: API,
  options: Options,
): string | undefined {
  const j = api.jscodeshift;
  const root = j(file.source);
  let dirty = false;

  root
    .find(j.ImportDeclaration, { source: { value: "react-router" } })
    .forEach((path) => {
      path.value.source.value = "react-router-dom";
      dirty = true;
    });

  return dirty ? root.toSource(options) : undefined;
}
```

Example 2 BEFORE:
```
const history = createHistory();
history.listenBefore((location) => {
  console.log(location);
});
```

Example 2 AFTER:
```
const history = createHistory();
history.block(({ location }) => {
  console.log(location);
});
```

Example 2 codemod:
```typescript
import type { API, FileInfo } from "jscodeshift";

export default function transform(file: FileInfo, api: API): string | undefined {
  const j = api.jscodeshift;
  const root = j(file.source);

  root
    .find(j.CallExpression, {
      callee: {
        type: "MemberExpression",
        object: { name: "history" },
        property: { name: "listenBefore" },
      },
    })
    .forEach((path) => {
      const callee = path.value.callee;
      if (callee.type !== "MemberExpression" || callee.property.type !== "Identifier") {
        return;
      }
      callee.property.name = "block";

      const callback = path.value.arguments[0];
      if (callback?.type !== "ArrowFunctionExpression") {
        return;
      }
      const [location] = callback.params;
      if (location?.type !== "Identifier") {
        return;
      }
      callback.params = [
        j.objectPattern([
          j.objectProperty.from({
            key: j.identifier("location"),
            value: j.identifier(location.name),
            shorthand: true,
          }),
        ]),
      ];
    });

  return root.toSource();
}
```

Never import 'namedTypes' or 'builders' from 'jscodeshift'."#;

/// Drafting request for an engine. `engine` names the library the model
/// must restrict itself to; `examples` is appended verbatim.
pub fn initial_prompt(engine: &str, example: &Example, examples: &str) -> String {
    format!(
        r#"Below, you are provided with BEFORE and AFTER code snippets.

BEFORE:

```
{before}
```

AFTER:

```
{after}
```

Write a {engine} codemod that transforms the BEFORE code snippet into the AFTER code snippet.

You are only allowed to use the {engine} library and the TypeScript language.

Before accessing {engine} node properties, narrow the node's type first.

You can narrow a node's type by checking its "type" property. Example:
```
// node is an Identifier inside this block
if (node.type === "Identifier") {{
  // safely access properties of Identifier
}}
```

The response must contain exactly one code block and no extra explanations.

Write comments with best practices in mind.

{examples}
"#,
        before = example.before().trim(),
        after = example.after().trim(),
        engine = engine,
        examples = examples.trim(),
    )
}

/// Correction request for a transform that failed to run.
pub fn runtime_error_prompt(error: &RuntimeError) -> String {
    format!(
        "The codemod execution resulted in the following error:\n{error}\n\
         Please fix the codemod to avoid this error and provide the updated codemod."
    )
}

/// Correction request for type-check diagnostics.
///
/// Each diagnostic quotes the candidate line it points at. Reference
/// types from `catalogue` are included for missing-property diagnostics.
pub fn compiler_error_prompt(
    errors: &[CompilerError],
    candidate_source: &str,
    catalogue: &TypeCatalogue,
) -> String {
    let lines: Vec<&str> = candidate_source.lines().collect();
    let mut prompt =
        String::from("TypeScript compiler encountered the following error while compiling the codemod:\n");
    prompt.push_str(&catalogue.relevant_information(errors));
    for error in errors {
        match lines.get(error.line) {
            Some(line) => {
                prompt.push_str(&format!("* Error {} in line {}\n", error.message, line.trim()))
            }
            None => prompt.push_str(&format!("* Error {}\n", error.message)),
        }
    }
    prompt.push_str("\nPlease modify the codemod to fix the error and provide the updated codemod.\n");
    prompt
}

/// Correction request for a transform whose output differs from the expected one.
pub fn mismatch_prompt(example: &Example, produced: &str) -> String {
    format!(
        "The codemod is supposed to transform the provided BEFORE code which is the following:\n\
         \n\nBEFORE:\n```\n{before}\n```\n\
         \nto the following AFTER code snippet:\n\
         \n\nAFTER:\n```\n{after}\n```\n\
         However, it transforms it to the following ACTUAL code instead:\n\
         \n\nACTUAL:\n```\n{produced}\n```\n\
         Pay close attention to the differences between the AFTER and ACTUAL code snippets. \
         Then, use them to modify the codemod to correctly perform the transformation and \
         provide the updated codemod.\n",
        before = example.before(),
        after = example.after(),
        produced = produced,
    )
}
