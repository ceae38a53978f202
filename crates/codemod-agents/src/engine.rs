//! Per-engine prompt and oracle wiring.
//!
//! The synthesizer targets one transform-engine family per session. A
//! profile bundles what differs between families: the drafting prompts,
//! the reference type catalogue used in compiler corrections, and the
//! oracle that checks candidates.

use codemod_oracles::{Example, JscodeshiftOracle, Oracle, ToolError, ToolchainConfig};

use crate::config::EngineKind;
use crate::prompts;
use crate::type_catalogue::TypeCatalogue;

pub trait EngineProfile: Send + Sync {
    /// Library name used in prompts and logs.
    fn name(&self) -> &'static str;

    fn system_instruction(&self) -> &str;

    /// Drafting request for `example`.
    fn initial_prompt(&self, example: &Example) -> String;

    /// Reference types quoted in compiler corrections.
    fn type_catalogue(&self) -> &TypeCatalogue;

    /// Build an oracle owning fresh scratch space for `session_id`.
    fn create_oracle(
        &self,
        toolchain: &ToolchainConfig,
        session_id: &str,
    ) -> Result<Box<dyn Oracle>, ToolError>;
}

/// Profile for jscodeshift transforms written in TypeScript.
#[derive(Debug, Clone, Copy, Default)]
pub struct JscodeshiftProfile;

impl EngineProfile for JscodeshiftProfile {
    fn name(&self) -> &'static str {
        JscodeshiftOracle::ENGINE
    }

    fn system_instruction(&self) -> &str {
        prompts::JSCODESHIFT_SYSTEM_INSTRUCTION
    }

    fn initial_prompt(&self, example: &Example) -> String {
        prompts::initial_prompt(self.name(), example, prompts::JSCODESHIFT_EXAMPLES)
    }

    fn type_catalogue(&self) -> &TypeCatalogue {
        TypeCatalogue::jscodeshift()
    }

    fn create_oracle(
        &self,
        toolchain: &ToolchainConfig,
        session_id: &str,
    ) -> Result<Box<dyn Oracle>, ToolError> {
        Ok(Box::new(JscodeshiftOracle::new(toolchain, session_id)?))
    }
}

/// Resolve the profile for a configured engine.
pub fn profile_for(kind: EngineKind) -> Box<dyn EngineProfile> {
    match kind {
        EngineKind::Jscodeshift => Box::new(JscodeshiftProfile),
    }
}
