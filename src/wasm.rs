//! WASM entry points for browser and Node embedding.

use wasm_bindgen::prelude::*;

use crate::actions::ActionPins;
use crate::codegen::{self, LockWorkflow};
use crate::engine::EngineDescriptor;
use crate::error::CompilerError;

/// Compiler version stamped into generated lock headers.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Validate a workflow document JSON without rendering the lock text.
/// Graph and ordering rules only exist once jobs are planned, so this runs
/// the full pipeline and discards the artifact.
/// Returns a JSON array of CompilerError objects.
#[wasm_bindgen]
pub fn validate_workflow(json: &str) -> JsValue {
    let result = validate_workflow_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_workflow_inner(json: &str) -> Vec<ErrorDto> {
    match compile(json) {
        Ok(_) => Vec::new(),
        Err(errors) => errors.into_iter().map(ErrorDto::from).collect(),
    }
}

/// Full pipeline: parse → resolve directives → plan jobs → dependency and
/// ordering rules → render.
/// Returns a JSON object with either the lock `content` (success) or
/// `errors` (failure).
#[wasm_bindgen]
pub fn compile_workflow(json: &str) -> JsValue {
    let result = compile_workflow_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_workflow_inner(json: &str) -> CompileResult {
    match compile(json) {
        Ok(lock) => CompileResult::Success {
            content: lock.render(),
            warnings: lock.warnings,
        },
        Err(errors) => CompileResult::Errors {
            errors: errors.into_iter().map(ErrorDto::from).collect(),
        },
    }
}

/// Shared pipeline behind both entry points. Engine and pins come from the
/// built-in tables; embedders wanting custom pins call [`codegen::emit`]
/// directly.
fn compile(json: &str) -> Result<LockWorkflow, Vec<CompilerError>> {
    // 1. Parse + resolve directives
    let (spec, outputs) = crate::parse::parse_and_resolve(json)?;

    // 2. Select the engine named by the frontmatter
    let engine_id = spec
        .frontmatter
        .engine
        .as_ref()
        .map(|e| e.id().to_string())
        .unwrap_or_default();
    let engine = EngineDescriptor::for_id(&engine_id);
    let pins = ActionPins::defaults();

    // 3. Emit
    codegen::emit(&spec, &outputs, &engine, &pins, Some(VERSION))
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize, serde::Deserialize)]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
    job: Option<String>,
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            job: e.job,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
enum CompileResult {
    #[serde(rename = "success")]
    Success { content: String, warnings: Vec<String> },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}
