use markflow::actions::ActionPins;
use markflow::codegen::{self, LockWorkflow};
use markflow::engine::EngineDescriptor;
use markflow::error::CompilerError;
use markflow::parse;

// =============================================================================
// Document builders
// =============================================================================

/// Workflow document JSON with the given frontmatter object and markdown body.
pub fn doc(frontmatter: serde_json::Value, markdown: &str) -> String {
    serde_json::json!({ "frontmatter": frontmatter, "markdown": markdown }).to_string()
}

// =============================================================================
// Pipeline drivers
// =============================================================================

/// Run the full pipeline with the built-in engine and pin tables and no
/// version stamp.
pub fn compile(json: &str) -> Result<LockWorkflow, Vec<CompilerError>> {
    let (spec, outputs) = parse::parse_and_resolve(json)?;
    let engine_id = spec
        .frontmatter
        .engine
        .as_ref()
        .map(|e| e.id().to_string())
        .unwrap_or_default();
    let engine = EngineDescriptor::for_id(&engine_id);
    codegen::emit(&spec, &outputs, &engine, &ActionPins::defaults(), None)
}

/// Compile and render, panicking on compile errors.
pub fn lock_text(json: &str) -> String {
    compile(json).expect("Should compile").render()
}
