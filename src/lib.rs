pub mod actions;
pub mod codegen;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod parse;
pub mod validate;
pub mod wasm;
