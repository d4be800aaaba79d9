pub mod ai;
pub mod config;
pub mod error;
pub mod generator;
pub mod project;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use ai::{GeminiClient, ProjectDescriptor, TextCompletion};
pub use config::Config;
pub use error::GenerateError;
pub use generator::{build_project, GenerationParams, GenerationResult, Generator};
