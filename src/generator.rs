use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::ai::{
    build_prompt, extract, CompletionRequest, FileEntry, GeminiClient, ProjectDescriptor,
    SetupInfo, TextCompletion, TreeNode,
};
use crate::config::Config;
use crate::error::GenerateError;
use crate::project;

/// What to generate and where to put it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub description: String,
    pub language: String,
    pub framework: Option<String>,
    pub include_tests: bool,
    pub output_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub total_files: usize,
    pub language: String,
    pub framework: Option<String>,
    pub has_tests: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub project_name: String,
    pub project_path: PathBuf,
    pub file_structure: Vec<TreeNode>,
    pub files: Vec<FileEntry>,
    pub setup_instructions: SetupInfo,
    pub additional_notes: String,
    pub summary: GenerationSummary,
    pub generated_at: DateTime<Utc>,
}

/// Runs prompt, model call, extraction and materialization in order.
pub struct Generator<C> {
    config: Config,
    client: C,
}

impl Generator<GeminiClient> {
    /// Fails with [`GenerateError::Config`] before any network call when no API key is set.
    pub fn from_config(config: Config) -> Result<Self, GenerateError> {
        let client = GeminiClient::new(&config.ai)?;
        Ok(Self::with_client(config, client))
    }
}

impl<C: TextCompletion> Generator<C> {
    pub fn with_client(config: Config, client: C) -> Self {
        Self { config, client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn generate(&self, params: &GenerationParams) -> Result<GenerationResult, GenerateError> {
        let request = CompletionRequest::new(build_prompt(params), &self.config.ai);
        info!(model = %request.model, language = %params.language, "requesting project from model");

        let text = self.client.complete(&request).await?;
        let descriptor = extract(&text)?;
        info!(project = %descriptor.project_name, "extracted project descriptor");

        build_project(descriptor, params).await
    }
}

/// Writes an already extracted descriptor to `params.output_root/<projectName>`.
///
/// Nothing touches the filesystem until the descriptor has `files` and every
/// path in it is safe. Structure is created before any content is written.
pub async fn build_project(
    descriptor: ProjectDescriptor,
    params: &GenerationParams,
) -> Result<GenerationResult, GenerateError> {
    descriptor.verify()?;

    let project_path = params.output_root.join(&descriptor.project_name);
    info!(path = ?project_path, "generating project");
    project::ensure_dir(&project_path).await?;

    for node in &descriptor.file_structure {
        project::materialize(&project_path, node).await?;
    }

    let ProjectDescriptor {
        project_name,
        file_structure,
        files,
        setup_instructions,
        additional_notes,
    } = descriptor;
    let files = files.unwrap_or_default();

    project::write_all(&project_path, &files).await?;
    info!(files = files.len(), "project generated");

    Ok(GenerationResult {
        success: true,
        project_name,
        project_path,
        file_structure,
        summary: GenerationSummary {
            total_files: files.len(),
            language: params.language.clone(),
            framework: params.framework.clone(),
            has_tests: params.include_tests,
        },
        files,
        setup_instructions,
        additional_notes,
        generated_at: Utc::now(),
    })
}
