use crate::ai::{AIError, CompletionRequest, TextCompletion};
use crate::config::Config;
use crate::generator::{GenerationParams, Generator};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;

mod generator;

/// Replays a canned reply and remembers the requests it saw.
pub(crate) struct FakeCompletion {
    reply: Result<String, fn() -> AIError>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: fn() -> AIError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextCompletion for FakeCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(error) => Err(error()),
        }
    }
}

// Test utilities and helpers
pub(crate) struct TestUtils;

impl TestUtils {
    pub fn params(output_root: &Path) -> GenerationParams {
        GenerationParams {
            description: "Print a number".to_string(),
            language: "JavaScript".to_string(),
            framework: None,
            include_tests: false,
            output_root: output_root.to_path_buf(),
        }
    }

    pub fn generator(reply: impl Into<String>) -> Generator<FakeCompletion> {
        Generator::with_client(Config::default(), FakeCompletion::replying(reply))
    }

    /// The reply from the end-to-end scenario: one file under `src/`.
    pub fn demo_reply(project_name: &str) -> String {
        let descriptor = json!({
            "projectName": project_name,
            "fileStructure": [{
                "type": "directory",
                "name": "src",
                "children": [{ "type": "file", "name": "index.js" }]
            }],
            "files": [{
                "path": "src/index.js",
                "content": "console.log(1)",
                "description": "entry point"
            }],
            "setupInstructions": {
                "prerequisites": ["Node.js 18+"],
                "installCommands": [],
                "runCommands": ["node src/index.js"],
                "testCommands": [],
                "environmentVariables": []
            },
            "additionalNotes": "Prints 1."
        });
        format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(&descriptor).unwrap()
        )
    }
}
