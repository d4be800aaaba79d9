use super::{FakeCompletion, TestUtils};
use crate::ai::{AIError, ExtractionError, SYSTEM_INSTRUCTION};
use crate::config::Config;
use crate::error::GenerateError;
use crate::generator::{build_project, Generator};
use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Every regular file under `root`, keyed by its relative path.
fn snapshot(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(entry.path()).unwrap();
            (relative, content)
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_demo_project() -> Result<()> {
    let temp = TempDir::new()?;
    let generator = TestUtils::generator(TestUtils::demo_reply("demo"));

    let result = generator.generate(&TestUtils::params(temp.path())).await?;

    let project = temp.path().join("demo");
    assert!(project.join("src").is_dir());
    assert_eq!(
        snapshot(&project),
        BTreeMap::from([("src/index.js".to_string(), "console.log(1)".to_string())])
    );

    assert!(result.success);
    assert_eq!(result.project_name, "demo");
    assert_eq!(result.project_path, project);
    assert_eq!(result.summary.total_files, 1);
    assert_eq!(result.summary.language, "JavaScript");
    assert_eq!(result.summary.framework, None);
    assert!(!result.summary.has_tests);
    assert_eq!(result.setup_instructions.run_commands, vec!["node src/index.js"]);
    assert_eq!(result.additional_notes, "Prints 1.");
    Ok(())
}

#[tokio::test]
async fn test_request_carries_prompt_and_sampling() -> Result<()> {
    let temp = TempDir::new()?;
    let generator = TestUtils::generator(TestUtils::demo_reply("demo"));
    let mut params = TestUtils::params(temp.path());
    params.framework = Some("Express".to_string());
    params.include_tests = true;

    let result = generator.generate(&params).await?;
    assert_eq!(result.summary.framework.as_deref(), Some("Express"));
    assert!(result.summary.has_tests);

    let requests = generator_requests(&generator);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "gemini-2.5-flash");
    assert_eq!(request.system_instruction, SYSTEM_INSTRUCTION);
    assert_eq!(request.temperature, 0.7);
    assert_eq!(request.top_k, 40);
    assert_eq!(request.top_p, 0.95);
    assert!(request.prompt.contains("Description: Print a number"));
    assert!(request.prompt.contains("Framework: Express"));
    assert!(request.prompt.contains("Include unit tests"));
    Ok(())
}

fn generator_requests(
    generator: &Generator<FakeCompletion>,
) -> Vec<crate::ai::CompletionRequest> {
    generator.client().requests.lock().unwrap().clone()
}

#[tokio::test]
async fn test_placeholders_and_written_files() -> Result<()> {
    let temp = TempDir::new()?;
    let reply = json!({
        "projectName": "app",
        "fileStructure": [
            { "type": "file", "name": "README.md" },
            { "type": "file", "name": ".env.example" },
            { "type": "directory", "name": "src", "children": [
                { "type": "file", "name": "main.py" },
                { "type": "directory", "name": "static" }
            ]},
            { "type": "mystery", "name": "ignored" }
        ],
        "files": [
            { "path": "README.md", "content": "# app" },
            { "path": "src/main.py", "content": "print('hi')" },
            { "path": "tests/test_main.py", "content": "def test(): pass" }
        ]
    })
    .to_string();

    TestUtils::generator(reply)
        .generate(&TestUtils::params(temp.path()))
        .await?;

    let project = temp.path().join("app");
    assert_eq!(
        snapshot(&project),
        BTreeMap::from([
            (".env.example".to_string(), String::new()),
            ("README.md".to_string(), "# app".to_string()),
            ("src/main.py".to_string(), "print('hi')".to_string()),
            ("tests/test_main.py".to_string(), "def test(): pass".to_string()),
        ])
    );
    assert!(project.join("src/static").is_dir());
    assert!(!project.join("ignored").exists());
    Ok(())
}

#[tokio::test]
async fn test_structure_wrapped_in_single_root_node() -> Result<()> {
    let temp = TempDir::new()?;
    let reply = json!({
        "projectName": "wrapped",
        "fileStructure": {
            "type": "directory",
            "name": "src",
            "children": [
                { "type": "file", "name": "index.js" },
                { "type": "directory", "name": "assets" }
            ]
        },
        "files": [{ "path": "src/index.js", "content": "console.log(1)" }]
    })
    .to_string();

    let result = TestUtils::generator(reply)
        .generate(&TestUtils::params(temp.path()))
        .await?;

    let project = temp.path().join("wrapped");
    assert_eq!(result.file_structure.len(), 1);
    assert!(project.join("src/assets").is_dir());
    assert_eq!(
        snapshot(&project),
        BTreeMap::from([("src/index.js".to_string(), "console.log(1)".to_string())])
    );
    Ok(())
}

#[tokio::test]
async fn test_running_twice_is_idempotent() -> Result<()> {
    let temp = TempDir::new()?;
    let generator = TestUtils::generator(TestUtils::demo_reply("demo"));
    let params = TestUtils::params(temp.path());

    generator.generate(&params).await?;
    let first = snapshot(temp.path());
    generator.generate(&params).await?;

    assert_eq!(snapshot(temp.path()), first);
    Ok(())
}

#[tokio::test]
async fn test_missing_files_writes_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    let reply = json!({
        "projectName": "demo",
        "fileStructure": [{ "type": "directory", "name": "src" }]
    })
    .to_string();

    let result = TestUtils::generator(reply)
        .generate(&TestUtils::params(temp.path()))
        .await;

    assert!(matches!(
        result,
        Err(GenerateError::Extraction(ExtractionError::MissingFiles))
    ));
    assert_eq!(fs::read_dir(temp.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unsafe_path_writes_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    let reply = json!({
        "projectName": "demo",
        "files": [
            { "path": "ok.txt", "content": "fine" },
            { "path": "../escape.txt", "content": "nope" }
        ]
    })
    .to_string();

    let result = TestUtils::generator(reply)
        .generate(&TestUtils::params(temp.path()))
        .await;

    assert!(matches!(
        result,
        Err(GenerateError::Extraction(ExtractionError::Invalid(_)))
    ));
    assert_eq!(fs::read_dir(temp.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_reply_without_json() -> Result<()> {
    let temp = TempDir::new()?;
    let result = TestUtils::generator("Sorry, I can't help with that.")
        .generate(&TestUtils::params(temp.path()))
        .await;

    assert!(matches!(
        result,
        Err(GenerateError::Extraction(ExtractionError::NoJson))
    ));
    Ok(())
}

#[tokio::test]
async fn test_upstream_failure_propagates() -> Result<()> {
    let temp = TempDir::new()?;
    let generator = Generator::with_client(
        Config::default(),
        FakeCompletion::failing(|| AIError::EmptyResponse),
    );

    let result = generator.generate(&TestUtils::params(temp.path())).await;

    match result {
        Err(err @ GenerateError::Upstream(AIError::EmptyResponse)) => {
            assert!(err.to_string().starts_with("Upstream error"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
    assert_eq!(fs::read_dir(temp.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_missing_api_key_fails_before_network() {
    let result = Generator::from_config(Config::default());
    assert!(matches!(result, Err(GenerateError::Config(_))));
}

#[tokio::test]
async fn test_filesystem_error_names_path() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("demo"), "a file where the project should go")?;

    let descriptor = crate::ai::extract(&TestUtils::demo_reply("demo"))?;
    let result = build_project(descriptor, &TestUtils::params(temp.path())).await;

    match result {
        Err(GenerateError::Filesystem(err)) => assert_eq!(err.path, temp.path().join("demo")),
        other => panic!("expected filesystem error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_generations_do_not_interfere() -> Result<()> {
    let temp = TempDir::new()?;
    let alpha = TestUtils::generator(TestUtils::demo_reply("alpha"));
    let beta = TestUtils::generator(
        TestUtils::demo_reply("beta").replace("console.log(1)", "console.log(2)"),
    );
    let params = TestUtils::params(temp.path());

    let (a, b) = tokio::join!(alpha.generate(&params), beta.generate(&params));
    a?;
    b?;

    assert_eq!(
        snapshot(temp.path()),
        BTreeMap::from([
            ("alpha/src/index.js".to_string(), "console.log(1)".to_string()),
            ("beta/src/index.js".to_string(), "console.log(2)".to_string()),
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_result_serializes_camel_case() -> Result<()> {
    let temp = TempDir::new()?;
    let result = TestUtils::generator(TestUtils::demo_reply("demo"))
        .generate(&TestUtils::params(temp.path()))
        .await?;

    let value = serde_json::to_value(&result)?;
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["projectName"], json!("demo"));
    assert_eq!(value["summary"]["totalFiles"], json!(1));
    assert_eq!(value["summary"]["hasTests"], json!(false));
    assert_eq!(value["fileStructure"][0]["type"], json!("directory"));
    assert!(value["generatedAt"].is_string());
    Ok(())
}
