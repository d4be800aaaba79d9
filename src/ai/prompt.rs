use crate::generator::GenerationParams;

pub const SYSTEM_INSTRUCTION: &str = "You are an expert software developer who creates complete, \
production-ready projects with clear documentation and setup instructions.";

/// The reply shape we ask for. Field names must match [`super::schema::ProjectDescriptor`].
pub const RESPONSE_SCHEMA: &str = r#"Format your response as JSON with the following structure:
{
  "projectName": "project-name",
  "fileStructure": [
    {
      "type": "file",
      "name": "README.md"
    },
    {
      "type": "directory",
      "name": "src",
      "children": [
        {
          "type": "file",
          "name": "index.js"
        }
      ]
    }
  ],
  "files": [
    {
      "path": "relative/path/to/file",
      "content": "file content here",
      "description": "brief description of this file"
    }
  ],
  "setupInstructions": {
    "prerequisites": ["prerequisite 1", "prerequisite 2"],
    "installCommands": ["command 1", "command 2"],
    "runCommands": ["command to run the project"],
    "testCommands": ["command to run tests"],
    "environmentVariables": [
      {
        "name": "VAR_NAME",
        "description": "what this variable is for",
        "example": "example value"
      }
    ]
  },
  "additionalNotes": "any additional information or tips"
}"#;

pub fn build_prompt(params: &GenerationParams) -> String {
    let framework = params
        .framework
        .as_deref()
        .map(|f| format!("Framework: {}\n", f))
        .unwrap_or_default();
    let tests = if params.include_tests {
        "Include unit tests"
    } else {
        "No tests needed"
    };

    format!(
        "Generate a complete, production-ready project based on the following requirements:\n\
         \n\
         Description: {description}\n\
         Language: {language}\n\
         {framework}\
         {tests}\n\
         \n\
         Please provide:\n\
         1. Complete file structure (directory tree)\n\
         2. All necessary files with complete code\n\
         3. Package configuration files (package.json, requirements.txt, etc.)\n\
         4. README.md with:\n   \
            - Project description\n   \
            - Installation instructions\n   \
            - Setup commands\n   \
            - How to run the project\n   \
            - How to run tests (if applicable)\n   \
            - Environment variables needed\n\
         5. Any additional configuration files needed\n\
         \n\
         IMPORTANT: The fileStructure should represent the direct contents of the project \
         directory, NOT wrapped in a root node.\n\
         \n\
         {schema}",
        description = params.description,
        language = params.language,
        framework = framework,
        tests = tests,
        schema = RESPONSE_SCHEMA,
    )
}
