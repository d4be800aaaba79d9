use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use super::response::ExtractionError;
use crate::project::path_utils::{is_safe_relative_path, is_single_component};

/// The project a model describes in its reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    #[validate(custom = "validate_project_name")]
    pub project_name: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub file_structure: Vec<TreeNode>,
    #[serde(default)]
    pub files: Option<Vec<FileEntry>>,
    #[serde(default, deserialize_with = "nullable")]
    pub setup_instructions: SetupInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub additional_notes: String,
}

/// One declared entry of the directory tree. Carries no content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTreeNode", into = "RawTreeNode")]
pub enum TreeNode {
    File {
        name: String,
    },
    Directory {
        name: String,
        children: Vec<TreeNode>,
    },
    /// A node whose `type` is missing or not one we know, or which has no name.
    Unknown {
        kind: Option<String>,
        name: Option<String>,
    },
}

/// Wire shape of a [`TreeNode`]; models are not strict about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTreeNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<TreeNode>>,
}

impl From<RawTreeNode> for TreeNode {
    fn from(raw: RawTreeNode) -> Self {
        match (raw.kind.as_deref(), raw.name) {
            (Some("file"), Some(name)) => TreeNode::File { name },
            (Some("directory"), Some(name)) => TreeNode::Directory {
                name,
                children: raw.children.unwrap_or_default(),
            },
            (_, name) => TreeNode::Unknown {
                kind: raw.kind,
                name,
            },
        }
    }
}

impl From<TreeNode> for RawTreeNode {
    fn from(node: TreeNode) -> Self {
        match node {
            TreeNode::File { name } => RawTreeNode {
                kind: Some("file".to_string()),
                name: Some(name),
                children: None,
            },
            TreeNode::Directory { name, children } => RawTreeNode {
                kind: Some("directory".to_string()),
                name: Some(name),
                children: Some(children),
            },
            TreeNode::Unknown { kind, name } => RawTreeNode {
                kind,
                name,
                children: None,
            },
        }
    }
}

impl TreeNode {
    pub fn file(name: impl Into<String>) -> Self {
        TreeNode::File { name: name.into() }
    }

    pub fn directory(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode::Directory {
            name: name.into(),
            children,
        }
    }

    fn check_names(&self) -> Result<(), ExtractionError> {
        match self {
            TreeNode::File { name } => check_node_name(name),
            TreeNode::Directory { name, children } => {
                check_node_name(name)?;
                children.iter().try_for_each(TreeNode::check_names)
            }
            TreeNode::Unknown { .. } => Ok(()),
        }
    }
}

fn check_node_name(name: &str) -> Result<(), ExtractionError> {
    if is_safe_relative_path(name) {
        Ok(())
    } else {
        Err(ExtractionError::Invalid(format!(
            "unsafe name in file structure: '{}'",
            name
        )))
    }
}

/// A file and its full content. This, not the tree, decides what lands on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FileEntry {
    #[validate(custom = "validate_relative_path")]
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            description: String::new(),
        }
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub prerequisites: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub install_commands: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub run_commands: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub test_commands: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub environment_variables: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub example: String,
}

impl ProjectDescriptor {
    /// Checks the descriptor is safe to write and returns its files.
    ///
    /// Fails with [`ExtractionError::MissingFiles`] when `files` is absent, and with
    /// [`ExtractionError::Invalid`] when the project name or any path would escape
    /// the project directory.
    pub fn verify(&self) -> Result<&[FileEntry], ExtractionError> {
        let files = self.files.as_deref().ok_or(ExtractionError::MissingFiles)?;

        self.validate()
            .map_err(|e| ExtractionError::Invalid(format!("project name: {}", e)))?;

        for file in files {
            file.validate().map_err(|e| {
                ExtractionError::Invalid(format!("file '{}': {}", file.path, e))
            })?;
        }

        self.file_structure
            .iter()
            .try_for_each(TreeNode::check_names)?;

        Ok(files)
    }
}

fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    if is_single_component(name) {
        Ok(())
    } else {
        Err(ValidationError::new("project_name_not_a_single_directory"))
    }
}

fn validate_relative_path(path: &str) -> Result<(), ValidationError> {
    if is_safe_relative_path(path) {
        Ok(())
    } else {
        Err(ValidationError::new("path_escapes_project"))
    }
}

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accepts a list, a single value (a tree wrapped in one root node) or `null`.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}
