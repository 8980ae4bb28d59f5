use crate::config::{ConfigError, Secret};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Optional stack-level properties, read from the props file.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackProps {
    /// description is written as the template description
    pub description: Option<String>,

    /// env is the account and region the stack is meant for
    pub env: Option<StackEnvironment>,

    /// tags are applied to every taggable resource in the stack
    pub tags: Option<BTreeMap<String, String>>,

    /// executionRoleArn is an existing IAM role for the function.
    /// If it is not set, a service role is synthesized.
    pub execution_role_arn: Option<String>,

    /// terminationProtection guards the deployed stack against deletion
    pub termination_protection: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackEnvironment {
    pub account: Option<String>,
    pub region: Option<String>,
}

/// Duration with second granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    secs: u64,
}

impl Duration {
    pub const fn seconds(secs: u64) -> Self {
        Self { secs }
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self { secs: minutes * 60 }
    }

    pub const fn to_seconds(&self) -> u64 {
        self.secs
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// The runtime is whatever the container image ships
    FromImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// The handler is taken from the image command
    FromImage,
}

/// A repository declared in a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub construct_id: String,
    pub logical_id: String,
}

/// A function declared in a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub construct_id: String,
    pub logical_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryProps {
    /// Physical name, generated by CloudFormation if unset
    pub repository_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrImageCodeProps {
    /// Overrides the image CMD
    pub cmd: Vec<String>,
    /// Either a tag such as `latest` or a digest such as `sha256:...`
    pub tag_or_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    EcrImage {
        repository: RepositoryRef,
        props: EcrImageCodeProps,
    },
}

impl Code {
    pub fn from_ecr_image(repository: &RepositoryRef, props: EcrImageCodeProps) -> Self {
        Code::EcrImage {
            repository: repository.clone(),
            props,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionProps {
    pub code: Code,
    pub runtime: Runtime,
    pub handler: Handler,
    pub timeout: Duration,
    pub environment: BTreeMap<String, Secret>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionUrlAuthType {
    AwsIam,
    None,
}

impl FunctionUrlAuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionUrlAuthType::AwsIam => "AWS_IAM",
            FunctionUrlAuthType::None => "NONE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Head,
    Post,
    Delete,
    Patch,
    Options,
    All,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::All => "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionUrlCorsOptions {
    pub allowed_methods: Vec<HttpMethod>,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionUrlOptions {
    pub auth_type: FunctionUrlAuthType,
    pub cors: Option<FunctionUrlCorsOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDecl {
    pub construct_id: String,
    pub logical_id: String,
    pub props: RepositoryProps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub construct_id: String,
    pub logical_id: String,
    pub props: FunctionProps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionUrlDecl {
    pub construct_id: String,
    pub logical_id: String,
    pub function: FunctionRef,
    pub options: FunctionUrlOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Repository(RepositoryDecl),
    Function(FunctionDecl),
    FunctionUrl(FunctionUrlDecl),
}

impl Declaration {
    pub fn construct_id(&self) -> &str {
        match self {
            Declaration::Repository(decl) => &decl.construct_id,
            Declaration::Function(decl) => &decl.construct_id,
            Declaration::FunctionUrl(decl) => &decl.construct_id,
        }
    }

    pub fn logical_id(&self) -> &str {
        match self {
            Declaration::Repository(decl) => &decl.logical_id,
            Declaration::Function(decl) => &decl.logical_id,
            Declaration::FunctionUrl(decl) => &decl.logical_id,
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Repository(_) => DeclarationKind::Repository,
            Declaration::Function(_) => DeclarationKind::Function,
            Declaration::FunctionUrl(_) => DeclarationKind::FunctionUrl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Repository,
    Function,
    FunctionUrl,
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationKind::Repository => write!(f, "AWS::ECR::Repository"),
            DeclarationKind::Function => write!(f, "AWS::Lambda::Function"),
            DeclarationKind::FunctionUrl => write!(f, "AWS::Lambda::Url"),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateFormat {
    #[default]
    Yaml,
    Json,
}

impl std::fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateFormat::Yaml => write!(f, "yaml"),
            TemplateFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(ThisError, Debug)]
pub enum StackError {
    #[error("Configuration error: {0}")]
    Config(
        #[from]
        #[source]
        ConfigError,
    ),
    #[error("Construct id {0} is already used in this scope")]
    DuplicateId(String),
    #[error("Construct id {0:?} does not produce a valid logical id")]
    InvalidId(String),
    #[error("Construct {0} is not declared in this stack")]
    UnknownReference(String),
    #[error("Function timeout {0} is out of range")]
    InvalidTimeout(Duration),
}

#[derive(ThisError, Debug)]
pub enum SynthError {
    #[error("Failed to serialize template to yaml: {0}")]
    Yaml(#[source] serde_yaml::Error),
    #[error("Failed to serialize template to json: {0}")]
    Json(#[source] serde_json::Error),
}
