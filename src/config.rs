use crate::{
    consts::{OPENAI_API_KEY_ENV_VAR, YOUTUBE_DATA_API_TOKEN_ENV_VAR},
    stack::defs::StackProps,
};
use std::{
    collections::{BTreeMap, HashMap},
    env::VarError,
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("Required environment variable {name} is not set")]
    Missing { name: String },
    #[error("Required environment variable {name} is empty")]
    Empty { name: String },
    #[error("Environment variable {name} is not valid unicode")]
    NotUnicode { name: String },
    #[error("Failed to load env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Failed to read props file {path}: {source}")]
    ReadProps {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid props file {path}: {source}")]
    InvalidProps {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where the stack reads its deploy-time configuration from.
pub trait EnvSource {
    /// Returns `Ok(None)` if `name` is not set.
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError>;
}

/// The process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
                name: name.to_string(),
            }),
        }
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(name).cloned())
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(name).cloned())
    }
}

/// A string that never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Secrets handed to the function as environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSecrets {
    pub openai_api_key: Secret,
    pub youtube_data_api_token: Secret,
}

impl FunctionSecrets {
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: required(env, OPENAI_API_KEY_ENV_VAR)?,
            youtube_data_api_token: required(env, YOUTUBE_DATA_API_TOKEN_ENV_VAR)?,
        })
    }

    pub fn to_environment(&self) -> BTreeMap<String, Secret> {
        [
            (
                String::from(OPENAI_API_KEY_ENV_VAR),
                self.openai_api_key.clone(),
            ),
            (
                String::from(YOUTUBE_DATA_API_TOKEN_ENV_VAR),
                self.youtube_data_api_token.clone(),
            ),
        ]
        .into()
    }
}

fn required(env: &impl EnvSource, name: &str) -> Result<Secret, ConfigError> {
    match env.var(name)? {
        None => Err(ConfigError::Missing {
            name: name.to_string(),
        }),
        Some(value) if value.is_empty() => Err(ConfigError::Empty {
            name: name.to_string(),
        }),
        Some(value) => Ok(Secret(value)),
    }
}

/// Loads `path` into the process environment.
///
/// Variables already present in the environment are kept. A missing file is
/// not an error, `Ok(false)` is returned instead.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(error) if error.not_found() => Ok(false),
        Err(source) => Err(ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn read_props_file(path: &Path) -> Result<StackProps, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadProps {
        path: path.to_path_buf(),
        source,
    })?;

    parse_props(&content).map_err(|source| ConfigError::InvalidProps {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_props(content: &str) -> Result<StackProps, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn secrets_are_read_from_env() {
        let env = env(&[
            (OPENAI_API_KEY_ENV_VAR, "sk-test"),
            (YOUTUBE_DATA_API_TOKEN_ENV_VAR, "yt-test"),
        ]);

        let secrets = FunctionSecrets::from_env(&env).unwrap();

        assert_eq!(secrets.openai_api_key.expose(), "sk-test");
        assert_eq!(secrets.youtube_data_api_token.expose(), "yt-test");

        let environment = secrets.to_environment();
        assert_eq!(environment.len(), 2);
        assert_eq!(
            environment[YOUTUBE_DATA_API_TOKEN_ENV_VAR].expose(),
            "yt-test"
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        let env = env(&[(OPENAI_API_KEY_ENV_VAR, "sk-test")]);

        match FunctionSecrets::from_env(&env) {
            Err(ConfigError::Missing { name }) => assert_eq!(name, YOUTUBE_DATA_API_TOKEN_ENV_VAR),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_secret_is_an_error() {
        let env = env(&[
            (OPENAI_API_KEY_ENV_VAR, ""),
            (YOUTUBE_DATA_API_TOKEN_ENV_VAR, "yt-test"),
        ]);

        match FunctionSecrets::from_env(&env) {
            Err(ConfigError::Empty { name }) => assert_eq!(name, OPENAI_API_KEY_ENV_VAR),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("sk-very-secret");

        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
    }

    #[test]
    fn missing_env_file_is_not_an_error() {
        let path = Path::new("this/env/file/does/not/exist.env");

        assert!(!load_env_file(path).unwrap());
    }

    fn write_env_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn env_file_values_are_loaded() {
        let file = write_env_file("YTIA_TEST_ENV_FILE_LOADED=from-file\n");

        assert!(load_env_file(file.path()).unwrap());
        assert_eq!(
            ProcessEnv.var("YTIA_TEST_ENV_FILE_LOADED").unwrap().as_deref(),
            Some("from-file")
        );

        std::env::remove_var("YTIA_TEST_ENV_FILE_LOADED");
    }

    #[test]
    fn env_file_does_not_override_process_env() {
        std::env::set_var("YTIA_TEST_ENV_FILE_KEPT", "from-process");
        let file = write_env_file("YTIA_TEST_ENV_FILE_KEPT=from-file\n");

        assert!(load_env_file(file.path()).unwrap());
        assert_eq!(
            ProcessEnv.var("YTIA_TEST_ENV_FILE_KEPT").unwrap().as_deref(),
            Some("from-process")
        );

        std::env::remove_var("YTIA_TEST_ENV_FILE_KEPT");
    }

    #[test]
    fn unset_process_var_is_none() {
        assert_eq!(ProcessEnv.var("YTIA_TEST_NEVER_SET").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_process_var_is_reported() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        std::env::set_var(
            "YTIA_TEST_NON_UNICODE_SECRET",
            OsStr::from_bytes(&[0x66, 0x80]),
        );

        match ProcessEnv.var("YTIA_TEST_NON_UNICODE_SECRET") {
            Err(ConfigError::NotUnicode { name }) => {
                assert_eq!(name, "YTIA_TEST_NON_UNICODE_SECRET")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        std::env::remove_var("YTIA_TEST_NON_UNICODE_SECRET");
    }

    #[test]
    fn props_are_parsed_from_yaml() {
        let props = parse_props(
            "description: Youtube info api\ntags:\n  project: youtube-info\nexecutionRoleArn: arn:aws:iam::123456789012:role/api\n",
        )
        .unwrap();

        assert_eq!(props.description.as_deref(), Some("Youtube info api"));
        assert_eq!(
            props.tags.unwrap().get("project").map(String::as_str),
            Some("youtube-info")
        );
        assert_eq!(
            props.execution_role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/api")
        );
    }

    #[test]
    fn env_and_termination_protection_are_parsed() {
        let props = parse_props(
            "env:\n  account: \"123456789012\"\n  region: eu-west-1\nterminationProtection: true\n",
        )
        .unwrap();

        let env = props.env.unwrap();
        assert_eq!(env.account.as_deref(), Some("123456789012"));
        assert_eq!(env.region.as_deref(), Some("eu-west-1"));
        assert_eq!(props.termination_protection, Some(true));
    }

    #[test]
    fn unknown_props_are_rejected() {
        assert!(parse_props("timeout: 30\n").is_err());
    }
}
