use super::{
    defs::{
        Code, Duration, EcrImageCodeProps, FunctionProps, FunctionUrlAuthType,
        FunctionUrlCorsOptions, FunctionUrlOptions, Handler, HttpMethod, RepositoryProps, Runtime,
        StackError, StackProps,
    },
    App, Stack,
};
use crate::{
    config::{EnvSource, FunctionSecrets},
    consts::{
        FUNCTION_HANDLER_CMD, FUNCTION_ID, FUNCTION_IMAGE_TAG, FUNCTION_TIMEOUT_SECS,
        REPOSITORY_ID,
    },
};

/// The Youtube info API: a container image repository, a function running the
/// `latest` image from it, and a public URL in front of the function.
pub struct YoutubeInfoApiStack;

impl YoutubeInfoApiStack {
    /// Declares the stack into `scope`.
    ///
    /// Both function secrets are read from `env` first. If either is missing
    /// or empty nothing is registered.
    pub fn define<'a>(
        scope: &'a mut App,
        id: &str,
        props: Option<StackProps>,
        env: &impl EnvSource,
    ) -> Result<&'a Stack, StackError> {
        let secrets = FunctionSecrets::from_env(env)?;

        if scope.contains(id) {
            return Err(StackError::DuplicateId(id.to_string()));
        }

        let mut stack = Stack::new(id, props.unwrap_or_default());

        let repository = stack.add_repository(REPOSITORY_ID, RepositoryProps::default())?;

        let function = stack.add_function(
            FUNCTION_ID,
            FunctionProps {
                code: Code::from_ecr_image(
                    &repository,
                    EcrImageCodeProps {
                        cmd: vec![String::from(FUNCTION_HANDLER_CMD)],
                        tag_or_digest: String::from(FUNCTION_IMAGE_TAG),
                    },
                ),
                runtime: Runtime::FromImage,
                handler: Handler::FromImage,
                timeout: Duration::seconds(FUNCTION_TIMEOUT_SECS),
                environment: secrets.to_environment(),
            },
        )?;

        stack.add_function_url(
            &function,
            FunctionUrlOptions {
                auth_type: FunctionUrlAuthType::None,
                cors: Some(FunctionUrlCorsOptions {
                    allowed_methods: vec![HttpMethod::All],
                    allowed_origins: vec![String::from("*")],
                }),
            },
        )?;

        tracing::info!(stack_id = %id, declarations = stack.declarations().len(), "Stack defined.");

        scope.add_stack(stack)
    }
}
