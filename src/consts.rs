use const_format::concatcp;

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

pub const DISPLAY_NAME: &str = "YoutubeInfoApi";

pub const DEFAULT_LOG_FILTER: &str = concatcp!(PKG_NAME, "=info");

pub const OPENAI_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const YOUTUBE_DATA_API_TOKEN_ENV_VAR: &str = "YOUTUBE_DATA_API_TOKEN";

pub const ENV_FILE_ENV_VAR: &str = "YTIA_ENV_FILE";
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const PROPS_FILE_ENV_VAR: &str = "YTIA_PROPS_FILE";

pub const STACK_ID_ENV_VAR: &str = "YTIA_STACK_ID";
pub const DEFAULT_STACK_ID: &str = concatcp!(DISPLAY_NAME, "Stack");

pub const REPOSITORY_ID: &str = "lambda";
pub const FUNCTION_ID: &str = "apiFunction";
pub const FUNCTION_URL_ID: &str = "FunctionUrl";

pub const FUNCTION_HANDLER_CMD: &str = "app.lambda_handler";
pub const FUNCTION_IMAGE_TAG: &str = "latest";
pub const FUNCTION_TIMEOUT_SECS: u64 = 60 * 15;

/// Upper bound Lambda accepts for a function timeout
pub const MAX_FUNCTION_TIMEOUT_SECS: u64 = 900;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
pub const POLICY_DOCUMENT_VERSION: &str = "2012-10-17";

pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";
pub const LAMBDA_BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";
pub const INVOKE_FUNCTION_URL_ACTION: &str = "lambda:InvokeFunctionUrl";

pub const SERVICE_ROLE_ID: &str = "ServiceRole";
pub const INVOKE_FUNCTION_URL_PERMISSION_ID: &str = "invoke-function-url";

pub const ECR_PULL_ACTIONS: [&str; 3] = [
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
];
