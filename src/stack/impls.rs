use super::{
    defs::{
        Code, FunctionDecl, FunctionRef, FunctionUrlAuthType, FunctionUrlDecl, Handler,
        RepositoryDecl, RepositoryRef, Runtime, StackProps, SynthError, TemplateFormat,
    },
    Stack,
};
use crate::{
    cfn::{
        EcrRepositoryProperties, Expr, IamRoleProperties, LambdaCode, LambdaEnvironment,
        LambdaFunctionProperties, LambdaImageConfig, LambdaPermissionProperties, LambdaUrlCors,
        LambdaUrlProperties, Output, PolicyDocument, PolicyStatement, RemovalPolicy, Resource,
        ResourceProperties, ServicePrincipal, Tag, Template, TemplateMetadata, PSEUDO_PARTITION,
        PSEUDO_URL_SUFFIX,
    },
    consts::{
        ECR_PULL_ACTIONS, INVOKE_FUNCTION_URL_ACTION, INVOKE_FUNCTION_URL_PERMISSION_ID,
        LAMBDA_BASIC_EXECUTION_POLICY, LAMBDA_SERVICE_PRINCIPAL, SERVICE_ROLE_ID,
    },
    utils::to_logical_id,
};

const DIGEST_PREFIX: &str = "sha256:";

impl StackProps {
    fn to_tags(&self) -> Vec<Tag> {
        self.tags
            .iter()
            .flatten()
            .map(|(key, value)| Tag {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }

    fn to_metadata(&self) -> Option<TemplateMetadata> {
        let account = self.env.as_ref().and_then(|env| env.account.clone());
        let region = self.env.as_ref().and_then(|env| env.region.clone());

        if account.is_none() && region.is_none() && self.termination_protection.is_none() {
            return None;
        }

        Some(TemplateMetadata {
            account,
            region,
            termination_protection: self.termination_protection,
        })
    }
}

impl RepositoryRef {
    pub fn to_arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    /// `<account>.dkr.ecr.<region>.<url suffix>/<name>:<tag>`, or `@<digest>`
    /// when a digest is given.
    pub fn to_repository_uri_for_tag_or_digest(&self, tag_or_digest: &str) -> Expr {
        let separator = if tag_or_digest.starts_with(DIGEST_PREFIX) {
            "@"
        } else {
            ":"
        };

        Expr::join(
            "",
            vec![
                Expr::select(4, Expr::split(":", self.to_arn())),
                Expr::str(".dkr.ecr."),
                Expr::select(3, Expr::split(":", self.to_arn())),
                Expr::str("."),
                Expr::reference(PSEUDO_URL_SUFFIX),
                Expr::str("/"),
                Expr::reference(&self.logical_id),
                Expr::str(format!("{separator}{tag_or_digest}")),
            ],
        )
    }
}

impl FunctionRef {
    pub fn to_arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

impl RepositoryDecl {
    /// Lets the Lambda service pull images for functions running from them.
    fn to_lambda_pull_policy(&self) -> PolicyDocument {
        PolicyDocument::new(vec![PolicyStatement {
            action: ECR_PULL_ACTIONS.iter().map(|action| action.to_string()).collect(),
            effect: String::from("Allow"),
            principal: ServicePrincipal {
                service: String::from(LAMBDA_SERVICE_PRINCIPAL),
            },
        }])
    }

    fn to_resource(&self, pulled_by_lambda: bool, tags: &[Tag]) -> Resource {
        Resource::new(ResourceProperties::EcrRepository(EcrRepositoryProperties {
            repository_name: self.props.repository_name.clone(),
            repository_policy_text: pulled_by_lambda.then(|| self.to_lambda_pull_policy()),
            tags: tags.to_vec(),
        }))
        .with_removal_policy(RemovalPolicy::Retain)
    }
}

impl FunctionDecl {
    fn uses_repository(&self, repository: &RepositoryDecl) -> bool {
        match &self.props.code {
            Code::EcrImage {
                repository: image_repository,
                ..
            } => image_repository.construct_id == repository.construct_id,
        }
    }

    fn to_service_role_logical_id(&self) -> String {
        to_logical_id(&[self.construct_id.as_str(), SERVICE_ROLE_ID])
    }

    fn to_service_role(&self, tags: &[Tag]) -> Resource {
        Resource::new(ResourceProperties::IamRole(IamRoleProperties {
            assume_role_policy_document: PolicyDocument::new(vec![PolicyStatement {
                action: vec![String::from("sts:AssumeRole")],
                effect: String::from("Allow"),
                principal: ServicePrincipal {
                    service: String::from(LAMBDA_SERVICE_PRINCIPAL),
                },
            }]),
            managed_policy_arns: vec![Expr::join(
                "",
                vec![
                    Expr::str("arn:"),
                    Expr::reference(PSEUDO_PARTITION),
                    Expr::str(format!(":iam::aws:policy/{LAMBDA_BASIC_EXECUTION_POLICY}")),
                ],
            )],
            tags: tags.to_vec(),
        }))
    }

    fn to_package_type(&self) -> String {
        match (self.props.runtime, self.props.handler) {
            (Runtime::FromImage, Handler::FromImage) => String::from("Image"),
        }
    }

    fn to_image_uri(&self) -> Expr {
        match &self.props.code {
            Code::EcrImage { repository, props } => {
                repository.to_repository_uri_for_tag_or_digest(&props.tag_or_digest)
            }
        }
    }

    fn to_image_config(&self) -> Option<LambdaImageConfig> {
        match &self.props.code {
            Code::EcrImage { props, .. } if !props.cmd.is_empty() => Some(LambdaImageConfig {
                command: props.cmd.clone(),
            }),
            _ => None,
        }
    }

    fn to_environment(&self) -> Option<LambdaEnvironment> {
        if self.props.environment.is_empty() {
            return None;
        }

        Some(LambdaEnvironment {
            variables: self
                .props
                .environment
                .iter()
                .map(|(name, value)| (name.clone(), value.expose().to_string()))
                .collect(),
        })
    }

    fn to_resource(&self, role: Expr, tags: &[Tag]) -> Resource {
        Resource::new(ResourceProperties::LambdaFunction(LambdaFunctionProperties {
            package_type: self.to_package_type(),
            code: LambdaCode {
                image_uri: self.to_image_uri(),
            },
            image_config: self.to_image_config(),
            role,
            timeout: self.props.timeout.to_seconds(),
            environment: self.to_environment(),
            tags: tags.to_vec(),
        }))
    }
}

impl FunctionUrlDecl {
    fn to_cors(&self) -> Option<LambdaUrlCors> {
        self.options.cors.as_ref().map(|cors| LambdaUrlCors {
            allow_methods: cors
                .allowed_methods
                .iter()
                .map(|method| String::from(method.as_str()))
                .collect(),
            allow_origins: cors.allowed_origins.clone(),
        })
    }

    fn to_resource(&self) -> Resource {
        Resource::new(ResourceProperties::LambdaUrl(LambdaUrlProperties {
            auth_type: String::from(self.options.auth_type.as_str()),
            target_function_arn: self.function.to_arn(),
            cors: self.to_cors(),
        }))
    }

    fn to_permission_logical_id(&self) -> String {
        to_logical_id(&[
            self.function.construct_id.as_str(),
            INVOKE_FUNCTION_URL_PERMISSION_ID,
        ])
    }

    /// An unauthenticated URL needs a resource policy letting anyone invoke it.
    fn to_public_permission(&self) -> Option<Resource> {
        match self.options.auth_type {
            FunctionUrlAuthType::None => Some(Resource::new(
                ResourceProperties::LambdaPermission(LambdaPermissionProperties {
                    action: String::from(INVOKE_FUNCTION_URL_ACTION),
                    function_name: self.function.to_arn(),
                    principal: String::from("*"),
                    function_url_auth_type: Some(String::from(
                        FunctionUrlAuthType::None.as_str(),
                    )),
                }),
            )),
            FunctionUrlAuthType::AwsIam => None,
        }
    }

    fn to_output_id(&self) -> String {
        to_logical_id(&[self.function.construct_id.as_str(), "Url"])
    }

    fn to_output(&self) -> Output {
        Output {
            value: Expr::get_att(&self.logical_id, "FunctionUrl"),
            description: Some(format!(
                "Public URL of {}",
                self.function.construct_id
            )),
        }
    }
}

impl Stack {
    /// Synthesizes the declarations into a CloudFormation template.
    ///
    /// Besides one resource per declaration this emits the supporting
    /// resources the declarations imply: a pull policy on repositories that
    /// functions run from, a service role for functions without an execution
    /// role and a public invoke permission for unauthenticated function urls.
    pub fn to_template(&self) -> Template {
        let tags = self.props.to_tags();
        let mut template = Template {
            description: self.props.description.clone(),
            metadata: self.props.to_metadata(),
            ..Default::default()
        };

        for repository in self.repositories() {
            let pulled_by_lambda = self
                .functions()
                .any(|function| function.uses_repository(repository));

            template.resources.insert(
                repository.logical_id.clone(),
                repository.to_resource(pulled_by_lambda, &tags),
            );
        }

        for function in self.functions() {
            let resource = match self.props.execution_role_arn {
                Some(ref role_arn) => function.to_resource(Expr::str(role_arn), &tags),
                None => {
                    let role_logical_id = function.to_service_role_logical_id();
                    let role = Expr::get_att(&role_logical_id, "Arn");

                    template
                        .resources
                        .insert(role_logical_id.clone(), function.to_service_role(&tags));

                    function
                        .to_resource(role, &tags)
                        .with_depends_on(role_logical_id)
                }
            };

            template
                .resources
                .insert(function.logical_id.clone(), resource);
        }

        for function_url in self.function_urls() {
            template
                .resources
                .insert(function_url.logical_id.clone(), function_url.to_resource());

            if let Some(permission) = function_url.to_public_permission() {
                template
                    .resources
                    .insert(function_url.to_permission_logical_id(), permission);
            }

            template
                .outputs
                .insert(function_url.to_output_id(), function_url.to_output());
        }

        template
    }

    pub fn to_yaml_string(&self) -> Result<String, SynthError> {
        serde_yaml::to_string(&self.to_template()).map_err(SynthError::Yaml)
    }

    pub fn to_json_string(&self) -> Result<String, SynthError> {
        serde_json::to_string_pretty(&self.to_template()).map_err(SynthError::Json)
    }

    pub fn to_template_string(&self, format: TemplateFormat) -> Result<String, SynthError> {
        match format {
            TemplateFormat::Yaml => self.to_yaml_string(),
            TemplateFormat::Json => self.to_json_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::defs::{
        Duration, EcrImageCodeProps, FunctionProps, FunctionUrlCorsOptions, FunctionUrlOptions,
        HttpMethod, RepositoryProps, StackEnvironment,
    };
    use super::*;
    use crate::config::Secret;
    use serde_json::{json, Value};

    fn stack(props: StackProps, tag_or_digest: &str, auth_type: FunctionUrlAuthType) -> Stack {
        let mut stack = Stack::new("Test", props);

        let repository = stack
            .add_repository("images", RepositoryProps::default())
            .unwrap();
        let function = stack
            .add_function(
                "handler",
                FunctionProps {
                    code: Code::from_ecr_image(
                        &repository,
                        EcrImageCodeProps {
                            cmd: vec![String::from("app.handler")],
                            tag_or_digest: String::from(tag_or_digest),
                        },
                    ),
                    runtime: Runtime::FromImage,
                    handler: Handler::FromImage,
                    timeout: Duration::seconds(42),
                    environment: [(String::from("TOKEN"), Secret::new("t0k3n"))].into(),
                },
            )
            .unwrap();
        stack
            .add_function_url(
                &function,
                FunctionUrlOptions {
                    auth_type,
                    cors: Some(FunctionUrlCorsOptions {
                        allowed_methods: vec![HttpMethod::Get, HttpMethod::Post],
                        allowed_origins: vec![String::from("https://example.com")],
                    }),
                },
            )
            .unwrap();

        stack
    }

    fn template_json(stack: &Stack) -> Value {
        serde_json::to_value(stack.to_template()).unwrap()
    }

    #[test]
    fn function_is_wired_to_repository_image() {
        let template = template_json(&stack(
            StackProps::default(),
            "v1",
            FunctionUrlAuthType::AwsIam,
        ));
        let function = &template["Resources"]["Handler"];

        assert_eq!(function["Type"], json!("AWS::Lambda::Function"));
        assert_eq!(function["Properties"]["PackageType"], json!("Image"));
        assert_eq!(function["Properties"]["Timeout"], json!(42));
        assert_eq!(
            function["Properties"]["ImageConfig"]["Command"],
            json!(["app.handler"])
        );
        assert_eq!(
            function["Properties"]["Environment"]["Variables"],
            json!({"TOKEN": "t0k3n"})
        );

        let parts = &function["Properties"]["Code"]["ImageUri"]["Fn::Join"][1];
        assert_eq!(parts[6], json!({"Ref": "Images"}));
        assert_eq!(parts[7], json!(":v1"));
    }

    #[test]
    fn digest_uses_at_separator() {
        let template = template_json(&stack(
            StackProps::default(),
            "sha256:abcdef",
            FunctionUrlAuthType::AwsIam,
        ));

        assert_eq!(
            template["Resources"]["Handler"]["Properties"]["Code"]["ImageUri"]["Fn::Join"][1][7],
            json!("@sha256:abcdef")
        );
    }

    #[test]
    fn service_role_is_synthesized_without_execution_role() {
        let template = template_json(&stack(
            StackProps::default(),
            "latest",
            FunctionUrlAuthType::AwsIam,
        ));

        let role = &template["Resources"]["HandlerServiceRole"];
        assert_eq!(role["Type"], json!("AWS::IAM::Role"));
        assert_eq!(
            role["Properties"]["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            json!("lambda.amazonaws.com")
        );

        let function = &template["Resources"]["Handler"];
        assert_eq!(
            function["Properties"]["Role"],
            json!({"Fn::GetAtt": ["HandlerServiceRole", "Arn"]})
        );
        assert_eq!(function["DependsOn"], json!(["HandlerServiceRole"]));
    }

    #[test]
    fn execution_role_replaces_service_role() {
        let props = StackProps {
            execution_role_arn: Some(String::from("arn:aws:iam::123456789012:role/api")),
            ..Default::default()
        };
        let template = template_json(&stack(props, "latest", FunctionUrlAuthType::AwsIam));

        assert!(template["Resources"].get("HandlerServiceRole").is_none());
        assert_eq!(
            template["Resources"]["Handler"]["Properties"]["Role"],
            json!("arn:aws:iam::123456789012:role/api")
        );
        assert!(template["Resources"]["Handler"].get("DependsOn").is_none());
    }

    #[test]
    fn public_url_gets_invoke_permission() {
        let template = template_json(&stack(
            StackProps::default(),
            "latest",
            FunctionUrlAuthType::None,
        ));

        let permission = &template["Resources"]["HandlerInvokeFunctionUrl"];
        assert_eq!(permission["Type"], json!("AWS::Lambda::Permission"));
        assert_eq!(
            permission["Properties"]["Action"],
            json!("lambda:InvokeFunctionUrl")
        );
        assert_eq!(permission["Properties"]["Principal"], json!("*"));
        assert_eq!(
            permission["Properties"]["FunctionUrlAuthType"],
            json!("NONE")
        );

        let url = &template["Resources"]["HandlerFunctionUrl"];
        assert_eq!(url["Properties"]["AuthType"], json!("NONE"));
        assert_eq!(
            url["Properties"]["Cors"],
            json!({"AllowMethods": ["GET", "POST"], "AllowOrigins": ["https://example.com"]})
        );
        assert_eq!(
            template["Outputs"]["HandlerUrl"]["Value"],
            json!({"Fn::GetAtt": ["HandlerFunctionUrl", "FunctionUrl"]})
        );
    }

    #[test]
    fn iam_url_has_no_public_permission() {
        let template = template_json(&stack(
            StackProps::default(),
            "latest",
            FunctionUrlAuthType::AwsIam,
        ));

        assert!(template["Resources"]
            .get("HandlerInvokeFunctionUrl")
            .is_none());
        assert_eq!(
            template["Resources"]["HandlerFunctionUrl"]["Properties"]["AuthType"],
            json!("AWS_IAM")
        );
    }

    #[test]
    fn props_become_description_and_tags() {
        let props = StackProps {
            description: Some(String::from("test stack")),
            tags: Some([(String::from("team"), String::from("video"))].into()),
            ..Default::default()
        };
        let template = template_json(&stack(props, "latest", FunctionUrlAuthType::None));

        assert_eq!(template["Description"], json!("test stack"));

        let tags = json!([{"Key": "team", "Value": "video"}]);
        assert_eq!(template["Resources"]["Images"]["Properties"]["Tags"], tags);
        assert_eq!(template["Resources"]["Handler"]["Properties"]["Tags"], tags);
        assert_eq!(
            template["Resources"]["HandlerServiceRole"]["Properties"]["Tags"],
            tags
        );
        assert!(template["Resources"]["HandlerFunctionUrl"]["Properties"]
            .get("Tags")
            .is_none());
    }

    #[test]
    fn referenced_repository_lets_lambda_pull_images() {
        let template = template_json(&stack(
            StackProps::default(),
            "latest",
            FunctionUrlAuthType::None,
        ));

        let statement =
            &template["Resources"]["Images"]["Properties"]["RepositoryPolicyText"]["Statement"][0];
        assert_eq!(statement["Effect"], json!("Allow"));
        assert_eq!(
            statement["Principal"]["Service"],
            json!("lambda.amazonaws.com")
        );
        assert_eq!(
            statement["Action"],
            json!([
                "ecr:BatchCheckLayerAvailability",
                "ecr:GetDownloadUrlForLayer",
                "ecr:BatchGetImage"
            ])
        );
    }

    #[test]
    fn unused_repository_has_no_policy() {
        let mut stack = Stack::new("Test", StackProps::default());
        stack
            .add_repository("images", RepositoryProps::default())
            .unwrap();

        let template = template_json(&stack);

        assert!(template["Resources"]["Images"]["Properties"]
            .get("RepositoryPolicyText")
            .is_none());
    }

    #[test]
    fn env_and_termination_protection_become_metadata() {
        let props = StackProps {
            env: Some(StackEnvironment {
                account: Some(String::from("123456789012")),
                region: Some(String::from("us-east-1")),
            }),
            termination_protection: Some(true),
            ..Default::default()
        };
        let template = template_json(&stack(props, "latest", FunctionUrlAuthType::None));

        assert_eq!(
            template["Metadata"],
            json!({
                "Account": "123456789012",
                "Region": "us-east-1",
                "TerminationProtection": true
            })
        );

        let template = template_json(&stack(
            StackProps::default(),
            "latest",
            FunctionUrlAuthType::None,
        ));
        assert!(template.get("Metadata").is_none());
    }

    #[test]
    fn yaml_and_json_render_the_same_template() {
        let stack = stack(StackProps::default(), "latest", FunctionUrlAuthType::None);

        let from_yaml: Value = serde_yaml::from_str(&stack.to_yaml_string().unwrap()).unwrap();
        let from_json: Value = serde_json::from_str(
            &stack.to_template_string(TemplateFormat::Json).unwrap(),
        )
        .unwrap();

        assert_eq!(from_yaml, from_json);
    }
}
