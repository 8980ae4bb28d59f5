pub mod defs;
mod impls;
pub mod youtube_info_api;

use crate::{
    config::ConfigError,
    consts::{FUNCTION_URL_ID, MAX_FUNCTION_TIMEOUT_SECS},
    utils::{to_construct_path, to_logical_id},
};
use defs::{
    Code, Declaration, FunctionDecl, FunctionProps, FunctionRef, FunctionUrlDecl,
    FunctionUrlOptions, RepositoryDecl, RepositoryProps, RepositoryRef, StackError, StackProps,
};

/// The root scope stacks are registered into.
#[derive(Debug, Default)]
pub struct App {
    stacks: Vec<Stack>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, id: &str) -> Option<&Stack> {
        self.stacks.iter().find(|stack| stack.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stack(id).is_some()
    }

    /// Registers a fully declared stack.
    pub fn add_stack(&mut self, stack: Stack) -> Result<&Stack, StackError> {
        if self.contains(&stack.id) {
            return Err(StackError::DuplicateId(stack.id));
        }

        tracing::debug!(stack_id = %stack.id, declarations = stack.declarations.len(), "Registering stack.");

        let index = self.stacks.len();
        self.stacks.push(stack);

        Ok(&self.stacks[index])
    }
}

/// An ordered set of resource declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    id: String,
    props: StackProps,
    declarations: Vec<Declaration>,
}

impl Stack {
    pub fn new(id: impl Into<String>, props: StackProps) -> Self {
        Self {
            id: id.into(),
            props,
            declarations: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn props(&self) -> &StackProps {
        &self.props
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryDecl> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Repository(repository) => Some(repository),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn function_urls(&self) -> impl Iterator<Item = &FunctionUrlDecl> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::FunctionUrl(function_url) => Some(function_url),
            _ => None,
        })
    }

    fn find(&self, construct_id: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|decl| decl.construct_id() == construct_id)
    }

    fn check_free(&self, construct_id: &str, logical_id: &str) -> Result<(), StackError> {
        if logical_id.is_empty() {
            return Err(StackError::InvalidId(construct_id.to_string()));
        }

        if self
            .declarations
            .iter()
            .any(|decl| decl.construct_id() == construct_id || decl.logical_id() == logical_id)
        {
            return Err(StackError::DuplicateId(construct_id.to_string()));
        }

        Ok(())
    }

    pub fn add_repository(
        &mut self,
        id: &str,
        props: RepositoryProps,
    ) -> Result<RepositoryRef, StackError> {
        let logical_id = to_logical_id(&[id]);
        self.check_free(id, &logical_id)?;

        tracing::debug!(construct_id = %id, %logical_id, "Declaring repository.");

        self.declarations
            .push(Declaration::Repository(RepositoryDecl {
                construct_id: id.to_string(),
                logical_id: logical_id.clone(),
                props,
            }));

        Ok(RepositoryRef {
            construct_id: id.to_string(),
            logical_id,
        })
    }

    pub fn add_function(&mut self, id: &str, props: FunctionProps) -> Result<FunctionRef, StackError> {
        let logical_id = to_logical_id(&[id]);
        self.check_free(id, &logical_id)?;

        let timeout_secs = props.timeout.to_seconds();
        if timeout_secs == 0 || timeout_secs > MAX_FUNCTION_TIMEOUT_SECS {
            return Err(StackError::InvalidTimeout(props.timeout));
        }

        if let Some((name, _)) = props
            .environment
            .iter()
            .find(|(_, value)| value.expose().is_empty())
        {
            return Err(StackError::Config(ConfigError::Empty { name: name.clone() }));
        }

        let Code::EcrImage { ref repository, .. } = props.code;
        if !matches!(
            self.find(&repository.construct_id),
            Some(Declaration::Repository(_))
        ) {
            return Err(StackError::UnknownReference(
                repository.construct_id.clone(),
            ));
        }

        tracing::debug!(
            construct_id = %id,
            %logical_id,
            timeout = %props.timeout,
            environment = props.environment.len(),
            "Declaring function."
        );

        self.declarations.push(Declaration::Function(FunctionDecl {
            construct_id: id.to_string(),
            logical_id: logical_id.clone(),
            props,
        }));

        Ok(FunctionRef {
            construct_id: id.to_string(),
            logical_id,
        })
    }

    /// Adds the public URL of `function`. A function has at most one URL.
    pub fn add_function_url(
        &mut self,
        function: &FunctionRef,
        options: FunctionUrlOptions,
    ) -> Result<(), StackError> {
        if !matches!(
            self.find(&function.construct_id),
            Some(Declaration::Function(_))
        ) {
            return Err(StackError::UnknownReference(function.construct_id.clone()));
        }

        let path = [function.construct_id.as_str(), FUNCTION_URL_ID];
        let construct_id = to_construct_path(&path);
        let logical_id = to_logical_id(&path);
        self.check_free(&construct_id, &logical_id)?;

        tracing::debug!(%construct_id, %logical_id, auth_type = options.auth_type.as_str(), "Declaring function url.");

        self.declarations
            .push(Declaration::FunctionUrl(FunctionUrlDecl {
                construct_id,
                logical_id,
                function: function.clone(),
                options,
            }));

        Ok(())
    }
}
