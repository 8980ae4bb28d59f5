use crate::{
    config::{load_env_file, read_props_file, ProcessEnv},
    stack::{
        defs::{StackProps, TemplateFormat},
        youtube_info_api::YoutubeInfoApiStack,
        App, Stack,
    },
};
use anyhow::{Context, Ok, Result as AnyResult};
use itertools::Itertools;
use std::path::{Path, PathBuf};

pub fn load_env(env_file: &Path) -> AnyResult<()> {
    let loaded = load_env_file(env_file).context("Failed to load env file")?;

    if loaded {
        tracing::debug!(env_file = %env_file.display(), "Loaded env file.");
    } else {
        tracing::debug!(env_file = %env_file.display(), "Env file not found. Using process environment only.");
    }

    Ok(())
}

pub fn read_props(props_file: Option<&Path>) -> AnyResult<Option<StackProps>> {
    let Some(props_file) = props_file else {
        return Ok(None);
    };

    let props = read_props_file(props_file).context("Failed to read stack props")?;
    tracing::debug!(props_file = %props_file.display(), "Loaded stack props.");

    Ok(Some(props))
}

/// Loads configuration and defines the stack into a fresh app.
pub fn synthesize_app(
    env_file: &Path,
    stack_id: &str,
    props_file: Option<&Path>,
) -> AnyResult<App> {
    load_env(env_file)?;
    let props = read_props(props_file)?;

    let mut app = App::new();
    YoutubeInfoApiStack::define(&mut app, stack_id, props, &ProcessEnv)
        .context("Failed to define stack")?;

    Ok(app)
}

fn single_stack<'a>(app: &'a App, stack_id: &str) -> AnyResult<&'a Stack> {
    app.stack(stack_id)
        .with_context(|| format!("Stack {stack_id} is not defined"))
}

pub fn print_template(app: &App, stack_id: &str, format: TemplateFormat) -> AnyResult<()> {
    let stack = single_stack(app, stack_id)?;
    println!("{}", stack.to_template_string(format)?);
    Ok(())
}

pub fn write_template_to_file(
    file: PathBuf,
    app: &App,
    stack_id: &str,
    format: TemplateFormat,
) -> AnyResult<()> {
    let stack = single_stack(app, stack_id)?;
    std::fs::write(&file, stack.to_template_string(format)?)
        .context("Failed to write template to file")?;

    tracing::info!(file = %file.display(), %format, "Template written.");

    Ok(())
}

pub fn format_declarations(stack: &Stack) -> String {
    stack
        .declarations()
        .iter()
        .map(|decl| {
            format!(
                "{}\t{}\t{}",
                decl.construct_id(),
                decl.logical_id(),
                decl.kind()
            )
        })
        .join("\n")
}

pub fn list_declarations(app: &App, stack_id: &str) -> AnyResult<()> {
    let stack = single_stack(app, stack_id)?;
    println!("{}", format_declarations(stack));
    Ok(())
}

pub fn generate_props_schema() -> AnyResult<String> {
    serde_json::to_string_pretty(&schemars::schema_for!(StackProps))
        .context("Failed to generate props schema")
}

pub fn print_props_schema() -> AnyResult<()> {
    println!("{}", generate_props_schema()?);
    Ok(())
}

pub fn write_props_schema_to_file(file: PathBuf) -> AnyResult<()> {
    let schema = generate_props_schema()?;
    std::fs::write(&file, schema).context("Failed to write props schema to file")?;

    tracing::info!(file = %file.display(), "Props schema written.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{OPENAI_API_KEY_ENV_VAR, YOUTUBE_DATA_API_TOKEN_ENV_VAR};
    use std::collections::BTreeMap;

    #[test]
    fn declarations_are_listed_one_per_line() {
        let env: BTreeMap<String, String> = [
            (String::from(OPENAI_API_KEY_ENV_VAR), String::from("a")),
            (String::from(YOUTUBE_DATA_API_TOKEN_ENV_VAR), String::from("b")),
        ]
        .into();
        let mut app = App::new();
        let stack = YoutubeInfoApiStack::define(&mut app, "Api", None, &env).unwrap();

        assert_eq!(
            format_declarations(stack),
            "lambda\tLambda\tAWS::ECR::Repository\n\
             apiFunction\tApiFunction\tAWS::Lambda::Function\n\
             apiFunction/FunctionUrl\tApiFunctionFunctionUrl\tAWS::Lambda::Url"
        );
    }

    #[test]
    fn props_schema_describes_props_file() {
        let schema: serde_json::Value =
            serde_json::from_str(&generate_props_schema().unwrap()).unwrap();

        let properties = &schema["properties"];
        assert!(properties.get("description").is_some());
        assert!(properties.get("tags").is_some());
        assert!(properties.get("executionRoleArn").is_some());
        assert!(properties.get("env").is_some());
        assert!(properties.get("terminationProtection").is_some());
    }

    #[test]
    fn missing_props_file_means_no_props() {
        assert!(read_props(None).unwrap().is_none());
    }

    #[test]
    fn unknown_stack_is_an_error() {
        let app = App::new();

        assert!(single_stack(&app, "Nope").is_err());
    }
}
