use crate::{
    consts::{DEFAULT_ENV_FILE, DEFAULT_STACK_ID, ENV_FILE_ENV_VAR, PROPS_FILE_ENV_VAR, STACK_ID_ENV_VAR},
    stack::defs::TemplateFormat,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dotenv file the function secrets are loaded from.
    /// Variables already set in the environment take precedence
    #[clap(long, global = true, env = ENV_FILE_ENV_VAR, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
    /// The id of the stack
    #[clap(short, long, global = true, env = STACK_ID_ENV_VAR, default_value = DEFAULT_STACK_ID)]
    pub stack_id: String,
    /// YAML file with stack-level properties
    #[clap(short, long, global = true, env = PROPS_FILE_ENV_VAR)]
    pub props_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesizes the stack into a CloudFormation template
    #[clap(visible_alias = "s")]
    Synth {
        #[command(subcommand)]
        command: SynthCommands,
    },
    /// Lists the resources declared by the stack
    #[clap(visible_alias = "ls")]
    List {},
    /// Stack properties file commands
    #[clap(visible_alias = "p")]
    Props {
        #[command(subcommand)]
        command: PropsCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SynthCommands {
    /// Prints the template to stdout
    #[clap(visible_alias = "p")]
    Print {
        /// Output format of the template
        #[clap(short, long, value_enum, default_value_t = TemplateFormat::default())]
        format: TemplateFormat,
    },
    /// Writes the template to a file
    #[clap(visible_alias = "w")]
    Write {
        /// The path to the file to write the template to
        #[clap(short = 'o', long)]
        file: PathBuf,
        /// Output format of the template
        #[clap(short, long, value_enum, default_value_t = TemplateFormat::default())]
        format: TemplateFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum PropsCommands {
    /// JSON schema of the properties file
    #[clap(visible_alias = "s")]
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Prints the JSON schema of the properties file to stdout
    #[clap(visible_alias = "p")]
    Print {},
    /// Writes the JSON schema of the properties file to a file
    #[clap(visible_alias = "w")]
    Write {
        /// The path to the file to write the schema to
        #[clap(short = 'o', long)]
        file: PathBuf,
    },
}
