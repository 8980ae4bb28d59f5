use clap::Parser;
use tracing_subscriber::EnvFilter;
use youtube_info_api_stack::{
    cli::{Cli, Commands, PropsCommands, SchemaCommands, SynthCommands},
    consts::{DEFAULT_LOG_FILTER, DISPLAY_NAME, PKG_VERSION},
    main_actions::{
        list_declarations, print_props_schema, print_template, synthesize_app,
        write_props_schema_to_file, write_template_to_file,
    },
};

fn init_tracing() {
    // Logs go to stderr, stdout carries the template.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_level(true)
        .with_ansi(true)
        .with_env_filter(env_filter)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        env_file,
        stack_id,
        props_file,
        command,
    } = cli;

    match command {
        Commands::Synth { command } => {
            let app = synthesize_app(&env_file, &stack_id, props_file.as_deref())?;

            match command {
                SynthCommands::Print { format } => print_template(&app, &stack_id, format),
                SynthCommands::Write { file, format } => {
                    write_template_to_file(file, &app, &stack_id, format)
                }
            }
        }
        Commands::List {} => {
            let app = synthesize_app(&env_file, &stack_id, props_file.as_deref())?;
            list_declarations(&app, &stack_id)
        }
        Commands::Props { command } => match command {
            PropsCommands::Schema { command } => match command {
                SchemaCommands::Print {} => print_props_schema(),
                SchemaCommands::Write { file } => write_props_schema_to_file(file),
            },
        },
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    tracing::debug!(display_name = DISPLAY_NAME, version = PKG_VERSION, ?cli, "Starting.");

    if let Err(error) = run(cli) {
        tracing::error!("{error:#}");
        std::process::exit(1);
    }
}
