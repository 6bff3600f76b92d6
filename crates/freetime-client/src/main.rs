//! freetime CLI entry point.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use freetime_client::cli::{Cli, Command, ConfigAction};
use freetime_client::commands;
use freetime_client::commands::free::FreeArgs;
use freetime_client::commands::init::InitArgs;
use freetime_client::config::ClientConfig;
use freetime_client::error::{ClientError, ClientResult};
use freetime_core::{TracingConfig, init_tracing};
use freetime_graph::GraphContext;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    };

    // Initialize tracing
    let debug = cli.debug || config.as_ref().is_ok_and(|c| c.debug);
    let tracing_config = if debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    // Run the command
    let result = match config {
        Ok(config) => run(cli, config, &config_path).await,
        Err(e) => Err(ClientError::Config(e)),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig, config_path: &Path) -> ClientResult<()> {
    let credential = cli.credential.as_deref();
    let context = || GraphContext::new(config.to_graph_config(credential));

    match cli.command {
        Command::Free {
            attendees,
            organizer,
            start,
            end,
            slot,
            format,
        } => {
            let args = FreeArgs {
                attendees,
                organizer,
                start,
                end,
                slot,
            };
            commands::free::run(&context()?, &config, args, format).await
        }
        Command::Me { address, format } => {
            commands::lookup::me(&context()?, &address, format).await
        }
        Command::People { domain, format } => {
            commands::lookup::people(&context()?, domain.as_deref(), format).await
        }
        Command::Events {
            address,
            start,
            end,
            detail,
            format,
        } => {
            commands::lookup::events(
                &context()?,
                &address,
                start.as_deref(),
                end.as_deref(),
                detail,
                format,
            )
            .await
        }
        Command::Init {
            access_token,
            refresh_token,
            client_id,
            client_secret,
            force,
        } => {
            let args = InitArgs {
                access_token,
                refresh_token,
                client_id,
                client_secret,
                force,
            };
            commands::init::run(context()?.credentials(), args)
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, config_path),
            ConfigAction::Validate => commands::config::validate(&config, credential),
            ConfigAction::Path => commands::config::path(&config, config_path, credential),
        },
    }
}
