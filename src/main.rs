//! Ignite CLI binary entry point.

use clap::Parser;
use ignite::cli::{AuthCommands, Cli, Commands, HistoryCommands};
use ignite::config::ClientConfig;
use ignite::resources::IgniteApi;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api = match ClientConfig::from_env().and_then(|config| IgniteApi::from_config(&config)) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let _refresh = api.enable_token_refresh(|| {
        eprintln!("⚠️  Session expired, sign in again with `ignite auth login`");
    });
    if let Err(e) = api.restore_session() {
        tracing::warn!(error = %e, "could not restore stored session");
    }

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                ignite::cli::auth::handle_login(&api, &args.email, &args.password).await
            }
            AuthCommands::Status => ignite::cli::auth::handle_status(&api),
            AuthCommands::Logout => ignite::cli::auth::handle_logout(&api),
        },
        Commands::Groups => ignite::cli::workout::handle_groups(&api).await,
        Commands::Exercises(args) => ignite::cli::workout::handle_exercises(&api, &args.group).await,
        Commands::Exercise(args) => ignite::cli::workout::handle_exercise(&api, &args.id).await,
        Commands::History(args) => match args.command {
            None => ignite::cli::workout::handle_history(&api).await,
            Some(HistoryCommands::Add { exercise_id }) => {
                ignite::cli::workout::handle_history_add(&api, &exercise_id).await
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
