//! CLI entry point for Ignite.

pub mod auth;
pub mod workout;

use clap::{Parser, Subcommand};

/// Ignite Gym CLI
#[derive(Parser, Debug)]
#[command(name = "ignite", version, about = "Ignite Gym API client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// List muscle groups
    Groups,
    /// List the exercises of a muscle group
    Exercises(ExercisesArgs),
    /// Show one exercise
    Exercise(ExerciseArgs),
    /// Show or extend the workout history
    History(HistoryArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Show whether a session is stored
    Status,
    /// Forget the stored session
    Logout,
}

/// Arguments for `ignite auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,

    #[arg(short, long, env = "IGNITE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct ExercisesArgs {
    /// Muscle group, as listed by `ignite groups`
    pub group: String,
}

#[derive(Parser, Debug)]
pub struct ExerciseArgs {
    pub id: String,
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: Option<HistoryCommands>,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// Mark an exercise as done
    Add { exercise_id: String },
}
