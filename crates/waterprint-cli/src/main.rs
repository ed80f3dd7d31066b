use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "waterprint", version, about = "Waterprint CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Water usage survey
    Survey {
        #[command(subcommand)]
        action: commands::survey::SurveyAction,
    },
    /// Saving challenges
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Waterprint profile and ledger
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Pending tasks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Category catalog
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so JSON on stdout stays parseable.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("WATERPRINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Survey { action } => commands::survey::run(action),
        Commands::Challenge { action } => commands::challenge::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
