use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "timetrail", version, about = "Timetrail time tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Cloud synchronization
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Productivity statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Sync { action } => commands::sync::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_add() {
        let cli = Cli::try_parse_from(["timetrail", "task", "add", "Write report"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Task {
                action: commands::task::TaskAction::Add { .. }
            }
        ));
    }

    #[test]
    fn test_parse_sync_push() {
        let cli = Cli::try_parse_from(["timetrail", "sync", "push"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sync {
                action: commands::sync::SyncAction::Push
            }
        ));
    }

    #[test]
    fn test_parse_stats_period() {
        let cli =
            Cli::try_parse_from(["timetrail", "stats", "summary", "--period", "sprint"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Stats {
                action: commands::stats::StatsAction::Summary { .. }
            }
        ));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["timetrail", "bogus"]).is_err());
    }
}
