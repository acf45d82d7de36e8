use clap::Parser;
use threadmap::Settings;
use threadmap::cli::{Cli, Commands, commands};

fn main() {
    let cli = Cli::parse();

    // Init writes the file that would otherwise be loaded
    if let Commands::Init { force } = &cli.command {
        std::process::exit(commands::init::run_init(*force));
    }

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    if cli.verbose {
        settings.logging.default = "info".to_string();
    }
    threadmap::logging::init_with_config(&settings.logging);
    tracing::debug!(target: "cli", "loaded settings version {}", settings.version);

    let code = match &cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Run(args) => commands::run::run(args, &settings),
        Commands::Dedupe { input, output } => commands::dedupe::run(input, output),
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // This test ensures the CLI structure is valid
        Cli::command().debug_assert();
    }
}
