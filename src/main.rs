use clap::Parser;
use streamfox::cli::{
    discover, handle_completions, handle_config_init, monitor, probe, watch, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => watch::run_watch(args).await,
        Commands::Monitor(args) => monitor::run_monitor(args).await,
        Commands::Probe(args) => probe::run_probe(args).await,
        Commands::Discover(args) => discover::run_discover(args).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
