use clap::Parser;
use tracing_subscriber::EnvFilter;

use rw_gateway::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Estimate {
            report,
            model,
            json,
        } => {
            let (config, _) = rw_gateway::cli::load_config()?;
            let est = rw_gateway::cli::estimate::estimate(&config, &report, model.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&est)?);
            } else {
                print!("{}", rw_gateway::cli::estimate::render(&est));
            }
            Ok(())
        }
        Command::Generate(args) => {
            let (config, _) = rw_gateway::cli::load_config()?;
            let completed = rw_gateway::cli::generate::run(config, args).await?;
            if !completed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Suggest {
            description,
            clear,
            dry_run,
        } => {
            let (config, _) = rw_gateway::cli::load_config()?;
            rw_gateway::cli::suggest::run(config, &description, clear, dry_run).await
        }
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = rw_gateway::cli::load_config()?;
            let valid = rw_gateway::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _config_path) = rw_gateway::cli::load_config()?;
            print!("{}", rw_gateway::cli::config::show(&config)?);
            Ok(())
        }
        Command::Version => {
            println!("reportwright {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for report output.
///
/// Compact output defaults to `warn` plus runtime progress; JSON output
/// defaults to `info` so structured trace events come through. `RUST_LOG`
/// overrides both.
fn init_tracing(json: bool) {
    let default = if json { "info" } else { "warn,rw_gateway=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
