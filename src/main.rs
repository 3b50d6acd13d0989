//! camclip CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use camclip::cli::{
    app::{default_output_path, load_merged_config, run_devices, run_record, EXIT_ERROR,
        EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    RecordOptions,
};
use camclip::domain::config::AppConfig;
use camclip::domain::device::DevicePosition;
use camclip::domain::duration::Duration;
use camclip::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    match cli.command {
        Commands::Devices { synthetic } => run_devices(synthetic).await,
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Record {
            output,
            duration,
            switch_after,
            position,
            synthetic,
            stabilize,
        } => {
            // Build CLI config from args
            let cli_config = AppConfig {
                output: output.map(|p| p.to_string_lossy().into_owned()),
                duration,
                switch_after,
                position: position.map(|p| DevicePosition::from(p).to_string()),
                synthetic: if synthetic { Some(true) } else { None },
                stabilize: if stabilize { Some(true) } else { None },
            };

            // Merge config
            let config = load_merged_config(cli_config).await;

            // Parse duration
            let duration = match config.duration.as_ref() {
                Some(s) => match s.parse::<Duration>() {
                    Ok(d) => d,
                    Err(e) => {
                        presenter.error(&format!("Invalid duration: {}", e));
                        return ExitCode::from(EXIT_USAGE_ERROR);
                    }
                },
                None => Duration::default_duration(),
            };

            // Parse switch-after
            let switch_after = match config.switch_after.as_ref() {
                Some(s) => match s.parse::<Duration>() {
                    Ok(d) => Some(d),
                    Err(e) => {
                        presenter.error(&format!("Invalid switch-after: {}", e));
                        return ExitCode::from(EXIT_USAGE_ERROR);
                    }
                },
                None => None,
            };

            let options = RecordOptions {
                output: config
                    .output
                    .as_ref()
                    .map(PathBuf::from)
                    .unwrap_or_else(default_output_path),
                duration,
                switch_after,
                position: config.position_or_default(),
                synthetic: config.synthetic_or_default(),
                stabilize: config.stabilize_or_default(),
            };

            run_record(options).await
        }
    }
}
