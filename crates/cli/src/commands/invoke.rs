use std::fs;
use std::path::Path;

use serde_json::Value;
use threadlink_core::config::{AppConfig, LoadOptions, LogFormat};
use threadlink_server::bootstrap_with_config;
use tracing::Level;

use crate::commands::{CommandResult, CONFIG_EXIT_CODE};

/// Exit code when the pipeline answered with a non-2xx `statusCode`.
pub const REJECTED_EXIT_CODE: u8 = 1;

pub fn run(file: &Path, envelope: bool) -> CommandResult {
    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "input",
                format!("could not read `{}`: {error}", file.display()),
                CONFIG_EXIT_CODE,
            )
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                CONFIG_EXIT_CODE,
            )
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "config_validation",
                error.to_string(),
                CONFIG_EXIT_CODE,
            )
        }
    };
    init_logging(&config);

    runtime.block_on(async {
        let app = match bootstrap_with_config(config).await {
            Ok(app) => app,
            Err(error) => {
                return CommandResult::failure(
                    "invoke",
                    "bootstrap",
                    error.to_string(),
                    CONFIG_EXIT_CODE,
                )
            }
        };

        let response = if envelope {
            match serde_json::from_str::<Value>(&raw) {
                Ok(envelope) => app.gateway.handle_invocation(&envelope).await,
                Err(error) => {
                    return CommandResult::failure(
                        "invoke",
                        "input",
                        format!("envelope file is not valid JSON: {error}"),
                        CONFIG_EXIT_CODE,
                    )
                }
            }
        } else {
            app.gateway.handle_body(&raw).await
        };

        let exit_code = if (200..300).contains(&response.status_code) { 0 } else { REJECTED_EXIT_CODE };
        match serde_json::to_string_pretty(&response) {
            Ok(output) => CommandResult::output(exit_code, output),
            Err(error) => CommandResult::failure("invoke", "serialization", error.to_string(), 1),
        }
    })
}

/// Routes pipeline logs to stderr so stdout stays the JSON response.
///
/// A subscriber installed earlier in the process wins; later calls are no-ops.
fn init_logging(config: &AppConfig) -> bool {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
