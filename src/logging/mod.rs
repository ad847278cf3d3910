/*!
 * Logging Module
 * Subscriber setup and HTTP request logging
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use config::LogConfig;

/// Install the global subscriber.
///
/// The returned guards flush the background writers on drop and must be held
/// until the process exits.
pub fn init(config: &LogConfig) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let (console_writer, console_guard) = non_blocking(io::stdout());
    guards.push(console_guard);

    let console_layer = if config.json {
        fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty()
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    let file_layers = config.dir.as_ref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Cannot create log directory {}: {}", dir.display(), e);
            return None;
        }

        let (file_writer, file_guard) = non_blocking(rolling::daily(dir, "app.log"));
        let (error_writer, error_guard) = non_blocking(rolling::daily(dir, "error.log"));
        guards.push(file_guard);
        guards.push(error_guard);

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        Some(file_layer.and_then(error_layer))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layers)
        .init();

    tracing::info!(
        level = %config.level,
        json = config.json,
        file_output = config.dir.is_some(),
        "logging initialized"
    );

    guards
}
