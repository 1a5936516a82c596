// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup (component I): wires `tracing-subscriber` and
//! `tracing-appender` the way this codebase's daemon binary wires them
//! elsewhere — a `setup_logging` function building non-blocking file
//! appenders plus an `EnvFilter` defaulting to `info`, returning the
//! `WorkerGuard`s the caller must keep alive for the process lifetime.
//!
//! Beyond the generic `tracing` stream, the original system additionally
//! maintained a fixed set of log files under the logs directory. Rather than
//! one subscriber per file, each dedicated file gets its own `fmt::layer`
//! over the same non-blocking machinery, routed by level and by the
//! `instances_events`/`instances_stats` targets the reconciliation loop logs
//! under.

use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// Holds the four non-blocking writer guards alive for the process
/// lifetime; dropping any of them stops flushing that file.
pub struct LoggingGuards {
    _supervisor: tracing_appender::non_blocking::WorkerGuard,
    _supervisor_debug: tracing_appender::non_blocking::WorkerGuard,
    _instances_events: tracing_appender::non_blocking::WorkerGuard,
    _instances_stats: tracing_appender::non_blocking::WorkerGuard,
}

pub fn setup_logging(config: &Config) -> LoggingGuards {
    let (supervisor_writer, supervisor_guard) = appender(&config.logs_dir, "supervisor.log");
    let (debug_writer, debug_guard) = appender(&config.logs_dir, "supervisor_debug.log");
    let (events_writer, events_guard) = appender(&config.logs_dir, "instances_events.log");
    let (stats_writer, stats_guard) = appender(&config.logs_dir, "instances_stats.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // supervisor.log: info-and-above lifecycle messages, excluding the
    // dedicated instance event/stats streams.
    let supervisor_targets = Targets::new()
        .with_target("instances_events", LevelFilter::OFF)
        .with_target("instances_stats", LevelFilter::OFF)
        .with_default(LevelFilter::INFO);

    // supervisor_debug.log: everything at debug-and-above, same exclusions.
    let debug_targets = Targets::new()
        .with_target("instances_events", LevelFilter::OFF)
        .with_target("instances_stats", LevelFilter::OFF)
        .with_default(LevelFilter::DEBUG);

    let events_targets = Targets::new().with_target("instances_events", LevelFilter::TRACE);
    let stats_targets = Targets::new().with_target("instances_stats", LevelFilter::TRACE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(supervisor_writer).with_filter(supervisor_targets))
        .with(fmt::layer().with_writer(debug_writer).with_filter(debug_targets))
        .with(fmt::layer().with_writer(events_writer).with_filter(events_targets))
        .with(fmt::layer().with_writer(stats_writer).with_filter(stats_targets))
        .init();

    LoggingGuards {
        _supervisor: supervisor_guard,
        _supervisor_debug: debug_guard,
        _instances_events: events_guard,
        _instances_stats: stats_guard,
    }
}

fn appender(
    logs_dir: &std::path::Path,
    file_name: &str,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    let file_appender = tracing_appender::rolling::never(logs_dir, file_name);
    tracing_appender::non_blocking(file_appender)
}
