// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, ValueEnum};
use linux_kmsg_format::init::kmsg_format::KmsgFormatArgs;
use linux_kmsg_format::kmsg::convert::convert_to_otlp_logs;
use linux_kmsg_format::kmsg::{BootTime, KmsgFormat, RecordSplitter};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::metadata::LevelFilter;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "kmsg-format")]
#[command(bin_name = "kmsg-format")]
#[command(version, about, long_about = None)]
struct Arguments {
    #[arg(value_enum, long, env = "KMSG_FORMAT_LOG_FORMAT", default_value = "text")]
    /// Log format
    log_format: LogFormatArg,

    #[arg(value_enum, long, env = "KMSG_FORMAT_OUTPUT", default_value = "json")]
    /// Output document format, one document per record
    output: OutputArg,

    #[arg(long, env = "KMSG_FORMAT_INPUT")]
    /// Read records from this file instead of stdin
    input: Option<PathBuf>,

    #[arg(long, env = "KMSG_FORMAT_UPTIME_FILE")]
    /// Calibrate the boot time from this file instead of /proc/uptime
    uptime_file: Option<PathBuf>,

    #[command(flatten)]
    kmsg: KmsgFormatArgs,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum OutputArg {
    /// Flat message with priority, timestamp, flags and values
    Json,
    /// OTLP ResourceLogs
    Otlp,
}

#[derive(Debug, Default)]
struct RunStats {
    records: usize,
    unparsable: usize,
}

fn main() -> ExitCode {
    let opt = Arguments::parse();

    let _guard = match setup_logging(&opt.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: failed to setup logging: {}", e);
            return ExitCode::from(1);
        }
    };

    match run(&opt) {
        Ok(stats) => {
            info!(
                records = stats.records,
                unparsable = stats.unparsable,
                "Finished formatting kmsg records."
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = e, "Failed to format kmsg records.");
            ExitCode::from(1)
        }
    }
}

fn run(opt: &Arguments) -> Result<RunStats, BoxError> {
    let mut format = KmsgFormat::new(opt.kmsg.build_config())?;
    if let Some(path) = &opt.uptime_file {
        format = format.with_boot_time(BootTime::calibrate_from(path)?);
    }

    debug!(
        sec = format.boot_time().sec(),
        usec = format.boot_time().usec(),
        no_parse = format.config().no_parse,
        "Starting kmsg format."
    );

    let reader: Box<dyn BufRead> = match &opt.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            format!("failed to open input file: {}: {}", path.display(), e)
        })?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut out = BufWriter::new(io::stdout().lock());
    let mut stats = RunStats::default();

    for record in RecordSplitter::new(reader) {
        let record = record?;
        let (msg, outcome) = format.parse(&record);

        stats.records += 1;
        if !outcome.is_success() {
            stats.unparsable += 1;
        }

        match opt.output {
            OutputArg::Json => serde_json::to_writer(&mut out, &msg)?,
            OutputArg::Otlp => {
                serde_json::to_writer(&mut out, &convert_to_otlp_logs(std::slice::from_ref(&msg)))?
            }
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;

    Ok(stats)
}

fn setup_logging(log_format: &LogFormatArg) -> Result<WorkerGuard, BoxError> {
    LogTracer::init()?;

    // stdout carries the formatted records
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(io::stderr());

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    if *log_format == LogFormatArg::Json {
        let app_name = format!("{}-{}", env!("CARGO_PKG_NAME"), get_version());
        let bunyan_formatting_layer = BunyanFormattingLayer::new(app_name, non_blocking_writer);

        let subscriber = Registry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(bunyan_formatting_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        use std::io::IsTerminal;

        let use_ansi = io::stderr().is_terminal();

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_target(false)
            .with_level(true)
            .with_ansi(use_ansi)
            .compact();

        let subscriber = Registry::default().with(filter).with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(guard)
}

fn get_version() -> String {
    // Set during CI
    let version_build = option_env!("BUILD_SHORT_SHA").unwrap_or("dev");

    format!("{}-{}", env!("CARGO_PKG_VERSION"), version_build)
}
