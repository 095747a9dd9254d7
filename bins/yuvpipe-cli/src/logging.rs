//! 日志初始化模块.
//!
//! 双输出:
//! - console: 彩色, 输出到 stderr (stdout 不承载任何诊断信息)
//! - file: 无色, 按天滚动, 级别可通过 YUVPIPE_LOG 环境变量覆盖
//!
//! 级别: 0=info, 1=debug, 2+=trace (由 -v/-vv 控制).
//! 日志文件输出到 $cwd/logs/{prefix}.{date}.log, 目录无法创建时只保留 console.

use std::io;
use std::sync::OnceLock;

use chrono::{Datelike, Local, Timelike};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 覆盖文件日志级别的环境变量
const LOG_ENV: &str = "YUVPIPE_LOG";

/// 日志目录
const LOG_DIR: &str = "logs";

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 初始化日志系统
pub fn init(file_prefix: &str, verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let console_layer = fmt::Layer::default()
        .with_writer(io::stderr)
        .with_ansi(true)
        .event_format(ConsoleFormatter)
        .with_filter(EnvFilter::new(level));

    let file_layer = match open_appender(file_prefix) {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            LOG_GUARD.set(guard).ok();
            let file_filter =
                EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
            Some(
                fmt::Layer::default()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(FileFormatter)
                    .with_filter(file_filter),
            )
        }
        Err(e) => {
            eprintln!("警告: 无法创建日志文件, 仅输出到终端: {e}");
            None
        }
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .init();
}

fn open_appender(file_prefix: &str) -> io::Result<RollingFileAppender> {
    std::fs::create_dir_all(LOG_DIR)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build(LOG_DIR)
        .map_err(io::Error::other)
}

/// Console 格式: 彩色, 带时间戳
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write!(
            writer,
            "[{:02}:{:02}:{:02}.{:03}] {}{:5}\x1b[0m > ",
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis(),
            color,
            meta.level(),
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// File 格式: 无色, 日期时间 + 级别 + 来源模块 + 消息
struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        write!(
            writer,
            "[{}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}] {:5} {} > ",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis(),
            meta.level(),
            meta.target(),
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
