//! Log output: `[YYYY-MM-DD HH:MM:SS] message key=value` to stdout and,
//! for monitor runs, appended to the log file.

use std::{
    fs::OpenOptions,
    path::Path,
    sync::Mutex,
};

use {
    anyhow::Context,
    tracing::{Event, Subscriber},
    tracing_subscriber::{
        EnvFilter,
        fmt::{self, FmtContext, FormatEvent, FormatFields, format::Writer, writer::MakeWriterExt},
        layer::SubscriberExt,
        registry::LookupSpan,
        util::SubscriberInitExt,
    },
};

/// Local-time bracketed timestamp followed by the event's fields.
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
pub fn init(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(filter(level));
    let layer = fmt::layer().event_format(LogLineFormat).with_ansi(false);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            registry
                .with(layer.with_writer(std::io::stdout.and(Mutex::new(file))))
                .init();
        },
        None => registry.with(layer.with_writer(std::io::stdout)).init(),
    }
    Ok(())
}

/// Stderr-only subscriber for work done before [`init`], such as loading
/// the config that decides where the log file lives.
pub fn bootstrap(level: &str) -> impl Subscriber + Send + Sync + use<> {
    tracing_subscriber::registry().with(filter(level)).with(
        fmt::layer()
            .event_format(LogLineFormat)
            .with_ansi(false)
            .with_writer(std::io::stderr),
    )
}
