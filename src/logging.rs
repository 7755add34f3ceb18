//! Log output as GitHub workflow commands
//!
//! Errors and warnings become `::error::` / `::warning::` annotations,
//! debug output `::debug::` (only shown with step debugging enabled),
//! everything else plain lines.

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Escape a workflow command message
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Render one log line for `level`
pub fn annotate(level: Level, message: &str) -> String {
    match level {
        Level::ERROR => format!("::error::{}", escape_data(message)),
        Level::WARN => format!("::warning::{}", escape_data(message)),
        Level::INFO => message.to_string(),
        _ => format!("::debug::{}", escape_data(message)),
    }
}

/// Event formatter producing workflow commands
pub struct ActionsFormat;

impl<S, N> FormatEvent<S, N> for ActionsFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut message), event)?;
        writeln!(writer, "{}", annotate(*event.metadata().level(), &message))
    }
}

/// Filter for the given verbosity: info by default, debug with `-v` or
/// runner debug logging, trace with `-vv`
pub fn filter(verbose: u8, runner_debug: bool) -> EnvFilter {
    let directive = match verbose {
        0 if !runner_debug => "publisher_action=info",
        0 | 1 => "publisher_action=debug",
        _ => "publisher_action=trace",
    };
    EnvFilter::new(directive)
}

/// Install the global subscriber
pub fn init(verbose: u8) {
    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");

    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, runner_debug))
        .event_format(ActionsFormat)
        .with_writer(std::io::stdout)
        .init();
}
