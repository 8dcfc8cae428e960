use crate::prelude::*;
use std::sync::{Mutex, OnceLock};

use cap_std::fs::Dir;
use ringbuffer::{AllocRingBuffer, RingBuffer};
use tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::Layer;

pub const LOG_ENV: &str = "COZY_MARKERS_LOG";
pub const LOG_FILE_NAME: &str = "cozy_markers.log";
const RECENT_EVENTS_CAPACITY: usize = 128;

/// Keeps the most recent warn/error events so that the app can print a session report on exit.
pub struct CozyTracingLayer;
static COZY_RECENT_EVENTS: OnceLock<Mutex<AllocRingBuffer<TracingEvent>>> = OnceLock::new();

impl CozyTracingLayer {
    pub fn install_tracing(data_dir: &Dir) -> Result<tracing_appender::non_blocking::WorkerGuard> {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{fmt, EnvFilter};
        // get the log level
        let filter_layer = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new("info"))
            .into_diagnostic()
            .wrap_err("failed to create log filter")?;
        // create log file in the data dir. This will also serve as a check that the directory is "writeable" by us
        let writer = std::io::BufWriter::new(
            data_dir
                .create(LOG_FILE_NAME)
                .into_diagnostic()
                .wrap_err("failed to create cozy_markers.log file")?,
        );
        let (nb, guard) = tracing_appender::non_blocking(writer);
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(nb);
        if COZY_RECENT_EVENTS
            .set(Mutex::new(AllocRingBuffer::new(RECENT_EVENTS_CAPACITY)))
            .is_err()
        {
            bail!("tracing was already installed");
        }

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(CozyTracingLayer)
            .try_init()
            .into_diagnostic()
            .wrap_err("failed to set global tracing subscriber")?;
        Ok(guard)
    }

    /// warn/error events recorded so far, oldest first.
    pub fn recent_events() -> Vec<String> {
        COZY_RECENT_EVENTS
            .get()
            .and_then(|events| events.lock().ok())
            .map(|events| events.iter().map(TracingEvent::to_string).collect())
            .unwrap_or_default()
    }
}

/// code adapted from miette::set_panic_hook
pub fn install_miette_panic_hooks() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))
    .wrap_err("failed to install miette hook")?;

    #[derive(Debug, thiserror::Error, miette::Diagnostic)]
    #[error("{0}")]
    #[diagnostic(help("set the `RUST_BACKTRACE=1` environment variable to display a backtrace."))]
    struct Panic(String);

    std::panic::set_hook(Box::new(|panic_info| {
        let mut message = "Something went wrong".to_string();
        let payload = panic_info.payload();
        if let Some(msg) = payload.downcast_ref::<&str>() {
            message = msg.to_string();
        }
        if let Some(msg) = payload.downcast_ref::<String>() {
            message = msg.clone();
        }
        let mut report: Result<()> = Err(Panic(message).into());
        if let Some(loc) = panic_info.location() {
            report = report
                .with_context(|| format!("at {}:{}:{}", loc.file(), loc.line(), loc.column()));
        }
        if let Err(err) = report.with_context(|| "Main thread panicked.".to_string()) {
            eprintln!("Error: {:?}", err);
            tracing::error!("crashing: {:?}", &err);
        }
    }));
    Ok(())
}

#[derive(Debug)]
struct TracingEvent {
    level: Level,
    target: String,
    message: String,
    /// everything recorded on the event other than the message
    fields: BTreeMap<String, String>,
}

impl std::fmt::Display for TracingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.level, self.target, self.message)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

struct EventVisitor<'a>(&'a mut TracingEvent);
impl Visit for EventVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => {
                self.0.message = format!("{value:?}");
            }
            name if name.starts_with("log.") => {}
            name => {
                self.0.fields.insert(name.to_string(), format!("{value:?}"));
            }
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.message = value.to_string();
        } else {
            self.record_debug(field, &value)
        }
    }
}

impl TracingEvent {
    fn from_event(event: &Event<'_>) -> Self {
        let mut te = Self {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: Default::default(),
            fields: Default::default(),
        };
        event.record(&mut EventVisitor(&mut te));
        te
    }
}

impl<S: Subscriber> Layer<S> for CozyTracingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        // Level ordering is by verbosity, so WARN and ERROR are the "smaller" ones
        if *event.metadata().level() > Level::WARN {
            return;
        }
        let te = TracingEvent::from_event(event);
        if let Some(Ok(mut events)) = COZY_RECENT_EVENTS.get().map(Mutex::lock) {
            events.push(te);
        }
    }
}
