//! Structured logging to a JSON-lines file.
//!
//! Stdout carries the bumped version and nothing else, and stderr is kept
//! for user-facing errors, so logs only ever go to a file. If no log file
//! can be opened, logging is discarded.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "PYBUMP_LOG_PATH";
const ENV_LOG_DIR: &str = "PYBUMP_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Where log lines should be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

impl LogTarget {
    /// Resolve the target from the environment, the configured directory and
    /// platform defaults, in that order.
    pub fn resolve(service: &str, config_dir: Option<&Path>) -> Result<Self, String> {
        Self::resolve_with(
            service,
            std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
            std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
            config_dir.map(Path::to_path_buf),
        )
    }

    fn resolve_with(
        service: &str,
        path_override: Option<PathBuf>,
        dir_override: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self, String> {
        if let Some(path) = path_override {
            return Self::from_path(&path);
        }

        let file_name = format!("{service}{LOG_FILE_SUFFIX}");
        let dir = dir_override
            .or(config_dir)
            .or_else(|| {
                directories::ProjectDirs::from("", "", service)
                    .map(|dirs| dirs.data_local_dir().join("logs"))
            })
            .ok_or_else(|| "no log directory available".to_string())?;

        let target = Self { dir, file_name };
        target.ensure_writable()?;
        Ok(target)
    }

    fn from_path(path: &Path) -> Result<Self, String> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| format!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?
            .to_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let target = Self { dir, file_name };
        target.ensure_writable()?;
        Ok(target)
    }

    fn ensure_writable(&self) -> Result<(), String> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("cannot create {}: {e}", self.dir.display()))?;
        let path = self.path();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("cannot open {}: {e}", path.display()))?;
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Keeps the background log writer alive; drop it last to flush.
pub struct ObservabilityGuard {
    _log_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// Log lines go to a daily-rolled file under the resolved [`LogTarget`];
/// when none is usable they are discarded.
pub fn init_observability(log_dir: Option<&Path>, filter: EnvFilter) -> ObservabilityGuard {
    let service = env!("CARGO_PKG_NAME");
    let (writer, guard) = match LogTarget::resolve(service, log_dir) {
        Ok(target) => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(
                &target.dir,
                &target.file_name,
            ))
        }
        Err(_) => tracing_appender::non_blocking(std::io::sink()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(JsonLines::new(writer))
        .init();

    ObservabilityGuard { _log_guard: guard }
}

/// Build an `EnvFilter` from CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > `RUST_LOG` > `default_level`.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
        (false, 1) => EnvFilter::new("debug"),
        (false, _) => EnvFilter::new("trace"),
    }
}

/// Writes each event as one JSON object per line, with the fields of every
/// enclosing span merged in.
struct JsonLines {
    writer: NonBlocking,
}

impl JsonLines {
    const fn new(writer: NonBlocking) -> Self {
        Self { writer }
    }
}

/// Fields recorded on a span, stored in its extensions.
struct SpanFields(Map<String, Value>);

impl<S> Layer<S> for JsonLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = FieldMap::default();
        attrs.record(&mut fields);
        span.extensions_mut().insert(SpanFields(fields.0));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = FieldMap::default();
        values.record(&mut fields);
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(existing) => existing.0.extend(fields.0),
            None => extensions.insert(SpanFields(fields.0)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut line = Map::new();
        line.insert("timestamp".into(), Value::String(rfc3339_now()));
        line.insert(
            "level".into(),
            Value::String(meta.level().as_str().to_ascii_lowercase()),
        );
        line.insert("target".into(), Value::String(meta.target().to_string()));

        for span in ctx.event_scope(event).into_iter().flat_map(|s| s.from_root()) {
            if let Some(fields) = span.extensions().get::<SpanFields>() {
                line.extend(fields.0.clone());
            }
        }

        let mut fields = FieldMap::default();
        event.record(&mut fields);
        line.extend(fields.0);

        let mut out = self.writer.make_writer();
        if serde_json::to_writer(&mut out, &Value::Object(line)).is_ok() {
            let _ = out.write_all(b"\n");
        }
    }
}

#[derive(Default)]
struct FieldMap(Map<String, Value>);

impl FieldMap {
    fn put(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldMap {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
fn rfc3339_now() -> String {
    let since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = since_epoch.as_secs();
    let (year, month, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        rem / 3600,
        rem % 3600 / 60,
        rem % 60,
        since_epoch.subsec_millis()
    )
}

/// Gregorian date for a count of days since 1970-01-01 (Hinnant's algorithm,
/// restricted to dates on or after the epoch).
const fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
