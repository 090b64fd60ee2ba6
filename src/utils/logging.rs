use std::fmt;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::{DefaultFields, FmtSpan, Format, Full};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{prelude::*, registry::Registry, reload, EnvFilter};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, instrument, span};
}

type Formatter = FmtLayer<Registry, DefaultFields, Format<Full, ISOTimeFormat>, NonBlocking>;
type Stack = Layered<Formatter, EnvFilter, Registry>;

/// Install the global subscriber with warnings going to stderr.
///
/// The returned context must be held in main, dropping it flushes the writers.
/// Call [`GlobalLoggingContext::reconfigure`] once the config is loaded.
pub fn setup() -> Result<GlobalLoggingContext> {
    GlobalLoggingContext::new()
}

/// This needs to be hold in main
pub struct GlobalLoggingContext {
    worker_guards: Vec<WorkerGuard>,
    reload_handle: reload::Handle<Stack, Registry>,
}

impl GlobalLoggingContext {
    /// Basic setup
    pub fn new() -> Result<Self> {
        let (stack, guard) = LoggingConfig::default().to_layer()?;
        let (layer, handle) = reload::Layer::new(stack);
        Registry::default().with(layer).try_init()?;

        Ok(Self {
            worker_guards: vec![guard],
            reload_handle: handle,
        })
    }

    /// Swap in the filter and output described by the `logging` config section
    pub fn reconfigure(&mut self) -> Result<()> {
        let cfg: LoggingConfig = config().get("logging")?;
        let (stack, guard) = cfg.to_layer()?;
        self.reload_handle.reload(stack)?;
        // the previous writer may still hold buffered lines
        self.worker_guards.push(guard);

        Ok(())
    }
}

struct ISOTimeFormat;

impl FormatTime for ISOTimeFormat {
    fn format_time(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
struct LoggingConfig {
    /// comma separated `EnvFilter` directives
    #[serde(default)]
    directives: Option<String>,
    /// env var consulted for extra directives
    #[serde(default)]
    from_env: Option<String>,
    #[serde(default)]
    span_events: Vec<SpanEvent>,
    target: LoggingTarget,
}

#[derive(Copy, Clone, Debug, serde::Deserialize)]
enum SpanEvent {
    New,
    Enter,
    Exit,
    Close,
    Active,
    Full,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
enum LoggingTarget {
    Stdout,
    Stderr,
    File { directory: PathBuf, name: PathBuf },
}

impl LoggingConfig {
    /// Filter and formatter over a fresh writer for `target`
    fn to_layer(&self) -> Result<(Stack, WorkerGuard)> {
        let span_events = self
            .span_events
            .iter()
            .fold(FmtSpan::NONE, |f, e| f | (*e).into());
        let (writer, guard) = self.target.to_writer()?;

        let fmt = FmtLayer::default()
            .with_ansi(self.target.supports_color())
            .with_target(false)
            .with_span_events(span_events)
            .with_timer(ISOTimeFormat)
            .with_writer(writer);

        Ok((self.to_env_filter().and_then(fmt), guard))
    }

    fn to_env_filter(&self) -> EnvFilter {
        let filter = match &self.from_env {
            Some(env) => EnvFilter::from_env(env),
            None => EnvFilter::default(),
        };

        match &self.directives {
            Some(dirs) => dirs
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(d) => Some(d),
                    Err(err) => {
                        eprintln!("ignoring `{}`: {}", s, err);
                        None
                    }
                })
                .fold(filter, |f, dir| f.add_directive(dir)),
            None => filter,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directives: Some("warn".into()),
            from_env: Some("SCHEDSIM_LOG".into()),
            span_events: vec![],
            target: LoggingTarget::Stderr,
        }
    }
}

impl LoggingTarget {
    fn supports_color(&self) -> bool {
        !matches!(self, LoggingTarget::File { .. })
    }

    fn to_writer(&self) -> Result<(NonBlocking, WorkerGuard)> {
        let builder = NonBlockingBuilder::default().lossy(false);
        Ok(match self {
            LoggingTarget::Stdout => builder.finish(std::io::stdout()),
            LoggingTarget::Stderr => builder.finish(std::io::stderr()),
            LoggingTarget::File { directory, name } => {
                std::fs::create_dir_all(directory)?;
                builder.finish(RollingFileAppender::new(Rotation::NEVER, directory, name))
            }
        })
    }
}

impl From<SpanEvent> for FmtSpan {
    fn from(e: SpanEvent) -> Self {
        match e {
            SpanEvent::New => FmtSpan::NEW,
            SpanEvent::Enter => FmtSpan::ENTER,
            SpanEvent::Exit => FmtSpan::EXIT,
            SpanEvent::Close => FmtSpan::CLOSE,
            SpanEvent::Active => FmtSpan::ACTIVE,
            SpanEvent::Full => FmtSpan::FULL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_file_target() {
        let cfg: LoggingConfig = serde_json::from_str(
            r#"{
                "directives": "schedsim=debug",
                "span_events": ["Close"],
                "target": { "type": "file", "directory": "logs", "name": "schedsim.log" }
            }"#,
        )
        .unwrap();

        assert!(!cfg.target.supports_color());
        assert_eq!(cfg.span_events.len(), 1);
        assert!(cfg.from_env.is_none());
    }

    #[test]
    fn bad_directives_are_skipped() {
        let cfg = LoggingConfig {
            directives: Some("info,schedsim=notalevel".into()),
            from_env: None,
            span_events: vec![],
            target: LoggingTarget::Stderr,
        };
        // does not panic, keeps the valid part
        let filter = cfg.to_env_filter();
        assert!(filter.to_string().contains("info"));
    }

    #[test]
    fn default_matches_bundled_config() {
        crate::utils::app_config::init(None).unwrap();
        let bundled: LoggingConfig = config().get("logging").unwrap();
        let default = LoggingConfig::default();

        assert_eq!(bundled.directives, default.directives);
        assert_eq!(bundled.from_env, default.from_env);
        assert!(matches!(bundled.target, LoggingTarget::Stderr));
    }

    #[test]
    fn file_target_builds_a_layer() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = LoggingConfig {
            directives: Some("schedsim=trace".into()),
            from_env: None,
            span_events: vec![SpanEvent::Close],
            target: LoggingTarget::File {
                directory: dir.path().join("logs"),
                name: "schedsim.log".into(),
            },
        };

        let (_stack, _guard) = cfg.to_layer().unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
