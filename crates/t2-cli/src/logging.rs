// crates/t2-cli/src/logging.rs - tracing subscriber setup
//
// Level comes from `--loglevel`; `RUST_LOG` wins when set. `basic` is the
// default and prints bare messages the way a user expects from a CLI.
// `--output=false` silences everything.
//
// The subscriber is installed before argv is parsed and reloaded once the
// options are resolved.

use t2_core::ResolvedOptions;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, reload};

/// Logging settings derived from the resolved options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "basic".to_string(),
            enabled: true,
        }
    }
}

impl LoggingConfig {
    pub fn from_options(options: Option<&ResolvedOptions>) -> Self {
        let Some(options) = options else {
            return Self::default();
        };
        Self {
            level: options.get_str("loglevel").unwrap_or("basic").to_string(),
            enabled: options.get_bool("output").unwrap_or(true),
        }
    }

    /// EnvFilter directive for this config
    pub fn directive(&self) -> &str {
        if !self.enabled {
            return "off";
        }
        match self.level.as_str() {
            "basic" => "info",
            level => level,
        }
    }

    fn is_basic(&self) -> bool {
        self.level == "basic"
    }
}

type FormatLayer = Box<dyn Layer<Registry> + Send + Sync>;
type FormatStack = Layered<reload::Layer<FormatLayer, Registry>, Registry>;
type LoggingStack = Layered<reload::Layer<EnvFilter, FormatStack>, FormatStack>;

/// Handle to the installed subscriber, for switching settings once the
/// options are known
pub struct LoggingHandle {
    format: reload::Handle<FormatLayer, Registry>,
    filter: reload::Handle<EnvFilter, FormatStack>,
}

impl LoggingHandle {
    /// Switch the running subscriber to `config`
    pub fn apply(&self, config: &LoggingConfig) -> Result<(), reload::Error> {
        self.reload(config, std::env::var("RUST_LOG").ok())
    }

    fn reload(&self, config: &LoggingConfig, rust_log: Option<String>) -> Result<(), reload::Error> {
        self.format.reload(format_layer(config))?;
        self.filter.reload(env_filter(config, rust_log))
    }
}

fn env_filter(config: &LoggingConfig, rust_log: Option<String>) -> EnvFilter {
    if !config.enabled {
        return EnvFilter::new("off");
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.directive()))
}

fn format_layer(config: &LoggingConfig) -> FormatLayer {
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    if config.is_basic() {
        layer.without_time().with_level(false).compact().boxed()
    } else {
        layer.boxed()
    }
}

fn build(config: &LoggingConfig, rust_log: Option<String>) -> (LoggingStack, LoggingHandle) {
    let (format, format_handle) = reload::Layer::new(format_layer(config));
    let (filter, filter_handle) = reload::Layer::new(env_filter(config, rust_log));
    let subscriber = tracing_subscriber::registry().with(format).with(filter);
    (
        subscriber,
        LoggingHandle {
            format: format_handle,
            filter: filter_handle,
        },
    )
}

/// Install the global subscriber, writing to stderr
///
/// Returns `None` when a global subscriber already exists.
pub fn init_logging(config: &LoggingConfig) -> Option<LoggingHandle> {
    let (subscriber, handle) = build(config, std::env::var("RUST_LOG").ok());
    subscriber.try_init().ok().map(|()| handle)
}
