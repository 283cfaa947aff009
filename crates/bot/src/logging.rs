use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt as _, registry::LookupSpan, util::SubscriberInitExt as _,
};

/// Output format, picked with `RUST_LOG_MODE` (`json` or anything else for
/// human readable output).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        std::env::var("RUST_LOG_MODE").map_or_else(|_| Self::default(), |mode| Self::parse(&mode))
    }

    fn parse(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }

    pub fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        for<'a> S: Subscriber + LookupSpan<'a>,
    {
        let fmt = tracing_subscriber::fmt::layer().with_thread_names(true);

        match self {
            // One object per line for the log collector.
            Self::Json => Box::new(
                fmt.json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_target(false),
            ),
            Self::Pretty => Box::new(
                fmt.pretty()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` filters, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(LogFormat::from_env().layer())
        .init();
}
