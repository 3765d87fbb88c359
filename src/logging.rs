//! Tracing setup for the editor binary.
//!
//! Logs always go to stderr so robot-mode JSON on stdout stays parseable.

use std::io::{self, IsTerminal};

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging options taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// JSON lines instead of human text.
    pub robot: bool,
    /// 0 = info, 1 = debug, 2+ = trace.
    pub verbose: u8,
    /// Errors only.
    pub quiet: bool,
    /// Never emit ANSI colors.
    pub no_color: bool,
}

/// Filter used when `RUST_LOG` is unset.
#[must_use]
pub const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "sde=error";
    }
    match verbose {
        0 => "sde=info",
        1 => "sde=debug",
        _ => "sde=trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the verbosity flags. Calling it twice keeps the
/// first subscriber.
///
/// | Mode | TTY | Output |
/// |------|-----|--------|
/// | Robot | any | JSON lines |
/// | Human | yes | colored text with thread names |
/// | Human | no | compact plain text |
pub fn init_logging(options: LogOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbose, options.quiet)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if options.robot {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(io::stderr),
            )
            .try_init()
    } else if io::stderr().is_terminal() && !options.no_color {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_names(options.verbose > 0)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .compact()
                    .with_writer(io::stderr),
            )
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
