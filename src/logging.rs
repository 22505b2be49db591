//! Diagnostic logging. Run progress goes through [crate::printer]; this is for
//! warnings and debugging detail, written to stderr.
use crate::errors::AtomicError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins when set; otherwise
/// warnings only, or everything from this crate at debug when `verbose`.
pub fn init(verbose: bool) -> Result<(), AtomicError> {
    let fallback = if verbose { "atomic_runner=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|err| AtomicError::Config(format!("Invalid log filter: {}", err)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|_| AtomicError::RunnerFailure("logger already initialized".to_string()))
}
