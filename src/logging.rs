/// Log setup. The terminal belongs to the renderer, so everything goes to
/// the configured log file.

use std::fs::File;
use std::sync::{Mutex, Once};

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::LoggingConfig;

static SUBSCRIBER_INIT: Once = Once::new();

/// Install the global subscriber once. `RUST_LOG` overrides the configured
/// filter. Fails only if the log file cannot be created.
pub fn setup_logging(cfg: &LoggingConfig) -> std::io::Result<()> {
    let mut result = Ok(());
    SUBSCRIBER_INIT.call_once(|| {
        let file = match File::create(&cfg.file) {
            Ok(file) => file,
            Err(e) => {
                result = Err(e);
                return;
            }
        };

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&cfg.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = FmtSubscriber::builder()
            .with_target(true)
            .with_ansi(false)
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Logging already initialised: {e}");
        }
    });
    result
}
