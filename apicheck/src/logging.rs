use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INITIALIZE_LOGGING: Once = Once::new();

/// Installs a `RUST_LOG` driven subscriber that writes through the test
/// harness capture. Later calls do nothing.
pub fn init() {
    INITIALIZE_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        // another subscriber may already be installed by the embedding binary
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
