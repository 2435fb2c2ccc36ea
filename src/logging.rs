//! Tracing setup. `RUST_LOG` wins over the configured level.
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);

    // A second init (tests, repeated app start) is not an error.
    if let Err(e) = Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
    {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            eprintln!("Failed to initialize tracing: {e}");
        }
    }
}
