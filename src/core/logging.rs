//! env_logger setup for the demo binary

/// Install the global logger at `info` unless `RUST_LOG` says otherwise
///
/// Safe to call more than once; later calls are ignored.
///
/// ```
/// voltrace::core::logging::init();
/// log::info!("renderer ready");
/// ```
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
