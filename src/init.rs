use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::config::BridgeConfig;
use crate::error::LogError;
use crate::layer::LineLayer;
use crate::logger::Logger;

/// Install a global `tracing` subscriber that renders every event through
/// `logger`, configured by `config`.
///
/// **Parameters**
/// - `logger`: the [`Logger`] receiving events; its context fields and key
///   names apply to every line.
/// - `config`: [`BridgeConfig`] controlling console echo and metadata fields.
///
/// **Returns**
/// - `Err(LogError::Subscriber)` if a global subscriber is already set.
pub fn init_tracing_with_config(logger: Logger, config: BridgeConfig) -> Result<(), LogError> {
    let layer = LineLayer::with_config(logger, &config);

    // The two subscriber stacks have different types, hence two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Install the bridge with [`BridgeConfig::default`].
///
/// This is the recommended entry point for services that already emit
/// `tracing` events and want them as JSON lines.
pub fn init_tracing(logger: Logger) -> Result<(), LogError> {
    init_tracing_with_config(logger, BridgeConfig::default())
}
