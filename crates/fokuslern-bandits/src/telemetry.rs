//! Logging-Shim: `tracing` mit dem Feature `telemetry`, sonst `eprintln!`
//! für Warnungen. Debug- und Info-Meldungen entfallen ohne das Feature.

use std::fmt::Arguments;

pub fn warn(args: Arguments<'_>) {
    #[cfg(feature = "telemetry")]
    tracing::warn!("{}", args);
    #[cfg(not(feature = "telemetry"))]
    eprintln!("warning: {args}");
}

pub fn info(args: Arguments<'_>) {
    #[cfg(feature = "telemetry")]
    tracing::info!("{}", args);
    #[cfg(not(feature = "telemetry"))]
    let _ = args;
}

pub fn debug(args: Arguments<'_>) {
    #[cfg(feature = "telemetry")]
    tracing::debug!("{}", args);
    #[cfg(not(feature = "telemetry"))]
    let _ = args;
}
