//! Logging facilities for Courier.
//!
//! Courier is instrumented with the `tracing` crate. The library never installs
//! a subscriber; applications choose their own:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("courier_net=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal emission.
    pub const SIGNAL: &str = "courier_core::signal";
    /// Activity indicator.
    pub const PROGRESS: &str = "courier_core::progress";
    /// Notification presenters.
    pub const NOTIFICATION: &str = "courier_core::notification";
    /// Request decoration.
    pub const DECORATOR: &str = "courier_net::decorator";
    /// Network transmission.
    pub const TRANSPORT: &str = "courier_net::transport";
    /// Response classification and envelope unwrapping.
    pub const CLASSIFIER: &str = "courier_net::classifier";
    /// Binary response strategies.
    pub const BLOB: &str = "courier_net::blob";
    /// Download side effect.
    pub const DOWNLOAD: &str = "courier_net::download";
    /// Configuration loading.
    pub const CONFIG: &str = "courier_net::config";
}
