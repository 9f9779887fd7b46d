//! Wire types shared between `relay-server` and `capture-worker`.
//!
//! Nothing here talks to a socket; this crate only defines the shapes that
//! cross the wire and the defaults/clamps that govern them, so both binaries
//! agree on them without copy-pasting constants.

pub mod config;
pub mod envelope;
pub mod event;

pub use config::{FrequencyConfig, ServerConfig};
pub use envelope::{Envelope, MessageType};
pub use event::EventName;

/// Default room every peer auto-joins on connect.
pub const DEFAULT_ROOM: &str = "Threethreeter_room";

/// Default relay listen port.
pub const DEFAULT_PORT: u16 = 5348;

/// Default relay bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default `tracing` filter level, used when neither a config file's
/// top-level `logging.level` nor `--log-level` nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default mDNS service type.
pub const DEFAULT_SERVICE_TYPE: &str = "_http._tcp.local.";

/// Short label prefixed to the host name in the mDNS instance name.
pub const MDNS_INSTANCE_LABEL: &str = "t3t-io";

/// Default health-check / client-count heartbeat cadence, in seconds.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Default OCR request timeout, in seconds. `0` disables the timeout.
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

/// Default screenshot capture cadence, in seconds.
pub const DEFAULT_FREQUENCY_SECS: f64 = 4.0;

/// Inclusive clamp bounds on the capture frequency.
pub const MIN_FREQUENCY_SECS: f64 = 0.1;
pub const MAX_FREQUENCY_SECS: f64 = 60.0;

/// Default age, in seconds, after which a capture file is pruned.
pub const DEFAULT_CLEANUP_AGE_SECS: u64 = 180;

/// Sender label used on every server-originated message/event.
pub const LOCAL_BACKEND: &str = "localBackend";

/// Clamp a requested capture frequency into `[MIN_FREQUENCY_SECS, MAX_FREQUENCY_SECS]`,
/// falling back to [`DEFAULT_FREQUENCY_SECS`] when the value is out of range or not finite.
///
/// Returns `(value, was_clamped)` so callers can log a warning exactly when behavior changed.
pub fn clamp_frequency(requested: f64) -> (f64, bool) {
    if requested.is_finite() && (MIN_FREQUENCY_SECS..=MAX_FREQUENCY_SECS).contains(&requested) {
        (requested, false)
    } else {
        (DEFAULT_FREQUENCY_SECS, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_accepts_in_range() {
        assert_eq!(clamp_frequency(1.5), (1.5, false));
        assert_eq!(clamp_frequency(0.1), (0.1, false));
        assert_eq!(clamp_frequency(60.0), (60.0, false));
    }

    #[test]
    fn clamp_rejects_out_of_range() {
        assert_eq!(clamp_frequency(0.0), (DEFAULT_FREQUENCY_SECS, true));
        assert_eq!(clamp_frequency(61.0), (DEFAULT_FREQUENCY_SECS, true));
        assert_eq!(clamp_frequency(f64::NAN), (DEFAULT_FREQUENCY_SECS, true));
        assert_eq!(clamp_frequency(-1.0), (DEFAULT_FREQUENCY_SECS, true));
    }
}
