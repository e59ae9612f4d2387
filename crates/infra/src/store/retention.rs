use chrono::Duration;

/// Retention policy for request-dedup records.
///
/// A record older than the window can no longer distinguish a retry from a
/// new command, so the window must comfortably exceed the longest client
/// retry horizon. `KeepForever` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRetention {
    /// Records are never purged.
    KeepForever,
    /// Records older than the window are purged lazily on store access.
    Ttl(Duration),
}

impl Default for RequestRetention {
    fn default() -> Self {
        Self::KeepForever
    }
}
