use std::time::SystemTime;

/// Modification time as a number of seconds that have elapsed since
/// January 1, 1970 (midnight UTC/GMT), not counting leap seconds.
///
/// Tar stores whole seconds, so finer-grained sources are truncated
/// towards the epoch. It can be converted from [`SystemTime`] and
/// (with the `chrono` feature) [`chrono::DateTime`] using [`TryInto`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Returns the timestamp corresponding to “now”.
    ///
    /// A system clock set before the epoch yields the epoch itself.
    pub fn now() -> Self {
        SystemTime::now().try_into().unwrap_or_default()
    }

    /// Milliseconds since the epoch, truncated to whole seconds.
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis / 1000)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

/// A point in time that tar cannot store.
#[derive(thiserror::Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimestampError {
    #[error("timestamp is before the unix epoch")]
    Underflow,
}

impl From<u64> for Timestamp {
    fn from(t: u64) -> Timestamp {
        Timestamp(t)
    }
}

impl From<u32> for Timestamp {
    fn from(t: u32) -> Timestamp {
        Timestamp(t.into())
    }
}

impl From<Timestamp> for u64 {
    fn from(t: Timestamp) -> u64 {
        t.0
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = TimestampError;

    fn try_from(st: SystemTime) -> Result<Timestamp, Self::Error> {
        st.duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| TimestampError::Underflow)
            .map(|t| Timestamp(t.as_secs()))
    }
}

#[cfg(feature = "chrono")]
impl<TZ: chrono::TimeZone> TryFrom<chrono::DateTime<TZ>> for Timestamp {
    type Error = TimestampError;

    fn try_from(dt: chrono::DateTime<TZ>) -> Result<Timestamp, Self::Error> {
        let t = dt.with_timezone(&chrono::Utc).timestamp();
        u64::try_from(t)
            .map(Timestamp)
            .map_err(|_| TimestampError::Underflow)
    }
}
