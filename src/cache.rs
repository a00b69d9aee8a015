//! Cache state shared by every domain client.
//!
//! Each client owns exactly one [`CacheState`]: the cached value and the
//! deadline after which it must not be served without a refresh attempt.
//! Staleness is evaluated lazily against the caller's "now".

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::error::{ItsError, Result};

// ---

/// Weather is valid for this long after its observation time.
pub const WEATHER_VALIDITY_MINUTES: i64 = 20;

/// Traffic is valid for this long after its newest observation.
pub const TRAFFIC_VALIDITY_MINUTES: i64 = 5;

/// Camera listing is valid for this long after the fetch.
pub const CAMERA_LISTING_VALIDITY_MINUTES: i64 = 60;

/// A camera image list is valid for this long after its newest image.
pub const CAMERA_IMAGE_VALIDITY_MINUTES: i64 = 5;

/// Parking zones are valid for this long after the fetch.
pub const PARKING_ZONES_VALIDITY_MINUTES: i64 = 60;

pub fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing was ever fetched successfully.
    Empty,
    /// `now < deadline`.
    Fresh,
    /// `now >= deadline`.
    Stale,
}

/// Cached data plus its validity deadline.
#[derive(Debug, Clone)]
pub struct CacheState<T> {
    // ---
    data: Option<T>,
    deadline: Option<DateTime<Utc>>,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            data: None,
            deadline: None,
        }
    }
}

impl<T> CacheState<T> {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        // ---
        match (&self.data, self.deadline) {
            (None, _) | (_, None) => Freshness::Empty,
            (Some(_), Some(deadline)) if now < deadline => Freshness::Fresh,
            (Some(_), Some(_)) => Freshness::Stale,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.freshness(now) == Freshness::Fresh
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Replace the cached value wholesale.
    pub fn store(&mut self, data: T, deadline: DateTime<Utc>) {
        self.data = Some(data);
        self.deadline = Some(deadline);
    }

    /// Merge into the cached value, starting from `T::default()` when empty.
    pub fn upsert(&mut self, deadline: DateTime<Utc>, merge: impl FnOnce(&mut T))
    where
        T: Default,
    {
        // ---
        let data = self.data.get_or_insert_with(T::default);
        merge(data);
        self.deadline = Some(deadline);
    }
}

impl<T> CacheState<T> {
    /// Like [`CacheState::degrade`] for callers that read the cache in place.
    pub fn recover(&self, domain: &str, err: ItsError) -> Result<()> {
        // ---
        if self.data.is_none() {
            return Err(err);
        }
        warn!(
            "{} refresh failed, keeping cached data (deadline {:?}): {}",
            domain, self.deadline, err
        );
        Ok(())
    }
}

impl<T: Clone> CacheState<T> {
    /// Failure policy after a refresh attempt failed.
    ///
    /// Returns the previous value when one exists and logs the failure;
    /// otherwise the error propagates since there is nothing to serve.
    pub fn degrade(&self, domain: &str, err: ItsError) -> Result<T> {
        // ---
        match &self.data {
            Some(data) => {
                warn!(
                    "{} refresh failed, serving cached data (deadline {:?}): {}",
                    domain, self.deadline, err
                );
                Ok(data.clone())
            }
            None => Err(err),
        }
    }
}
