//! Explicit context threaded into every domain client.
//!
//! Holds the collaborators a client needs: the Fetch Port, the clock, the
//! endpoint set and the shared zone repository. Cloning is cheap.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::fetch::{Endpoints, Fetcher};
use crate::zones::{shared_zones, SharedZones};

#[derive(Clone)]
pub struct Context {
    // ---
    pub fetcher: Arc<dyn Fetcher>,
    pub clock: Arc<dyn Clock>,
    pub endpoints: Endpoints,
    pub zones: SharedZones,
}

impl Context {
    pub fn new(fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>, base_url: &str) -> Self {
        // ---
        Context {
            fetcher,
            clock,
            endpoints: Endpoints::new(base_url),
            zones: shared_zones(),
        }
    }

    /// Context on the wall clock.
    pub fn with_system_clock(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self::new(fetcher, Arc::new(SystemClock), base_url)
    }
}
