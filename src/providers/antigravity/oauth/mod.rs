pub mod endpoints;
pub mod ops;

use backon::ExponentialBuilder;
use std::{sync::LazyLock, time::Duration};

/// Backoff for `loadCodeAssist` during login enrichment. Token exchange is never retried.
pub(crate) static PROJECT_DISCOVERY_RETRY: LazyLock<ExponentialBuilder> = LazyLock::new(|| {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(2)
        .with_jitter()
});
