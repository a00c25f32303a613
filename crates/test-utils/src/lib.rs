//! Fakes and helpers shared by kapo's integration tests.

pub mod builders;
pub mod fake_launcher;
pub mod fake_probe;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a subscriber that writes through the test harness, so kapo's
/// events show up next to the failing test's output only.
///
/// Honours the same `KAPO_LOG` directives as the binary, defaulting to
/// `kapo=debug` so runner and watcher decisions are visible on failure.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(kapo::logging::LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("kapo=debug"));

        // Another harness may have installed one already.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("step did not finish within {TEST_TIMEOUT:?}"),
    }
}
