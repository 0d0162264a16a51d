pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown for failures (or with
/// `-- --nocapture`). The filter is read from `SEQDAG_LOG`, then
/// `RUST_LOG`, and defaults to `info`:
/// `SEQDAG_LOG=seqdag::dag=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("SEQDAG_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("test timed out after 5 seconds")
}
