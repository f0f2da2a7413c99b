use std::fs;

use price_audit::logging::{self, LOG_FILE_NAME};
use tracing_subscriber::EnvFilter;

// Installs the global subscriber, so it lives alone in this test binary.
#[test]
fn test_init_writes_log_file() {
    let dir = std::env::temp_dir().join(format!("price-audit-logs-{}", uuid::Uuid::new_v4()));

    let guard = logging::init_with_filter(&dir, EnvFilter::new("info")).unwrap();
    tracing::info!("Starting API data validation workflow.");
    drop(guard);

    let contents = fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap();
    assert!(contents.contains("Starting API data validation workflow."));
    assert!(contents.contains("INFO"));

    // a second install in the same process is refused
    assert!(logging::init_with_filter(&dir, EnvFilter::new("info")).is_err());

    fs::remove_dir_all(&dir).unwrap();
}
