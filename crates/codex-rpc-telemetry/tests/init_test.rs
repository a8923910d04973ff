//! Global subscriber installation. Kept to a single test because the
//! subscriber is process-wide.

use codex_rpc_telemetry::{TelemetryConfig, TelemetryError};

#[test]
fn test_init_once_then_reject() {
    let invalid = TelemetryConfig::builder().service_name("").build().init();
    assert!(matches!(
        invalid,
        Err(TelemetryError::InvalidConfiguration(_))
    ));

    let guard = TelemetryConfig::builder()
        .service_name("init-test")
        .json_logs(false)
        .build()
        .init()
        .expect("first init succeeds");
    assert_eq!(guard.service_name(), "init-test");
    assert!(guard.config().stderr_output);

    let second = TelemetryConfig::default().init();
    assert!(matches!(
        second,
        Err(TelemetryError::InitializationFailed(_))
    ));

    codex_rpc_telemetry::info!("still logging through the first subscriber");
    drop(guard);
}
