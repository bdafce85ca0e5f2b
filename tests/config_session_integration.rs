//! Integration tests for config-driven sessions.
//!
//! A config file is parsed, turned into session options and used to open a
//! panel on the in-memory transport, the same path the CLI takes with
//! `--dry-run`.

use std::sync::Arc;

use ajazz_deck::{DeckDevice, HidTransport, MockTransport};
use ajazz_driver::DriverConfig;
use ajazz_transport::FrameHeader;

fn open_with(toml_src: &str) -> (Arc<MockTransport>, DeckDevice) {
    let config: DriverConfig = toml::from_str(toml_src).unwrap();
    let mock = Arc::new(MockTransport::new());
    let transport: Arc<dyn HidTransport> = mock.clone();
    let device = DeckDevice::open(transport, config.deck_options()).unwrap();
    (mock, device)
}

#[test]
fn report_id_mode_from_config_prefixes_reports() {
    let (mock, _device) = open_with(
        r#"
[transport]
report_mode = "report-id"
"#,
    );
    let writes = mock.writes();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|w| w.len() == 513 && w[0] == 0x00));
    assert_eq!(FrameHeader::parse(&writes[0][1..]).unwrap().opcode_name(), "STOP");
}

#[test]
fn plain_mode_from_config_sends_bare_reports() {
    let (mock, _device) = open_with(
        r#"
[transport]
report_mode = "plain"
"#,
    );
    assert!(mock.writes().iter().all(|w| w.len() == 512));
}

#[test]
fn retry_attempts_from_config_bound_open() {
    let config: DriverConfig = toml::from_str(
        r#"
[transport]
report_mode = "plain"
retry_attempts = 1
"#,
    )
    .unwrap();
    let mock = Arc::new(MockTransport::new());
    mock.fail_writes_at(&[0]);
    let transport: Arc<dyn HidTransport> = mock.clone();
    assert!(DeckDevice::open(transport, config.deck_options()).is_err());
    assert_eq!(mock.write_attempts(), 1);
}

#[test]
fn configured_model_sets_geometry() {
    let (_mock, device) = open_with(
        r#"
[device]
model = "akp153"
"#,
    );
    assert_eq!(device.keys(), 18);
    assert_eq!(device.pixels(), 85);
    assert_eq!(device.logo_size(), (854, 480));
}
