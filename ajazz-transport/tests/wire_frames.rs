//! Wire-level tests for the serialized command channel.
//!
//! Everything runs against `MockTransport`; no panel required.

use std::sync::Arc;
use std::thread;

use ajazz_transport::protocol::{logo, REPORT_SIZE};
use ajazz_transport::{
    BatchHeader, ClearSlot, FlowControlTransport, FrameHeader, HidTransport, LogoHeader,
    MockTransport, ReportMode, RetryPolicy, SetLight, Stop,
};

fn channel(mode: ReportMode) -> (Arc<MockTransport>, FlowControlTransport) {
    let mock = Arc::new(MockTransport::new());
    let inner: Arc<dyn HidTransport> = mock.clone();
    (mock, FlowControlTransport::new(inner, mode, RetryPolicy::default()))
}

/// Strip the report-ID byte so assertions can use frame offsets
fn unprefixed(writes: &[Vec<u8>]) -> Vec<&[u8]> {
    writes.iter().map(|w| &w[1..]).collect()
}

#[test]
fn report_id_mode_prefixes_every_window() {
    let (mock, flow) = channel(ReportMode::ReportId);
    let payload = vec![0xEEu8; 3 * REPORT_SIZE + 7];
    flow.send_with_payload(&BatchHeader::for_key(0, payload.len()).unwrap(), &payload)
        .unwrap();

    let writes = mock.writes();
    assert_eq!(writes.len(), 1 + 4);
    assert!(writes.iter().all(|w| w.len() == REPORT_SIZE + 1 && w[0] == 0));

    let reports = unprefixed(&writes);
    let header = FrameHeader::parse(reports[0]).unwrap();
    assert_eq!(header.opcode_name(), "BATCH");
    assert_eq!(header.payload_len() as usize, payload.len());
    assert_eq!(header.batch_target(), 0x0d);

    // Tail of the last window is zero-filled
    assert!(reports[4][..7].iter().all(|&b| b == 0xEE));
    assert!(reports[4][7..].iter().all(|&b| b == 0));
}

#[test]
fn logo_upload_sends_header_then_full_payload() {
    let (mock, flow) = channel(ReportMode::Plain);
    let rgb = vec![0x10u8; logo::PAYLOAD_LEN];
    flow.send_with_payload(&LogoHeader::new(rgb.len()).unwrap(), &rgb).unwrap();

    let writes = mock.writes();
    assert_eq!(writes.len(), 1 + logo::PAYLOAD_LEN.div_ceil(REPORT_SIZE));
    assert_eq!(
        &writes[0][..16],
        &[0x43, 0x52, 0x54, 0x00, 0x00, 0x4c, 0x4f, 0x47, 0x00, 0x12, 0xc3, 0xc0, 0x01, 0x00, 0x00, 0x00]
    );
}

#[test]
fn concurrent_uploads_do_not_interleave() {
    let (mock, flow) = channel(ReportMode::Plain);
    let flow = Arc::new(flow);

    let handles: Vec<_> = (0..4u8)
        .map(|key| {
            let flow = Arc::clone(&flow);
            thread::spawn(move || {
                let payload = vec![0xA0 + key; 2 * REPORT_SIZE];
                for _ in 0..5 {
                    flow.send_with_payload(&BatchHeader::for_key(key, payload.len()).unwrap(), &payload)
                        .unwrap();
                    flow.send(&SetLight::new(key * 10)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every BAT header must be followed by exactly its own two data windows
    let writes = mock.writes();
    let mut i = 0;
    while i < writes.len() {
        let header = FrameHeader::parse(&writes[i]).expect("data window outside a transfer");
        if header.opcode_name() == "BATCH" {
            let fill = writes[i + 1][0];
            assert!((0xA0..0xA4).contains(&fill));
            assert!(writes[i + 1].iter().all(|&b| b == fill));
            assert!(writes[i + 2].iter().all(|&b| b == fill));
            i += 3;
        } else {
            i += 1;
        }
    }
    assert_eq!(writes.len(), 4 * 5 * 4);
}

#[test]
fn open_sequence_frames_are_single_reports() {
    let (mock, flow) = channel(ReportMode::Plain);
    flow.send_retry("stop", &Stop).unwrap();
    flow.send_retry("light", &SetLight::new(100)).unwrap();
    flow.send_retry("clear", &ClearSlot::all()).unwrap();

    let names: Vec<_> = mock
        .writes()
        .iter()
        .map(|w| FrameHeader::parse(w).unwrap().opcode_name())
        .collect();
    assert_eq!(names, vec!["STOP", "LIGHT", "CLEAR"]);
}

#[test]
fn closed_transport_rejects_writes() {
    let (mock, flow) = channel(ReportMode::Plain);
    flow.close().unwrap();
    assert!(mock.is_closed());
    assert!(flow.send(&Stop).is_err());
}
