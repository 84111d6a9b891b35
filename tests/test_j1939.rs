use vtc_rust::vtc_common_rs::packet::core::ByteOrder;
use vtc_rust::vtc_common_rs::packet::types::can_signal::{GLOBAL_ADDRESS, MAX_EXTENDED_ID};
use vtc_rust::vtc_common_rs::packet::types::{CanFrame, J1939Id, MessageSpec, SignalSpec};

#[test]
fn test_identifier_fields_round_trip() {
    for raw in [0x0CF0_0400u32, 0x18EA_00F9, 0x18FE_F100, 0x1CEC_FF3D, 0x0000_0000, MAX_EXTENDED_ID] {
        let id = J1939Id::from_raw(raw).unwrap();
        assert_eq!(id.to_raw(), raw, "0x{:08X}", raw);
    }
}

#[test]
fn test_pgn_rules() {
    // PDU2: group extension is part of the PGN
    let ccvs = J1939Id::from_raw(0x18FE_F100).unwrap();
    assert_eq!(ccvs.pgn(), 65265);
    assert_eq!(ccvs.destination_address(), None);

    // PDU1: destination address is not
    let tp_cm = J1939Id::from_raw(0x1CEC_FF3D).unwrap();
    assert_eq!(tp_cm.pgn(), 0xEC00);
    assert_eq!(tp_cm.destination_address(), Some(GLOBAL_ADDRESS));
    assert!(tp_cm.is_broadcast());
    assert_eq!(tp_cm.priority, 7);
    assert_eq!(tp_cm.source_address, 0x3D);
}

#[test]
fn test_identifier_from_pgn_round_trip() {
    let request = J1939Id::from_pgn(6, 0xEA00, 0xF9, 0x17).unwrap();
    let decoded = J1939Id::from_raw(request.to_raw()).unwrap();
    assert_eq!(decoded, request);
    assert_eq!(decoded.pgn(), 0xEA00);
    assert_eq!(decoded.destination_address(), Some(0x17));
}

#[test]
fn test_eec1_encode_then_decode() {
    let eec1 = MessageSpec::eec1();
    let mut frame = CanFrame::with_id(J1939Id::from_pgn(3, eec1.pgn, 0x00, GLOBAL_ADDRESS).unwrap());

    eec1.signal("engine_speed").unwrap().encode(&mut frame, 1234.5).unwrap();
    eec1.signal("actual_engine_torque").unwrap().encode(&mut frame, 42.0).unwrap();

    assert!(eec1.matches(&frame));
    assert_eq!(frame.id, 0x0CF0_0400);
    assert_eq!(&frame.data[3..5], &9876u16.to_le_bytes());
    assert_eq!(frame.data[2], 167);

    let decoded = eec1.decode_all(&frame).unwrap();
    let lookup = |name: &str| decoded.iter().find(|(n, _)| *n == name).and_then(|(_, v)| *v);
    assert_eq!(lookup("engine_speed"), Some(1234.5));
    assert_eq!(lookup("actual_engine_torque"), Some(42.0));
    // untouched bytes stay "not available"
    assert_eq!(lookup("driver_demand_torque"), None);
    assert_eq!(lookup("source_address"), None);
}

#[test]
fn test_signal_resolution_rounding() {
    let mut frame = CanFrame::new(0x18FE_F100, &[0xFF; 8]).unwrap();
    // wheel-based vehicle speed, 1/256 km/h per bit
    let speed = SignalSpec::new("wheel_speed", 8, 16, 1.0 / 256.0, 0.0);
    let raw = speed.encode(&mut frame, 88.3).unwrap();
    assert_eq!(raw, (88.3f64 * 256.0).round() as u64);
    let decoded = speed.decode(&frame).unwrap();
    assert!((decoded - 88.3).abs() <= 0.5 / 256.0);
}

#[test]
fn test_motorola_signal_next_to_intel_signal() {
    let mut frame = CanFrame::new(0x100, &[0u8; 8]).unwrap();
    let intel = SignalSpec::new("intel", 0, 12, 1.0, 0.0);
    let motorola = SignalSpec::new("motorola", 16, 12, 1.0, 0.0).with_order(ByteOrder::BigEndian);

    intel.encode(&mut frame, 0x123 as f64).unwrap();
    motorola.encode(&mut frame, 0x456 as f64).unwrap();

    assert_eq!(&frame.data[..4], &[0x23, 0x01, 0x45, 0x60]);
    assert_eq!(intel.decode(&frame).unwrap(), 0x123 as f64);
    assert_eq!(motorola.decode(&frame).unwrap(), 0x456 as f64);
}
