/// J1939 identifiers and CAN signal scaling
/// The 29-bit identifier is decomposed with the same bit codec as the frames,
/// and physical signals are raw bit fields scaled by `factor` and `offset`.

use log::trace;

use crate::vtc_common_rs::packet::core::bit_utils::{
    check_bit_range, checked_get_bits, checked_set_bits, get_bits, low_mask, set_bits, sign_extend, BitField,
    ByteOrder, MAX_FIELD_BITS,
};
use crate::vtc_common_rs::packet::core::exceptions::{FrameParseError, FrameResult};

const LE: ByteOrder = ByteOrder::LittleEndian;

/// Largest 29-bit extended identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Largest 18-bit parameter group number
pub const MAX_PGN: u32 = 0x3_FFFF;

/// PDU format values from here on are PDU2 (broadcast)
pub const PDU2_THRESHOLD: u8 = 240;

/// Destination address meaning "all nodes"
pub const GLOBAL_ADDRESS: u8 = 0xFF;

/// Classic CAN payload size
pub const CAN_MAX_DLC: usize = 8;

const SOURCE_ADDRESS: BitField = BitField::new("source_address", 0, 8);
const PDU_SPECIFIC: BitField = BitField::new("pdu_specific", 8, 8);
const PDU_FORMAT: BitField = BitField::new("pdu_format", 16, 8);
const DATA_PAGE: BitField = BitField::new("data_page", 24, 1);
const EXTENDED_DATA_PAGE: BitField = BitField::new("extended_data_page", 25, 1);
const PRIORITY: BitField = BitField::new("priority", 26, 3);

/// Decomposed 29-bit J1939 identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct J1939Id {
    /// 0 (highest) ..= 7
    pub priority: u8,
    pub extended_data_page: bool,
    pub data_page: bool,
    pub pdu_format: u8,
    /// Destination address (PDU1) or group extension (PDU2)
    pub pdu_specific: u8,
    pub source_address: u8,
}

impl J1939Id {
    pub fn from_raw(id: u32) -> FrameResult<Self> {
        if id > MAX_EXTENDED_ID {
            return Err(FrameParseError::field_out_of_range("can_id", id as u64, MAX_EXTENDED_ID as u64).into());
        }
        let bytes = id.to_le_bytes();
        Ok(Self {
            priority: PRIORITY.get(&bytes, LE),
            extended_data_page: EXTENDED_DATA_PAGE.get(&bytes, LE),
            data_page: DATA_PAGE.get(&bytes, LE),
            pdu_format: PDU_FORMAT.get(&bytes, LE),
            pdu_specific: PDU_SPECIFIC.get(&bytes, LE),
            source_address: SOURCE_ADDRESS.get(&bytes, LE),
        })
    }

    /// Build an identifier from a PGN
    ///
    /// For PDU1 groups `destination` becomes the PDU specific byte and the
    /// PGN's low byte must be zero; for PDU2 groups it is ignored and the
    /// PGN's low byte is used.
    pub fn from_pgn(priority: u8, pgn: u32, source_address: u8, destination: u8) -> FrameResult<Self> {
        if priority > 7 {
            return Err(FrameParseError::field_out_of_range("priority", priority as u64, 7).into());
        }
        if pgn > MAX_PGN {
            return Err(FrameParseError::field_out_of_range("pgn", pgn as u64, MAX_PGN as u64).into());
        }
        let bytes = pgn.to_le_bytes();
        let pdu_format: u8 = get_bits(&bytes, 8, 8, LE);
        let pdu_specific = if pdu_format < PDU2_THRESHOLD {
            // PDU1 groups carry no group extension
            if pgn & 0xFF != 0 {
                return Err(FrameParseError::field_out_of_range("pgn", pgn as u64, (pgn & !0xFF) as u64).into());
            }
            destination
        } else {
            get_bits(&bytes, 0, 8, LE)
        };
        Ok(Self {
            priority,
            extended_data_page: get_bits(&bytes, 17, 1, LE),
            data_page: get_bits(&bytes, 16, 1, LE),
            pdu_format,
            pdu_specific,
            source_address,
        })
    }

    pub fn to_raw(&self) -> u32 {
        let mut bytes = [0u8; 4];
        PRIORITY.set(&mut bytes, self.priority, LE);
        EXTENDED_DATA_PAGE.set(&mut bytes, self.extended_data_page, LE);
        DATA_PAGE.set(&mut bytes, self.data_page, LE);
        PDU_FORMAT.set(&mut bytes, self.pdu_format, LE);
        PDU_SPECIFIC.set(&mut bytes, self.pdu_specific, LE);
        SOURCE_ADDRESS.set(&mut bytes, self.source_address, LE);
        u32::from_le_bytes(bytes)
    }

    /// Peer-to-peer group (PDU format below 240)
    pub fn is_pdu1(&self) -> bool {
        self.pdu_format < PDU2_THRESHOLD
    }

    /// Parameter group number; excludes the destination address for PDU1
    pub fn pgn(&self) -> u32 {
        let mut bytes = [0u8; 4];
        set_bits(&mut bytes, self.extended_data_page, 17, 1, LE);
        set_bits(&mut bytes, self.data_page, 16, 1, LE);
        set_bits(&mut bytes, self.pdu_format, 8, 8, LE);
        if !self.is_pdu1() {
            set_bits(&mut bytes, self.pdu_specific, 0, 8, LE);
        }
        u32::from_le_bytes(bytes)
    }

    pub fn destination_address(&self) -> Option<u8> {
        if self.is_pdu1() {
            Some(self.pdu_specific)
        } else {
            None
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.destination_address().map_or(true, |da| da == GLOBAL_ADDRESS)
    }
}

/// Extended-id CAN frame with a classic 8-byte payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanFrame {
    pub id: u32,
    pub dlc: u8,
    pub data: [u8; CAN_MAX_DLC],
}

impl CanFrame {
    pub fn new(id: u32, payload: &[u8]) -> FrameResult<Self> {
        if id > MAX_EXTENDED_ID {
            return Err(FrameParseError::field_out_of_range("can_id", id as u64, MAX_EXTENDED_ID as u64).into());
        }
        if payload.len() > CAN_MAX_DLC {
            return Err(FrameParseError::field_out_of_range("dlc", payload.len() as u64, CAN_MAX_DLC as u64).into());
        }
        let mut data = [0u8; CAN_MAX_DLC];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            dlc: payload.len() as u8,
            data,
        })
    }

    /// Full-length frame with unused bytes set to 0xFF ("not available")
    pub fn with_id(id: J1939Id) -> Self {
        Self {
            id: id.to_raw(),
            dlc: CAN_MAX_DLC as u8,
            data: [0xFF; CAN_MAX_DLC],
        }
    }

    pub fn j1939_id(&self) -> FrameResult<J1939Id> {
        J1939Id::from_raw(self.id)
    }

    /// Bytes covered by the DLC
    pub fn payload(&self) -> &[u8] {
        &self.data[..(self.dlc as usize).min(CAN_MAX_DLC)]
    }

    fn payload_mut(&mut self) -> &mut [u8] {
        let len = (self.dlc as usize).min(CAN_MAX_DLC);
        &mut self.data[..len]
    }
}

/// Scaled signal inside a CAN payload
///
/// `start_bit` and `order` follow the bit codec convention: for
/// LittleEndian the signal's LSB sits at `start_bit` counted from the LSB of
/// byte 0, for BigEndian its MSB sits at `start_bit` counted from the MSB of
/// byte 0. physical = raw * factor + offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSpec {
    pub name: &'static str,
    pub start_bit: usize,
    pub length: usize,
    pub order: ByteOrder,
    pub signed: bool,
    pub factor: f64,
    pub offset: f64,
}

impl SignalSpec {
    /// Unsigned little-endian signal
    pub const fn new(name: &'static str, start_bit: usize, length: usize, factor: f64, offset: f64) -> Self {
        Self {
            name,
            start_bit,
            length,
            order: ByteOrder::LittleEndian,
            signed: false,
            factor,
            offset,
        }
    }

    pub const fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Raw field value as stored
    pub fn raw(&self, frame: &CanFrame) -> FrameResult<u64> {
        Ok(checked_get_bits(frame.payload(), self.start_bit, self.length, self.order)?)
    }

    /// Physical value
    pub fn decode(&self, frame: &CanFrame) -> FrameResult<f64> {
        let raw = self.raw(frame)?;
        Ok(self.raw_to_physical(raw))
    }

    /// Physical value, or None when an unsigned field is all ones
    pub fn decode_available(&self, frame: &CanFrame) -> FrameResult<Option<f64>> {
        let raw = self.raw(frame)?;
        if !self.signed && raw == low_mask(self.length) {
            return Ok(None);
        }
        Ok(Some(self.raw_to_physical(raw)))
    }

    /// Store a physical value, rounded and clamped to the field range
    ///
    /// Returns the raw value written.
    pub fn encode(&self, frame: &mut CanFrame, physical: f64) -> FrameResult<u64> {
        check_bit_range(frame.payload().len(), self.start_bit, self.length)?;
        if self.factor == 0.0 || !self.factor.is_finite() {
            return Err(FrameParseError::UnexpectedFormat(format!(
                "signal '{}' has invalid factor {}",
                self.name, self.factor
            ))
            .into());
        }
        let (min, max) = self.raw_range();
        let scaled = ((physical - self.offset) / self.factor).round();
        // NaN clamps to the bottom of the range
        let clamped = if scaled.is_nan() { min } else { scaled.clamp(min, max) };
        let raw = if self.signed {
            (clamped as i64) as u64 & low_mask(self.length)
        } else {
            clamped as u64
        };
        if clamped != scaled {
            trace!("signal '{}': {} clamped to raw {}", self.name, physical, raw);
        }
        checked_set_bits(frame.payload_mut(), raw, self.start_bit, self.length, self.order)?;
        Ok(raw)
    }

    /// Smallest and largest physical values the field can carry
    pub fn physical_range(&self) -> (f64, f64) {
        let (min, max) = self.raw_range();
        let a = min * self.factor + self.offset;
        let b = max * self.factor + self.offset;
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn raw_range(&self) -> (f64, f64) {
        let length = self.length.clamp(1, MAX_FIELD_BITS);
        if self.signed {
            let half = (1u128 << (length - 1)) as f64;
            (-half, half - 1.0)
        } else {
            (0.0, low_mask(length) as f64)
        }
    }

    fn raw_to_physical(&self, raw: u64) -> f64 {
        let value = if self.signed {
            sign_extend(raw, self.length) as f64
        } else {
            raw as f64
        };
        value * self.factor + self.offset
    }
}

/// Parameter group with its signals
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSpec {
    pub name: &'static str,
    pub pgn: u32,
    pub signals: Vec<SignalSpec>,
}

impl MessageSpec {
    pub fn new(name: &'static str, pgn: u32) -> Self {
        Self {
            name,
            pgn,
            signals: Vec::new(),
        }
    }

    pub fn with_signal(mut self, signal: SignalSpec) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn signal(&self, name: &str) -> Option<&SignalSpec> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Whether the frame carries this parameter group
    pub fn matches(&self, frame: &CanFrame) -> bool {
        frame.j1939_id().map_or(false, |id| id.pgn() == self.pgn)
    }

    /// Decode every signal, None for "not available"
    pub fn decode_all(&self, frame: &CanFrame) -> FrameResult<Vec<(&'static str, Option<f64>)>> {
        self.signals
            .iter()
            .map(|signal| Ok((signal.name, signal.decode_available(frame)?)))
            .collect()
    }

    /// Electronic Engine Controller 1 (PGN 61444)
    pub fn eec1() -> Self {
        Self::new("EEC1", 0xF004)
            .with_signal(SignalSpec::new("engine_torque_mode", 0, 4, 1.0, 0.0))
            .with_signal(SignalSpec::new("driver_demand_torque", 8, 8, 1.0, -125.0))
            .with_signal(SignalSpec::new("actual_engine_torque", 16, 8, 1.0, -125.0))
            .with_signal(SignalSpec::new("engine_speed", 24, 16, 0.125, 0.0))
            .with_signal(SignalSpec::new("source_address", 40, 8, 1.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vtc_common_rs::packet::core::exceptions::{BitRangeError, FrameError};

    #[test]
    fn test_pdu2_identifier() {
        let id = J1939Id::from_raw(0x0CF0_0400).unwrap();
        assert_eq!(id.priority, 3);
        assert_eq!(id.pdu_format, 0xF0);
        assert_eq!(id.pdu_specific, 0x04);
        assert_eq!(id.source_address, 0x00);
        assert!(!id.is_pdu1());
        assert_eq!(id.pgn(), 0xF004);
        assert_eq!(id.destination_address(), None);
        assert!(id.is_broadcast());
        assert_eq!(id.to_raw(), 0x0CF0_0400);
    }

    #[test]
    fn test_pdu1_identifier() {
        let id = J1939Id::from_raw(0x18EA_00F9).unwrap();
        assert_eq!(id.priority, 6);
        assert!(id.is_pdu1());
        assert_eq!(id.pgn(), 0xEA00);
        assert_eq!(id.destination_address(), Some(0x00));
        assert_eq!(id.source_address, 0xF9);
        assert!(!id.is_broadcast());
    }

    #[test]
    fn test_data_pages() {
        let id = J1939Id::from_raw(0x19FE_CA03).unwrap();
        assert!(id.data_page);
        assert!(!id.extended_data_page);
        assert_eq!(id.priority, 6);
        assert_eq!(id.pgn(), 0x1_FECA);
    }

    #[test]
    fn test_from_pgn() {
        let id = J1939Id::from_pgn(6, 0xEA00, 0xF9, 0x00).unwrap();
        assert_eq!(id.to_raw(), 0x18EA_00F9);

        // PDU2: destination ignored
        let id = J1939Id::from_pgn(3, 0xF004, 0x00, 0x21).unwrap();
        assert_eq!(id.to_raw(), 0x0CF0_0400);

        assert!(J1939Id::from_pgn(8, 0xF004, 0, 0).is_err());
        assert!(J1939Id::from_pgn(3, 0x4_0000, 0, 0).is_err());
    }

    #[test]
    fn test_from_pgn_rejects_pdu1_low_byte() {
        assert_eq!(
            J1939Id::from_pgn(6, 0xEA12, 0xF9, 0x00).unwrap_err(),
            FrameError::Parse(FrameParseError::field_out_of_range("pgn", 0xEA12, 0xEA00))
        );
        // data page bits do not make a PDU2 group
        assert!(J1939Id::from_pgn(6, 0x1_EA01, 0xF9, 0x00).is_err());
        assert!(J1939Id::from_pgn(6, 0x1_EA00, 0xF9, 0x00).is_ok());
    }

    #[test]
    fn test_identifier_out_of_range() {
        assert_eq!(
            J1939Id::from_raw(0x2000_0000).unwrap_err(),
            FrameError::Parse(FrameParseError::field_out_of_range("can_id", 0x2000_0000, 0x1FFF_FFFF))
        );
    }

    #[test]
    fn test_can_frame() {
        let frame = CanFrame::new(0x0CF0_0400, &[1, 2, 3]).unwrap();
        assert_eq!(frame.dlc, 3);
        assert_eq!(frame.payload(), &[1, 2, 3]);
        assert!(CanFrame::new(0x100, &[0; 9]).is_err());
    }

    #[test]
    fn test_engine_speed_decode() {
        let frame = CanFrame::new(0x0CF0_0400, &[0xF0, 0x7D, 0x82, 0x20, 0x4E, 0x00, 0xFF, 0xFF]).unwrap();
        let eec1 = MessageSpec::eec1();
        assert!(eec1.matches(&frame));

        let speed = eec1.signal("engine_speed").unwrap();
        assert_eq!(speed.raw(&frame).unwrap(), 20000);
        assert_eq!(speed.decode(&frame).unwrap(), 2500.0);

        let torque = eec1.signal("actual_engine_torque").unwrap();
        assert_eq!(torque.decode(&frame).unwrap(), 5.0);

        let all = eec1.decode_all(&frame).unwrap();
        assert_eq!(all[0], ("engine_torque_mode", Some(0.0)));
        assert_eq!(all[1], ("driver_demand_torque", Some(0.0)));
        assert_eq!(all[4], ("source_address", Some(0.0)));
    }

    #[test]
    fn test_not_available() {
        let frame = CanFrame::with_id(J1939Id::from_raw(0x0CF0_0400).unwrap());
        let speed = MessageSpec::eec1().signal("engine_speed").copied().unwrap();
        assert_eq!(speed.decode_available(&frame).unwrap(), None);
        assert_eq!(speed.decode(&frame).unwrap(), 65535.0 * 0.125);
    }

    #[test]
    fn test_encode_rounds_and_clamps() {
        let mut frame = CanFrame::with_id(J1939Id::default());
        let speed = SignalSpec::new("engine_speed", 24, 16, 0.125, 0.0);

        assert_eq!(speed.encode(&mut frame, 1800.06).unwrap(), 14400);
        assert_eq!(&frame.data[3..5], &[0x40, 0x38]);
        assert_eq!(speed.encode(&mut frame, -10.0).unwrap(), 0);
        assert_eq!(speed.encode(&mut frame, 1.0e9).unwrap(), 0xFFFF);
        // neighbouring bytes untouched
        assert_eq!(frame.data[2], 0xFF);
        assert_eq!(frame.data[5], 0xFF);
    }

    #[test]
    fn test_signed_signal() {
        let mut frame = CanFrame::new(0x100, &[0; 8]).unwrap();
        let pitch = SignalSpec::new("pitch", 5, 12, 0.01, 0.0).signed();

        let raw = pitch.encode(&mut frame, -3.5).unwrap();
        assert_eq!(raw, (-350i64 as u64) & 0xFFF);
        assert!((pitch.decode(&frame).unwrap() + 3.5).abs() < 1e-9);

        assert_eq!(pitch.encode(&mut frame, 100.0).unwrap(), 0x7FF);
        assert_eq!(pitch.encode(&mut frame, -100.0).unwrap(), 0x800);
    }

    #[test]
    fn test_physical_range() {
        let temp = SignalSpec::new("temp", 0, 8, 0.5, -10.0).signed();
        assert_eq!(temp.physical_range(), (-74.0, 53.5));
        let inverted = SignalSpec::new("inv", 0, 8, -1.0, 0.0);
        assert_eq!(inverted.physical_range(), (-255.0, 0.0));
    }

    #[test]
    fn test_big_endian_signal() {
        let mut frame = CanFrame::new(0x100, &[0; 4]).unwrap();
        let level = SignalSpec::new("level", 4, 12, 1.0, 0.0).with_order(ByteOrder::BigEndian);
        level.encode(&mut frame, 0xABC as f64).unwrap();
        assert_eq!(frame.payload(), &[0x0A, 0xBC, 0x00, 0x00]);
        assert_eq!(level.decode(&frame).unwrap(), 0xABC as f64);
    }

    #[test]
    fn test_signal_past_dlc() {
        let frame = CanFrame::new(0x100, &[0; 2]).unwrap();
        let speed = SignalSpec::new("engine_speed", 24, 16, 0.125, 0.0);
        match speed.decode(&frame) {
            Err(FrameError::BitRange(BitRangeError::OutOfBounds { buffer_bits, .. })) => assert_eq!(buffer_bits, 16),
            other => panic!("expected out of bounds, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_factor_rejected() {
        let mut frame = CanFrame::new(0x100, &[0; 8]).unwrap();
        let bad = SignalSpec::new("bad", 0, 8, 0.0, 0.0);
        assert!(matches!(
            bad.encode(&mut frame, 1.0),
            Err(FrameError::Parse(FrameParseError::UnexpectedFormat(_)))
        ));
    }
}
