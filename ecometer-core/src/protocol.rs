// protocol.rs
//
// Wire layouts for the host<->meter serial link. Nothing here is
// self-describing, so field order and endianness must match the host
// exactly.

/// Marker byte opening a request frame and the packed telemetry record.
pub const FRAME_HEADER: u8 = 0xAA;
/// Marker byte closing every frame on the link.
pub const FRAME_TAIL: u8 = 0x55;
/// Marker byte opening a response frame, distinct from the request header.
pub const RESPONSE_MARKER: u8 = 0xBB;
/// Command byte: host asks for the current meter readings.
pub const CMD_READ_METERS: u8 = 0x01;
/// Device id carried by the packed telemetry record.
pub const DEVICE_ID: u8 = 0x01;

pub const REQUEST_LEN: usize = 5;
pub const RESPONSE_LEN: usize = 6;
pub const RECORD_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    BadHeader,
    BadCommand,
    BadTail,
    BadChecksum,
}

/// Host -> device poll: `[0xAA, 0x01, idLow, idHigh, 0x55]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestFrame {
    /// Little-endian id chosen by the host. Accepted but never echoed.
    pub request_id: u16,
}

impl RequestFrame {
    /// Validates a completed receive buffer.
    ///
    /// Only the header and command bytes decide validity; the tail and
    /// the id are accepted unchecked, matching what the host relies on:
    /// a reply comes back exactly when bytes 0 and 1 match.
    pub fn parse(buf: &[u8; REQUEST_LEN]) -> Result<Self, FrameError> {
        if buf[0] != FRAME_HEADER {
            return Err(FrameError::BadHeader);
        }
        if buf[1] != CMD_READ_METERS {
            return Err(FrameError::BadCommand);
        }
        Ok(Self {
            request_id: u16::from_le_bytes([buf[2], buf[3]]),
        })
    }

    /// Builds the 5-byte poll frame (the requester side of the link).
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let id = self.request_id.to_le_bytes();
        [FRAME_HEADER, CMD_READ_METERS, id[0], id[1], FRAME_TAIL]
    }
}

/// Device -> host reply: `[0xBB, elecLow, elecHigh, waterLow, waterHigh, 0x55]`.
///
/// Readings are fixed-point: hundredths of a kWh and hundredths of a
/// litre, little-endian regardless of host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseFrame {
    pub electricity_cwh: u16,
    pub water_cl: u16,
}

impl ResponseFrame {
    pub fn encode(&self) -> [u8; RESPONSE_LEN] {
        let e = self.electricity_cwh.to_le_bytes();
        let w = self.water_cl.to_le_bytes();
        [RESPONSE_MARKER, e[0], e[1], w[0], w[1], FRAME_TAIL]
    }

    /// Decodes a reply (the requester side of the link).
    pub fn parse(buf: &[u8; RESPONSE_LEN]) -> Result<Self, FrameError> {
        if buf[0] != RESPONSE_MARKER {
            return Err(FrameError::BadHeader);
        }
        if buf[RESPONSE_LEN - 1] != FRAME_TAIL {
            return Err(FrameError::BadTail);
        }
        Ok(Self {
            electricity_cwh: u16::from_le_bytes([buf[1], buf[2]]),
            water_cl: u16::from_le_bytes([buf[3], buf[4]]),
        })
    }
}

/// Packed 12-byte telemetry record for line-oriented consumers that
/// want a binary export instead of the ASCII status line.
///
/// Layout: header, device id, power (f32 LE), water (f32 LE),
/// checksum, tail. The checksum is the wrapping byte sum of everything
/// between header and checksum, verified on decode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRecord {
    pub device_id: u8,
    pub power_kwh: f32,
    pub water_l: f32,
}

impl TelemetryRecord {
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = FRAME_HEADER;
        buf[1] = self.device_id;
        buf[2..6].copy_from_slice(&self.power_kwh.to_le_bytes());
        buf[6..10].copy_from_slice(&self.water_l.to_le_bytes());
        buf[10] = checksum(&buf[1..10]);
        buf[11] = FRAME_TAIL;
        buf
    }

    pub fn decode(buf: &[u8; RECORD_LEN]) -> Result<Self, FrameError> {
        if buf[0] != FRAME_HEADER {
            return Err(FrameError::BadHeader);
        }
        if buf[RECORD_LEN - 1] != FRAME_TAIL {
            return Err(FrameError::BadTail);
        }
        if buf[10] != checksum(&buf[1..10]) {
            return Err(FrameError::BadChecksum);
        }
        let mut power = [0u8; 4];
        power.copy_from_slice(&buf[2..6]);
        let mut water = [0u8; 4];
        water.copy_from_slice(&buf[6..10]);
        Ok(Self {
            device_id: buf[1],
            power_kwh: f32::from_le_bytes(power),
            water_l: f32::from_le_bytes(water),
        })
    }
}

fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}
