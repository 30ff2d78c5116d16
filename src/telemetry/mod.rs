//! TL telemetry record decoding.
//!
//! Fixed-layout, big-endian binary record with a length-prefixed trailing
//! string field.

use crate::constants::TELEMETRY_PACKET_TYPE;
use crate::error::EchoflareError;

/// A decoded TL telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub sequence: u32,
    pub timestamp: i64,
    pub uptime: u32,
    pub boot_count: u32,
    pub restart_reason: u8,
    pub mode: u8,
    pub flags: u8,
    pub battery_voltages_mv: [u16; 3],
    pub battery_currents_ma: [u16; 3],
    pub temperature_c: f64,
    pub motd: String,
}

struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], EchoflareError> {
        let end = self.offset + n;
        if end > self.buf.len() {
            return Err(EchoflareError::FormatError("Truncated payload".into()));
        }
        let chunk = &self.buf[self.offset..end];
        self.offset = end;
        Ok(chunk)
    }

    fn u8(&mut self) -> Result<u8, EchoflareError> {
        Ok(self.take(1)?[0])
    }

    fn u16be(&mut self) -> Result<u16, EchoflareError> {
        let c = self.take(2)?;
        Ok(u16::from_be_bytes([c[0], c[1]]))
    }

    fn i16be(&mut self) -> Result<i16, EchoflareError> {
        let c = self.take(2)?;
        Ok(i16::from_be_bytes([c[0], c[1]]))
    }

    fn u32be(&mut self) -> Result<u32, EchoflareError> {
        let c = self.take(4)?;
        Ok(u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
    }

    fn i64be(&mut self) -> Result<i64, EchoflareError> {
        let c = self.take(8)?;
        let arr: [u8; 8] = c.try_into().unwrap();
        Ok(i64::from_be_bytes(arr))
    }

    /// Reads a length-prefixed string: one length byte, then that many
    /// bytes, decoded as UTF-8 with a Latin-1 fallback for payloads that
    /// don't round-trip cleanly.
    fn lp_string(&mut self) -> Result<String, EchoflareError> {
        let n = self.u8()? as usize;
        let chunk = self.take(n)?;
        match std::str::from_utf8(chunk) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Ok(chunk.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Encodes a string as a length-prefixed UTF-8 byte string (one length
/// byte followed by up to 255 bytes).
pub fn write_lp_string(s: &str) -> Result<Vec<u8>, EchoflareError> {
    let data = s.as_bytes();
    if data.len() > 255 {
        return Err(EchoflareError::FormatError(
            "String too long for length-prefixed encoding".into(),
        ));
    }
    let mut out = Vec::with_capacity(1 + data.len());
    out.push(data.len() as u8);
    out.extend_from_slice(data);
    Ok(out)
}

/// Decodes a TL telemetry payload.
pub fn decode_telemetry(payload: &[u8]) -> Result<Telemetry, EchoflareError> {
    let mut c = Cursor::new(payload);

    let packet_type = c.u16be()?;
    if packet_type != TELEMETRY_PACKET_TYPE {
        return Err(EchoflareError::FormatError(format!(
            "Not a TL telemetry packet (type=0x{packet_type:04x})"
        )));
    }

    let sequence = c.u32be()?;
    let timestamp = c.i64be()?;
    let uptime = c.u32be()?;
    let boot_count = c.u32be()?;

    let restart_reason = c.u8()?;
    let mode = c.u8()?;
    let flags = c.u8()?;

    let mut battery_voltages_mv = [0u16; 3];
    for v in battery_voltages_mv.iter_mut() {
        *v = c.u16be()?;
    }
    let mut battery_currents_ma = [0u16; 3];
    for v in battery_currents_ma.iter_mut() {
        *v = c.u16be()?;
    }

    let temp_raw = c.i16be()?;
    let motd = c.lp_string()?;

    Ok(Telemetry {
        sequence,
        timestamp,
        uptime,
        boot_count,
        restart_reason,
        mode,
        flags,
        battery_voltages_mv,
        battery_currents_ma,
        temperature_c: temp_raw as f64 / 10.0,
        motd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload(motd: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&TELEMETRY_PACKET_TYPE.to_be_bytes());
        buf.extend_from_slice(&42u32.to_be_bytes()); // sequence
        buf.extend_from_slice(&1_700_000_000i64.to_be_bytes()); // timestamp
        buf.extend_from_slice(&12_345u32.to_be_bytes()); // uptime
        buf.extend_from_slice(&3u32.to_be_bytes()); // boot_count
        buf.push(1); // restart_reason
        buf.push(2); // mode
        buf.push(0b0000_0101); // flags
        for v in [3700u16, 3750, 3800] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        for v in [120u16, 130, 140] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        buf.extend_from_slice(&215i16.to_be_bytes()); // 21.5 C
        buf.extend_from_slice(&write_lp_string(motd).unwrap());
        buf
    }

    #[test]
    fn decodes_well_formed_record() {
        let payload = sample_payload("hello from orbit");
        let tl = decode_telemetry(&payload).unwrap();
        assert_eq!(tl.sequence, 42);
        assert_eq!(tl.timestamp, 1_700_000_000);
        assert_eq!(tl.uptime, 12_345);
        assert_eq!(tl.boot_count, 3);
        assert_eq!(tl.restart_reason, 1);
        assert_eq!(tl.mode, 2);
        assert_eq!(tl.flags, 0b0000_0101);
        assert_eq!(tl.battery_voltages_mv, [3700, 3750, 3800]);
        assert_eq!(tl.battery_currents_ma, [120, 130, 140]);
        assert!((tl.temperature_c - 21.5).abs() < 1e-9);
        assert_eq!(tl.motd, "hello from orbit");
    }

    #[test]
    fn rejects_wrong_packet_type() {
        let mut payload = sample_payload("x");
        payload[0] = 0x00;
        payload[1] = 0x00;
        assert!(decode_telemetry(&payload).is_err());
    }

    #[test]
    fn rejects_truncated_payload() {
        let payload = sample_payload("x");
        assert!(decode_telemetry(&payload[..payload.len() - 1]).is_err());
    }

    #[test]
    fn falls_back_to_latin1_on_invalid_utf8() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&TELEMETRY_PACKET_TYPE.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.extend_from_slice(&0i64.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.push(0);
        payload.push(0);
        payload.push(0);
        for _ in 0..6 {
            payload.extend_from_slice(&0u16.to_be_bytes());
        }
        payload.extend_from_slice(&0i16.to_be_bytes());
        // Invalid UTF-8 byte 0xFF as a single-byte motd.
        payload.push(1);
        payload.push(0xFF);

        let tl = decode_telemetry(&payload).unwrap();
        assert_eq!(tl.motd, "\u{FF}");
    }
}
