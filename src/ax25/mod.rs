//! AX.25 2-address UI frame encoding and decoding.
//!
//! Only the subset this toolkit's link needs: unnumbered-information
//! frames with a destination and source address and no repeater path.

use crate::error::EchoflareError;

/// An AX.25 station address: a up-to-6-character callsign plus an SSID
/// (secondary station ID, 0-15).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Address {
    pub callsign: String,
    pub ssid: u8,
}

impl Ax25Address {
    pub fn new(callsign: impl Into<String>, ssid: u8) -> Self {
        Self {
            callsign: callsign.into(),
            ssid,
        }
    }

    /// Encodes this address into its 7-byte on-air form.
    ///
    /// Byte layout: 6 callsign bytes, ASCII value left-shifted by one bit,
    /// space-padded to 6 characters; then one SSID byte `0x60 | (ssid<<1) |
    /// last_bit`, where `last_bit` is 1 on the final address in the header.
    pub fn encode(&self, last: bool) -> Result<[u8; 7], EchoflareError> {
        let callsign = self.callsign.to_ascii_uppercase();
        if callsign.len() > 6 {
            return Err(EchoflareError::FormatError(format!(
                "AX.25 callsign too long: {callsign:?}"
            )));
        }
        if self.ssid > 15 {
            return Err(EchoflareError::FormatError(format!(
                "AX.25 SSID must be 0..=15, got {}",
                self.ssid
            )));
        }

        let mut out = [0u8; 7];
        let padded = format!("{callsign:<6}");
        for (i, b) in padded.bytes().enumerate() {
            out[i] = (b & 0x7F) << 1;
        }
        out[6] = 0x60 | ((self.ssid & 0x0F) << 1) | u8::from(last);
        Ok(out)
    }

    /// Decodes a 7-byte on-air address.
    pub fn decode(addr7: &[u8]) -> Result<Self, EchoflareError> {
        if addr7.len() != 7 {
            return Err(EchoflareError::FormatError(
                "AX.25 address must be 7 bytes".into(),
            ));
        }

        let mut call_bytes = [0u8; 6];
        for i in 0..6 {
            call_bytes[i] = (addr7[i] >> 1) & 0x7F;
        }
        let call = std::str::from_utf8(&call_bytes).map_err(|e| {
            EchoflareError::FormatError(format!("AX.25 callsign not ASCII: {e}"))
        })?;
        let callsign = call.trim_end_matches(' ').to_string();
        let ssid = (addr7[6] >> 1) & 0x0F;
        Ok(Self { callsign, ssid })
    }

    /// Extracts the address-extension ("last address") bit from a 7-byte
    /// on-air address without fully decoding it.
    pub fn is_last(addr7: &[u8]) -> Result<bool, EchoflareError> {
        if addr7.len() != 7 {
            return Err(EchoflareError::FormatError(
                "AX.25 address must be 7 bytes".into(),
            ));
        }
        Ok(addr7[6] & 0x01 != 0)
    }
}

/// A decoded (or to-be-encoded) 2-address AX.25 UI frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Frame {
    pub destination: Ax25Address,
    pub source: Ax25Address,
    pub control: u8,
    pub pid: u8,
    pub payload: Vec<u8>,
}

impl Ax25Frame {
    /// Encodes the frame: destination (not last) + source (last) + control
    /// + pid + payload. Does not add flags or an FCS; see
    /// [`crate::modem`] for on-air framing.
    pub fn encode(&self) -> Result<Vec<u8>, EchoflareError> {
        let mut out = Vec::with_capacity(7 + 7 + 2 + self.payload.len());
        out.extend_from_slice(&self.destination.encode(false)?);
        out.extend_from_slice(&self.source.encode(true)?);
        out.push(self.control);
        out.push(self.pid);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Decodes a raw frame (destination + source + control + pid + payload).
    ///
    /// Only 2-address frames are supported: the source address must carry
    /// the "last address" extension bit.
    pub fn decode(raw: &[u8]) -> Result<Self, EchoflareError> {
        if raw.len() < 7 + 7 + 2 {
            return Err(EchoflareError::FormatError(
                "Frame too short to be AX.25".into(),
            ));
        }

        let dst7 = &raw[0..7];
        let src7 = &raw[7..14];
        if !Ax25Address::is_last(src7)? {
            return Err(EchoflareError::FormatError(
                "Unsupported AX.25 frame: source address not marked last".into(),
            ));
        }

        let control = raw[14];
        let pid = raw[15];
        let payload = raw[16..].to_vec();

        Ok(Self {
            destination: Ax25Address::decode(dst7)?,
            source: Ax25Address::decode(src7)?,
            control,
            pid,
            payload,
        })
    }
}
