//! Telecommand construction and HMAC-SHA-256 authentication.
//!
//! Wire format: `type(u16 BE) || sequence(u32 BE) || payload || hmac(32)`.
//! The HMAC covers everything but itself, computed with a fixed
//! compile-time shared key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::{CMD_SET_MOTD, CMD_SSTV_TRIGGER, HMAC_TAG_LEN, TELECOMMAND_HMAC_KEY};
use crate::error::EchoflareError;
use crate::telemetry::write_lp_string;

type HmacSha256 = Hmac<Sha256>;

fn mac_over(body: &[u8]) -> Result<[u8; HMAC_TAG_LEN], EchoflareError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&TELECOMMAND_HMAC_KEY)
        .map_err(|e| EchoflareError::AuthError(e.to_string()))?;
    mac.update(body);
    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; HMAC_TAG_LEN];
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Builds an HMAC-authenticated telecommand packet for the given type,
/// sequence number, and payload.
pub fn build_telecommand(
    command_type: u16,
    sequence: u32,
    payload: &[u8],
) -> Result<Vec<u8>, EchoflareError> {
    let mut body = Vec::with_capacity(2 + 4 + payload.len());
    body.extend_from_slice(&command_type.to_be_bytes());
    body.extend_from_slice(&sequence.to_be_bytes());
    body.extend_from_slice(payload);

    let tag = mac_over(&body)?;
    let mut packet = body;
    packet.extend_from_slice(&tag);

    verify_telecommand(&packet).map_err(|e| {
        EchoflareError::Other(format!("internal error: built an unverifiable telecommand: {e}"))
    })?;

    Ok(packet)
}

/// Builds a signed Set-MotD telecommand.
pub fn build_set_motd(sequence: u32, motd: &str) -> Result<Vec<u8>, EchoflareError> {
    build_telecommand(CMD_SET_MOTD, sequence, &write_lp_string(motd)?)
}

/// Builds a signed SSTV-trigger telecommand (no payload).
pub fn build_sstv(sequence: u32) -> Result<Vec<u8>, EchoflareError> {
    build_telecommand(CMD_SSTV_TRIGGER, sequence, &[])
}

/// Verifies a telecommand's HMAC tag in constant time.
///
/// Returns `Ok(())` if the tag is valid, or an [`EchoflareError::AuthError`]
/// describing why verification failed.
pub fn verify_telecommand(packet: &[u8]) -> Result<(), EchoflareError> {
    if packet.len() < 2 + 4 + HMAC_TAG_LEN {
        return Err(EchoflareError::AuthError("Telecommand too short".into()));
    }

    let (body, sig) = packet.split_at(packet.len() - HMAC_TAG_LEN);

    let mut mac = <HmacSha256 as Mac>::new_from_slice(&TELECOMMAND_HMAC_KEY)
        .map_err(|e| EchoflareError::AuthError(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(sig)
        .map_err(|_| EchoflareError::AuthError("Bad HMAC".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_motd_command_verifies() {
        let tc = build_set_motd(7, "all systems nominal").unwrap();
        verify_telecommand(&tc).unwrap();
    }

    #[test]
    fn built_sstv_command_verifies() {
        let tc = build_sstv(1).unwrap();
        verify_telecommand(&tc).unwrap();
    }

    #[test]
    fn tampered_body_fails_verification() {
        let mut tc = build_set_motd(7, "hello").unwrap();
        let idx = 2; // inside the sequence field
        tc[idx] ^= 0xFF;
        assert!(verify_telecommand(&tc).is_err());
    }

    #[test]
    fn tampered_tag_fails_verification() {
        let mut tc = build_sstv(1).unwrap();
        let last = tc.len() - 1;
        tc[last] ^= 0xFF;
        assert!(verify_telecommand(&tc).is_err());
    }

    #[test]
    fn rejects_undersized_packet() {
        assert!(verify_telecommand(&[0u8; 10]).is_err());
    }
}
