//! Literal captured-byte-sequence fixtures shared by `e2e_scenarios.rs`.

pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    let cleaned: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    (0..cleaned.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&cleaned[i..i + 2], 16).unwrap())
        .collect()
}

/// TL telemetry payload: sequence=7, timestamp=1, uptime=500, boot_count=2,
/// restart_reason=0, mode=1, flags=0, batteries all 4000 mV / 100 mA,
/// temperature_c=25.0, motd="DEMO".
pub const TL_DEMO_HEX: &str = "\
544c \
00000007 \
0000000000000001 \
000001f4 \
00000002 \
00 01 00 \
0fa0 0fa0 0fa0 \
0064 0064 0064 \
00fa \
04 44454d4f";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tl_demo_hex_decodes_to_expected_length() {
        let bytes = hex_to_bytes(TL_DEMO_HEX);
        // 2 + 4 + 8 + 4 + 4 + 1 + 1 + 1 + 6 + 6 + 2 + 1 + 4
        assert_eq!(bytes.len(), 44);
    }
}
