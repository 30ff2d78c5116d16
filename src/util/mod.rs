//! Bit-level and byte-level helpers shared by the AX.25 codec, the G3RUH
//! modem, and the CLI binaries.

pub mod bits;
pub mod crc;
pub mod hex;

pub use bits::*;
pub use crc::*;
