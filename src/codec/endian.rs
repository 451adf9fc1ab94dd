//! # Byte-Order Selection
//!
//! STDF files declare their byte order in the first body byte of the FAR
//! record. The CPU_TYPE codes are historical processor identifiers:
//!
//! | CPU_TYPE | Processor        | Byte Order |
//! |----------|------------------|------------|
//! | 0        | DEC VAX          | Big        |
//! | 1        | Sun 680xx series | Big        |
//! | 2+       | Everything else  | Little     |
//!
//! Every multi-byte primitive in the file, including the u16 length prefix of
//! each record header, uses the order established here. There is no per-record
//! override.

use crate::config::{CPU_TYPE_SUN, CPU_TYPE_X86};

/// Byte order for all multi-byte values in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Interprets a FAR CPU_TYPE byte. Codes 0 and 1 are the big-endian
    /// VAX and Sun families; every other value means little-endian.
    pub fn from_cpu_type(cpu_type: u8) -> Self {
        if cpu_type <= CPU_TYPE_SUN {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// The canonical CPU_TYPE byte to write for this byte order.
    pub fn cpu_type(self) -> u8 {
        match self {
            Endianness::Big => CPU_TYPE_SUN,
            Endianness::Little => CPU_TYPE_X86,
        }
    }
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Big => write!(f, "big-endian"),
            Endianness::Little => write!(f, "little-endian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_type_zero_and_one_are_big_endian() {
        assert_eq!(Endianness::from_cpu_type(0), Endianness::Big);
        assert_eq!(Endianness::from_cpu_type(1), Endianness::Big);
    }

    #[test]
    fn cpu_type_two_and_above_are_little_endian() {
        assert_eq!(Endianness::from_cpu_type(2), Endianness::Little);
        assert_eq!(Endianness::from_cpu_type(3), Endianness::Little);
        assert_eq!(Endianness::from_cpu_type(255), Endianness::Little);
    }

    #[test]
    fn canonical_cpu_type_round_trips() {
        for endian in [Endianness::Big, Endianness::Little] {
            assert_eq!(Endianness::from_cpu_type(endian.cpu_type()), endian);
        }
    }
}
