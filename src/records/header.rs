//! # Record Framing
//!
//! Every STDF record starts with the same four bytes:
//!
//! ```text
//! +---------+---------+---------+
//! | REC_LEN | REC_TYP | REC_SUB |
//! | u16     | u8      | u8      |
//! +---------+---------+---------+
//! ```
//!
//! `REC_LEN` counts the body bytes that follow the header, in the stream
//! byte order. `REC_TYP`/`REC_SUB` identify the record kind; the pair is
//! open-ended, so unrecognized combinations are still structurally valid
//! records.
//!
//! The V4 mnemonics (FAR, MIR, PTR, ...) are compile-time perfect-hash
//! tables in both directions: type pair to mnemonic for display, mnemonic to
//! type pair for command-line filters.

use eyre::{eyre, Result};
use phf::phf_map;

use crate::codec::Endianness;
use crate::config::REC_HEADER_SIZE;

/// A REC_TYP/REC_SUB pair identifying a record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordType {
    pub ty: u8,
    pub sub: u8,
}

static MNEMONICS: phf::Map<u16, &'static str> = phf_map! {
    0x000Au16 => "FAR",
    0x0014u16 => "ATR",
    0x010Au16 => "MIR",
    0x0114u16 => "MRR",
    0x011Eu16 => "PCR",
    0x0128u16 => "HBR",
    0x0132u16 => "SBR",
    0x013Cu16 => "PMR",
    0x013Eu16 => "PGR",
    0x0146u16 => "RDR",
    0x0150u16 => "SDR",
    0x020Au16 => "WIR",
    0x0214u16 => "WRR",
    0x021Eu16 => "WCR",
    0x050Au16 => "PIR",
    0x0514u16 => "PRR",
    0x0A1Eu16 => "TSR",
    0x0F0Au16 => "PTR",
    0x0F0Fu16 => "MPR",
    0x0F14u16 => "FTR",
    0x140Au16 => "BPS",
    0x1414u16 => "EPS",
    0x320Au16 => "GDR",
    0x321Eu16 => "DTR",
};

static BY_MNEMONIC: phf::Map<&'static str, RecordType> = phf_map! {
    "FAR" => RecordType::FAR,
    "ATR" => RecordType::ATR,
    "MIR" => RecordType::MIR,
    "MRR" => RecordType::MRR,
    "PCR" => RecordType::PCR,
    "HBR" => RecordType::HBR,
    "SBR" => RecordType::SBR,
    "PMR" => RecordType::PMR,
    "PGR" => RecordType::PGR,
    "RDR" => RecordType::RDR,
    "SDR" => RecordType::SDR,
    "WIR" => RecordType::WIR,
    "WRR" => RecordType::WRR,
    "WCR" => RecordType::WCR,
    "PIR" => RecordType::PIR,
    "PRR" => RecordType::PRR,
    "TSR" => RecordType::TSR,
    "PTR" => RecordType::PTR,
    "MPR" => RecordType::MPR,
    "FTR" => RecordType::FTR,
    "BPS" => RecordType::BPS,
    "EPS" => RecordType::EPS,
    "GDR" => RecordType::GDR,
    "DTR" => RecordType::DTR,
};

impl RecordType {
    pub const FAR: RecordType = RecordType::new(0, 10);
    pub const ATR: RecordType = RecordType::new(0, 20);
    pub const MIR: RecordType = RecordType::new(1, 10);
    pub const MRR: RecordType = RecordType::new(1, 20);
    pub const PCR: RecordType = RecordType::new(1, 30);
    pub const HBR: RecordType = RecordType::new(1, 40);
    pub const SBR: RecordType = RecordType::new(1, 50);
    pub const PMR: RecordType = RecordType::new(1, 60);
    pub const PGR: RecordType = RecordType::new(1, 62);
    pub const RDR: RecordType = RecordType::new(1, 70);
    pub const SDR: RecordType = RecordType::new(1, 80);
    pub const WIR: RecordType = RecordType::new(2, 10);
    pub const WRR: RecordType = RecordType::new(2, 20);
    pub const WCR: RecordType = RecordType::new(2, 30);
    pub const PIR: RecordType = RecordType::new(5, 10);
    pub const PRR: RecordType = RecordType::new(5, 20);
    pub const TSR: RecordType = RecordType::new(10, 30);
    pub const PTR: RecordType = RecordType::new(15, 10);
    pub const MPR: RecordType = RecordType::new(15, 15);
    pub const FTR: RecordType = RecordType::new(15, 20);
    pub const BPS: RecordType = RecordType::new(20, 10);
    pub const EPS: RecordType = RecordType::new(20, 20);
    pub const GDR: RecordType = RecordType::new(50, 10);
    pub const DTR: RecordType = RecordType::new(50, 30);

    pub const fn new(ty: u8, sub: u8) -> Self {
        Self { ty, sub }
    }

    const fn key(self) -> u16 {
        ((self.ty as u16) << 8) | self.sub as u16
    }

    /// The three-letter V4 mnemonic, or `None` for kinds outside V4.
    pub fn mnemonic(self) -> Option<&'static str> {
        MNEMONICS.get(&self.key()).copied()
    }

    /// Looks up a V4 type pair by its mnemonic, case-insensitively.
    pub fn from_mnemonic(name: &str) -> Result<Self> {
        BY_MNEMONIC
            .get(name.to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| eyre!("unknown record mnemonic: {name}"))
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mnemonic() {
            Some(name) => write!(f, "{name} ({}:{})", self.ty, self.sub),
            None => write!(f, "({}:{})", self.ty, self.sub),
        }
    }
}

/// A decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub length: u16,
    pub record_type: RecordType,
}

impl RecordHeader {
    pub const SIZE: usize = REC_HEADER_SIZE;

    pub fn new(length: u16, record_type: RecordType) -> Self {
        Self {
            length,
            record_type,
        }
    }

    /// Decodes the four header bytes in the stream byte order.
    pub fn from_bytes(bytes: [u8; Self::SIZE], endian: Endianness) -> Self {
        let length = match endian {
            Endianness::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
            Endianness::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
        };
        Self {
            length,
            record_type: RecordType::new(bytes[2], bytes[3]),
        }
    }

    pub fn to_bytes(self, endian: Endianness) -> [u8; Self::SIZE] {
        let len = match endian {
            Endianness::Big => self.length.to_be_bytes(),
            Endianness::Little => self.length.to_le_bytes(),
        };
        [len[0], len[1], self.record_type.ty, self.record_type.sub]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_in_both_byte_orders() {
        let header = RecordHeader::new(0x0102, RecordType::PTR);
        assert_eq!(header.to_bytes(Endianness::Big), [0x01, 0x02, 15, 10]);
        assert_eq!(header.to_bytes(Endianness::Little), [0x02, 0x01, 15, 10]);
        for endian in [Endianness::Big, Endianness::Little] {
            let bytes = header.to_bytes(endian);
            assert_eq!(RecordHeader::from_bytes(bytes, endian), header);
        }
    }

    #[test]
    fn v4_kinds_have_mnemonics() {
        assert_eq!(RecordType::FAR.mnemonic(), Some("FAR"));
        assert_eq!(RecordType::GDR.mnemonic(), Some("GDR"));
        assert_eq!(RecordType::new(7, 77).mnemonic(), None);
    }

    #[test]
    fn mnemonic_lookup_is_case_insensitive() {
        assert_eq!(RecordType::from_mnemonic("ptr").unwrap(), RecordType::PTR);
        assert_eq!(RecordType::from_mnemonic("Mir").unwrap(), RecordType::MIR);
        assert!(RecordType::from_mnemonic("XYZ").is_err());
    }

    #[test]
    fn display_includes_type_pair() {
        assert_eq!(RecordType::FAR.to_string(), "FAR (0:10)");
        assert_eq!(RecordType::new(7, 77).to_string(), "(7:77)");
    }

    #[test]
    fn mnemonic_tables_agree() {
        for (name, ty) in BY_MNEMONIC.entries() {
            assert_eq!(ty.mnemonic(), Some(*name));
        }
        assert_eq!(MNEMONICS.len(), BY_MNEMONIC.len());
    }
}
