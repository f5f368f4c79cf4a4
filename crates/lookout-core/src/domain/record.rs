//! RecordType / RecordClass - クエリの種別とクラス
//!
//! エンジンには生の u16 として渡すだけなので、よく使う値に名前を付けた
//! newtype にとどめています（RR データのデコードは扱わない）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResolverError;

/// Resource record type of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType(u16);

impl RecordType {
    pub const A: RecordType = RecordType(1);
    pub const NS: RecordType = RecordType(2);
    pub const CNAME: RecordType = RecordType(5);
    pub const SOA: RecordType = RecordType(6);
    pub const PTR: RecordType = RecordType(12);
    pub const MX: RecordType = RecordType(15);
    pub const TXT: RecordType = RecordType(16);
    pub const AAAA: RecordType = RecordType(28);
    pub const SRV: RecordType = RecordType(33);
    pub const DS: RecordType = RecordType(43);
    pub const DNSKEY: RecordType = RecordType(48);
    pub const ANY: RecordType = RecordType(255);

    const NAMES: &'static [(&'static str, RecordType)] = &[
        ("A", Self::A),
        ("NS", Self::NS),
        ("CNAME", Self::CNAME),
        ("SOA", Self::SOA),
        ("PTR", Self::PTR),
        ("MX", Self::MX),
        ("TXT", Self::TXT),
        ("AAAA", Self::AAAA),
        ("SRV", Self::SRV),
        ("DS", Self::DS),
        ("DNSKEY", Self::DNSKEY),
        ("ANY", Self::ANY),
    ];

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

impl Default for RecordType {
    fn default() -> Self {
        Self::A
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMES.iter().find(|(_, rtype)| rtype == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

impl FromStr for RecordType {
    type Err = ResolverError;

    /// Accepts mnemonics (`AAAA`), the generic `TYPEnnn` form and bare numbers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if let Some((_, rtype)) = Self::NAMES.iter().find(|(name, _)| *name == upper) {
            return Ok(*rtype);
        }
        let digits = upper.strip_prefix("TYPE").unwrap_or(&upper);
        digits
            .parse::<u16>()
            .map(Self)
            .map_err(|_| ResolverError::InvalidArgument("unknown record type"))
    }
}

/// Resource record class of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordClass(u16);

impl RecordClass {
    pub const IN: RecordClass = RecordClass(1);
    pub const CH: RecordClass = RecordClass(3);
    pub const HS: RecordClass = RecordClass(4);
    pub const ANY: RecordClass = RecordClass(255);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

impl Default for RecordClass {
    fn default() -> Self {
        Self::IN
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::IN => f.write_str("IN"),
            Self::CH => f.write_str("CH"),
            Self::HS => f.write_str("HS"),
            Self::ANY => f.write_str("ANY"),
            RecordClass(other) => write!(f, "CLASS{other}"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "IN" => Ok(Self::IN),
            "CH" => Ok(Self::CH),
            "HS" => Ok(Self::HS),
            "ANY" => Ok(Self::ANY),
            other => other
                .strip_prefix("CLASS")
                .unwrap_or(other)
                .parse::<u16>()
                .map(Self)
                .map_err(|_| ResolverError::InvalidArgument("unknown record class")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::mnemonic("A", RecordType::A)]
    #[case::lowercase("aaaa", RecordType::AAAA)]
    #[case::generic("TYPE65", RecordType::new(65))]
    #[case::bare_number("16", RecordType::TXT)]
    fn parses_record_types(#[case] input: &str, #[case] expected: RecordType) {
        assert_eq!(input.parse::<RecordType>().unwrap(), expected);
    }

    #[test]
    fn unknown_mnemonic_is_rejected() {
        assert!(matches!(
            "BOGUS".parse::<RecordType>(),
            Err(ResolverError::InvalidArgument(_))
        ));
    }

    #[test]
    fn display_falls_back_to_generic_form() {
        assert_eq!(RecordType::MX.to_string(), "MX");
        assert_eq!(RecordType::new(65).to_string(), "TYPE65");
        assert_eq!(RecordClass::new(42).to_string(), "CLASS42");
    }

    #[test]
    fn class_defaults_to_internet() {
        assert_eq!(RecordClass::default(), RecordClass::IN);
        assert_eq!("ch".parse::<RecordClass>().unwrap(), RecordClass::CH);
    }
}
