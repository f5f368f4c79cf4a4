//! Answer - エンジンの結果構造体をドメイン型に変換したもの
//!
//! answer_packet はワイヤ形式のまま保持します（デコードは扱わない）。

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::record::{RecordClass, RecordType};

/// Response code signalling a name that does not exist.
pub const RCODE_NXDOMAIN: u16 = 3;

/// The result of a successful resolution.
///
/// "Successful" means the engine completed the lookup; the name may still not
/// exist (`rcode` NXDOMAIN, `havedata` false).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Answer {
    pub qname: String,
    pub qtype: RecordType,
    pub qclass: RecordClass,

    /// Raw rdata of each answer record, in engine order.
    pub data: Vec<Vec<u8>>,

    pub canonname: Option<String>,
    pub rcode: u16,

    /// Full answer packet in wire format, possibly empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answer_packet: Vec<u8>,

    pub havedata: bool,
    pub secure: bool,
    pub bogus: bool,
    pub why_bogus: Option<String>,
    pub ttl: u32,
}

impl Answer {
    /// An answer carrying no data for the given question.
    pub fn empty(qname: impl Into<String>, qtype: RecordType, qclass: RecordClass) -> Self {
        Self {
            qname: qname.into(),
            qtype,
            qclass,
            ..Self::default()
        }
    }

    pub fn has_data(&self) -> bool {
        self.havedata && !self.data.is_empty()
    }

    pub fn is_nxdomain(&self) -> bool {
        self.rcode == RCODE_NXDOMAIN
    }

    /// Addresses carried by an A or AAAA answer in the IN class.
    ///
    /// Records whose rdata has the wrong length are skipped.
    pub fn addresses(&self) -> Vec<IpAddr> {
        if self.qclass != RecordClass::IN {
            return Vec::new();
        }
        self.data
            .iter()
            .filter_map(|rdata| match (self.qtype, rdata.len()) {
                (RecordType::A, 4) => {
                    let octets: [u8; 4] = rdata.as_slice().try_into().ok()?;
                    Some(IpAddr::V4(Ipv4Addr::from(octets)))
                }
                (RecordType::AAAA, 16) => {
                    let octets: [u8; 16] = rdata.as_slice().try_into().ok()?;
                    Some(IpAddr::V6(Ipv6Addr::from(octets)))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_has_no_data() {
        let answer = Answer::empty("example.test", RecordType::A, RecordClass::IN);
        assert!(!answer.has_data());
        assert!(!answer.is_nxdomain());
        assert!(answer.addresses().is_empty());
    }

    #[test]
    fn addresses_are_extracted_from_rdata() {
        let mut answer = Answer::empty("example.test", RecordType::A, RecordClass::IN);
        answer.havedata = true;
        answer.data = vec![vec![192, 0, 2, 51], vec![1, 2, 3]];
        assert_eq!(
            answer.addresses(),
            vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 51))]
        );
    }

    #[test]
    fn aaaa_rdata_becomes_ipv6() {
        let mut answer = Answer::empty("example.test", RecordType::AAAA, RecordClass::IN);
        answer.havedata = true;
        answer.data = vec![Ipv6Addr::LOCALHOST.octets().to_vec()];
        assert_eq!(answer.addresses(), vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]);
    }
}
