//! Entities stored in block tables.
//!
//! Every type here implements [`TableKey`] so it can live in a
//! [`DedupTable`](crate::DedupTable). Fields holding an [`Index`] refer to
//! another table of the same block.

use serde::{Deserialize, Serialize};

use crate::table::{Index, TableKey};
use crate::types::format::{DnsFlags, QrSigFlags, QueryResponseType, TransportFlags};

/// RR type and class pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    /// RR type
    #[serde(rename = "type")]
    pub rr_type: u16,
    /// RR class
    pub class: u16,
}

impl ClassType {
    /// Create a new class/type pair
    #[must_use]
    pub const fn new(rr_type: u16, class: u16) -> Self {
        Self { rr_type, class }
    }
}

impl TableKey for ClassType {
    type Key = Self;

    fn key(&self) -> &Self {
        self
    }
}

/// Opaque byte string: an IP address, a wire-format name or RDATA
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    /// Raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl TableKey for ByteString {
    type Key = Vec<u8>;

    fn key(&self) -> &Vec<u8> {
        &self.0
    }
}

/// Ordered list of indexes into the question or RR table
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IndexList(pub Vec<Index>);

impl IndexList {
    /// Indexes in list order
    #[must_use]
    pub fn as_slice(&self) -> &[Index] {
        &self.0
    }
}

impl From<&[Index]> for IndexList {
    fn from(list: &[Index]) -> Self {
        Self(list.to_vec())
    }
}

impl TableKey for IndexList {
    type Key = Vec<Index>;

    fn key(&self) -> &Vec<Index> {
        &self.0
    }
}

/// Data shared between many query/response pairs.
///
/// Absent fields were not present in the captured pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryResponseSignature {
    /// Server address (ip-address table)
    pub server_address_index: Option<Index>,
    /// Server port
    pub server_port: Option<u16>,
    /// Transport flags
    pub qr_transport_flags: Option<TransportFlags>,
    /// Role of the capturing host
    pub qr_type: Option<QueryResponseType>,
    /// What the pair contains
    pub qr_sig_flags: Option<QrSigFlags>,
    /// Query opcode
    pub query_opcode: Option<u8>,
    /// Query and response header flags
    pub qr_dns_flags: Option<DnsFlags>,
    /// Query RCODE (extended by OPT if present)
    pub query_rcode: Option<u16>,
    /// First question's class/type (classtype table)
    pub query_classtype_index: Option<Index>,
    /// Query QDCOUNT
    pub query_qdcount: Option<u16>,
    /// Query ANCOUNT
    pub query_ancount: Option<u16>,
    /// Query NSCOUNT
    pub query_nscount: Option<u16>,
    /// Query ARCOUNT
    pub query_arcount: Option<u16>,
    /// Query EDNS version
    pub query_edns_version: Option<u8>,
    /// Query EDNS UDP payload size
    pub query_udp_size: Option<u16>,
    /// Query OPT RDATA (name-rdata table)
    pub query_opt_rdata_index: Option<Index>,
    /// Response RCODE (extended by OPT if present)
    pub response_rcode: Option<u16>,
}

impl TableKey for QueryResponseSignature {
    type Key = Self;

    fn key(&self) -> &Self {
        self
    }
}

/// Question section entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Question {
    /// Owner name (name-rdata table)
    pub name_index: Index,
    /// Class/type (classtype table)
    pub classtype_index: Index,
}

impl TableKey for Question {
    type Key = Self;

    fn key(&self) -> &Self {
        self
    }
}

/// Resource record from an answer, authority or additional section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResourceRecord {
    /// Owner name (name-rdata table)
    pub name_index: Index,
    /// Class/type (classtype table)
    pub classtype_index: Index,
    /// Time to live
    pub ttl: Option<u32>,
    /// RDATA (name-rdata table)
    pub rdata_index: Option<Index>,
}

impl TableKey for ResourceRecord {
    type Key = Self;

    fn key(&self) -> &Self {
        self
    }
}

/// Payload and server side of a message that failed DNS parsing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MalformedMessageData {
    /// Server address (ip-address table)
    pub server_address_index: Option<Index>,
    /// Server port
    pub server_port: Option<u16>,
    /// Transport flags
    pub mm_transport_flags: Option<TransportFlags>,
    /// Raw message bytes
    pub mm_payload: Option<Vec<u8>>,
}

impl TableKey for MalformedMessageData {
    type Key = Self;

    fn key(&self) -> &Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DedupTable;

    #[test]
    fn test_signature_identity_uses_every_field() {
        let mut table = DedupTable::new();
        let base = QueryResponseSignature {
            query_opcode: Some(0),
            query_rcode: Some(0),
            ..Default::default()
        };
        let other = QueryResponseSignature {
            response_rcode: Some(3),
            ..base.clone()
        };
        assert_eq!(table.add(base.clone()), 0);
        assert_eq!(table.add(other), 1);
        assert_eq!(table.add(base), 0);
    }

    #[test]
    fn test_index_list_is_order_sensitive() {
        let mut table = DedupTable::new();
        let a = table.add_by_key(&[0usize, 1][..], || IndexList(vec![0, 1]));
        let b = table.add_by_key(&[1usize, 0][..], || IndexList(vec![1, 0]));
        let c = table.add_by_key(&[0usize, 1][..], || IndexList(vec![0, 1]));
        assert_eq!((a, b, c), (0, 1, 0));
    }

    #[test]
    fn test_rr_ttl_is_part_of_identity() {
        let mut table = DedupTable::new();
        let rr = ResourceRecord {
            name_index: 0,
            classtype_index: 0,
            ttl: Some(300),
            rdata_index: Some(1),
        };
        assert_eq!(table.add(rr), 0);
        assert_eq!(table.add(ResourceRecord { ttl: Some(299), ..rr }), 1);
    }

    #[test]
    fn test_classtype_serde_field_names() {
        let ct = ClassType::new(28, 1);
        let json = serde_json::to_string(&ct).unwrap();
        assert_eq!(json, r#"{"type":28,"class":1}"#);
    }
}
