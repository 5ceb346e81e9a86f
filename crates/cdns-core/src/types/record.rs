//! Generic records handed to the exporter by a packet parser.
//!
//! Every field is optional: a parser fills in what it saw and the block
//! decides what to store. Addresses are raw network-order bytes (4 for
//! IPv4, 16 for IPv6); names are wire-format label sequences.

use std::net::IpAddr;

use crate::types::entities::ClassType;
use crate::types::format::{
    AddressEventType, DnsFlags, QrSigFlags, QueryResponseType, ResponseProcessingFlags,
    TransportFlags,
};
use crate::types::timestamp::Timestamp;

/// Raw bytes of an IP address as stored in C-DNS
#[must_use]
pub fn address_bytes(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// One question or resource record of a DNS message section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericResourceRecord {
    /// Owner name
    pub name: Vec<u8>,
    /// Type and class
    pub classtype: ClassType,
    /// TTL (absent for questions)
    pub ttl: Option<u32>,
    /// RDATA (absent for questions)
    pub rdata: Option<Vec<u8>>,
}

impl GenericResourceRecord {
    /// A question section entry
    #[must_use]
    pub fn question(name: impl Into<Vec<u8>>, classtype: ClassType) -> Self {
        Self {
            name: name.into(),
            classtype,
            ttl: None,
            rdata: None,
        }
    }

    /// An answer/authority/additional section entry
    #[must_use]
    pub fn record(
        name: impl Into<Vec<u8>>,
        classtype: ClassType,
        ttl: u32,
        rdata: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            classtype,
            ttl: Some(ttl),
            rdata: Some(rdata.into()),
        }
    }
}

/// A DNS query/response pair, or a lone query or response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericQueryResponse {
    /// When the query (or lone response) was captured
    pub ts: Option<Timestamp>,
    /// Client address
    pub client_ip: Option<Vec<u8>>,
    /// Client port
    pub client_port: Option<u16>,
    /// DNS transaction id
    pub transaction_id: Option<u16>,
    /// Server address
    pub server_ip: Option<Vec<u8>>,
    /// Server port
    pub server_port: Option<u16>,
    /// Transport flags
    pub qr_transport_flags: Option<TransportFlags>,
    /// Role of the capturing host
    pub qr_type: Option<QueryResponseType>,
    /// Which parts of the pair are present
    pub qr_sig_flags: Option<QrSigFlags>,
    /// Query opcode
    pub query_opcode: Option<u8>,
    /// Query and response header flags
    pub qr_dns_flags: Option<DnsFlags>,
    /// Query RCODE
    pub query_rcode: Option<u16>,
    /// First question's type and class
    pub query_classtype: Option<ClassType>,
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
    /// Query OPT RDATA
    pub query_opt_rdata: Option<Vec<u8>>,
    /// Response RCODE
    pub response_rcode: Option<u16>,
    /// Client hop limit / TTL from the IP header
    pub client_hoplimit: Option<u8>,
    /// Ticks between query and response
    pub response_delay: Option<i64>,
    /// First question's name
    pub query_name: Option<Vec<u8>>,
    /// Query size in bytes
    pub query_size: Option<u32>,
    /// Response size in bytes
    pub response_size: Option<u32>,
    /// Bailiwick of the response
    pub bailiwick: Option<Vec<u8>>,
    /// Response processing flags
    pub processing_flags: Option<ResponseProcessingFlags>,
    /// Extra questions of the query
    pub query_questions: Option<Vec<GenericResourceRecord>>,
    /// Query answer section
    pub query_answers: Option<Vec<GenericResourceRecord>>,
    /// Query authority section
    pub query_authority: Option<Vec<GenericResourceRecord>>,
    /// Query additional section
    pub query_additional: Option<Vec<GenericResourceRecord>>,
    /// Extra questions of the response
    pub response_questions: Option<Vec<GenericResourceRecord>>,
    /// Response answer section
    pub response_answers: Option<Vec<GenericResourceRecord>>,
    /// Response authority section
    pub response_authority: Option<Vec<GenericResourceRecord>>,
    /// Response additional section
    pub response_additional: Option<Vec<GenericResourceRecord>>,
}

impl GenericQueryResponse {
    /// Set client address and port
    #[must_use]
    pub fn with_client(mut self, addr: IpAddr, port: u16) -> Self {
        self.client_ip = Some(address_bytes(addr));
        self.client_port = Some(port);
        self
    }

    /// Set server address and port
    #[must_use]
    pub fn with_server(mut self, addr: IpAddr, port: u16) -> Self {
        self.server_ip = Some(address_bytes(addr));
        self.server_port = Some(port);
        self
    }

    /// Set the first question
    #[must_use]
    pub fn with_question(mut self, name: impl Into<Vec<u8>>, classtype: ClassType) -> Self {
        self.query_name = Some(name.into());
        self.query_classtype = Some(classtype);
        self
    }

    /// Returns true if the record holds a query.
    ///
    /// Without signature flags a query is assumed unless only response data
    /// is present.
    #[must_use]
    pub fn has_query(&self) -> bool {
        self.qr_sig_flags.map_or_else(
            || self.query_size.is_some() || self.response_size.is_none(),
            |f| f.contains(QrSigFlags::HAS_QUERY),
        )
    }

    /// Returns true if the record holds a response
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.qr_sig_flags.map_or_else(
            || self.response_size.is_some(),
            |f| f.contains(QrSigFlags::HAS_RESPONSE),
        )
    }
}

/// One occurrence (or a batch) of an address event such as a TCP reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericAddressEventCount {
    /// Event type
    pub ae_type: AddressEventType,
    /// ICMP code, if any
    pub ae_code: Option<u8>,
    /// Transport flags
    pub ae_transport_flags: Option<TransportFlags>,
    /// Address the event concerns
    pub ip_address: Vec<u8>,
    /// Number of occurrences (1 if absent)
    pub count: Option<u64>,
}

impl GenericAddressEventCount {
    /// A single event for the given address
    #[must_use]
    pub fn new(ae_type: AddressEventType, addr: IpAddr) -> Self {
        Self {
            ae_type,
            ae_code: None,
            ae_transport_flags: None,
            ip_address: address_bytes(addr),
            count: None,
        }
    }
}

/// A captured message that could not be parsed as DNS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericMalformedMessage {
    /// Capture time
    pub ts: Option<Timestamp>,
    /// Client address
    pub client_ip: Option<Vec<u8>>,
    /// Client port
    pub client_port: Option<u16>,
    /// Server address
    pub server_ip: Option<Vec<u8>>,
    /// Server port
    pub server_port: Option<u16>,
    /// Transport flags
    pub mm_transport_flags: Option<TransportFlags>,
    /// Raw message bytes
    pub mm_payload: Option<Vec<u8>>,
}
