//! RFC 8618 format enumerations and bit flags.
//!
//! Flag sets are plain integer newtypes: the integer is exactly what gets
//! written to the CBOR stream, so no conversion happens at encode time.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// C-DNS format major version written to the file preamble
pub const MAJOR_FORMAT_VERSION: u8 = 1;

/// C-DNS format minor version written to the file preamble
pub const MINOR_FORMAT_VERSION: u8 = 0;

/// File type identifier opening every C-DNS file
pub const FILE_TYPE_ID: &str = "C-DNS";

macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $name:ident($repr:ty) {
            $($(#[$fmeta:meta])* $flag:ident = $bit:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $repr);

        impl $name {
            $($(#[$fmeta])* pub const $flag: Self = Self(1 << $bit);)+

            /// No flags set
            #[must_use]
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Every defined flag set
            #[must_use]
            pub const fn all() -> Self {
                Self(0 $(| (1 << $bit))+)
            }

            /// Raw bit value
            #[must_use]
            pub const fn bits(self) -> $repr {
                self.0
            }

            /// Returns true if every bit of `other` is set
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Returns true if no bit is set
            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Set every bit of `other`
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Clear every bit of `other`
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

flag_set! {
    /// Query/response signature flags (`qr-sig-flags`)
    QrSigFlags(u8) {
        /// The pair contains a query
        HAS_QUERY = 0;
        /// The pair contains a response
        HAS_RESPONSE = 1;
        /// The query carries an OPT record
        QUERY_HAS_OPT = 2;
        /// The response carries an OPT record
        RESPONSE_HAS_OPT = 3;
        /// The query has no question
        QUERY_HAS_NO_QUESTION = 4;
        /// The response has no question
        RESPONSE_HAS_NO_QUESTION = 5;
    }
}

flag_set! {
    /// Header flags of the query and response (`qr-dns-flags`)
    DnsFlags(u16) {
        /// Query CD bit
        QUERY_CD = 0;
        /// Query AD bit
        QUERY_AD = 1;
        /// Query Z bit
        QUERY_Z = 2;
        /// Query RA bit
        QUERY_RA = 3;
        /// Query RD bit
        QUERY_RD = 4;
        /// Query TC bit
        QUERY_TC = 5;
        /// Query AA bit
        QUERY_AA = 6;
        /// Query EDNS DO bit
        QUERY_DO = 7;
        /// Response CD bit
        RESPONSE_CD = 8;
        /// Response AD bit
        RESPONSE_AD = 9;
        /// Response Z bit
        RESPONSE_Z = 10;
        /// Response RA bit
        RESPONSE_RA = 11;
        /// Response RD bit
        RESPONSE_RD = 12;
        /// Response TC bit
        RESPONSE_TC = 13;
        /// Response AA bit
        RESPONSE_AA = 14;
    }
}

flag_set! {
    /// Response processing flags
    ResponseProcessingFlags(u8) {
        /// Response was served from cache
        FROM_CACHE = 0;
    }
}

flag_set! {
    /// Which `QueryResponse` fields are recorded
    QueryResponseHints(u32) {
        /// `time-offset`
        TIME_OFFSET = 0;
        /// `client-address-index`
        CLIENT_ADDRESS_INDEX = 1;
        /// `client-port`
        CLIENT_PORT = 2;
        /// `transaction-id`
        TRANSACTION_ID = 3;
        /// `qr-signature-index`
        QR_SIGNATURE_INDEX = 4;
        /// `client-hoplimit`
        CLIENT_HOPLIMIT = 5;
        /// `response-delay`
        RESPONSE_DELAY = 6;
        /// `query-name-index`
        QUERY_NAME_INDEX = 7;
        /// `query-size`
        QUERY_SIZE = 8;
        /// `response-size`
        RESPONSE_SIZE = 9;
        /// `response-processing-data`
        RESPONSE_PROCESSING_DATA = 10;
        /// Query question sections
        QUERY_QUESTION_SECTIONS = 11;
        /// Query answer sections
        QUERY_ANSWER_SECTIONS = 12;
        /// Query authority sections
        QUERY_AUTHORITY_SECTIONS = 13;
        /// Query additional sections
        QUERY_ADDITIONAL_SECTIONS = 14;
        /// Response answer sections
        RESPONSE_ANSWER_SECTIONS = 15;
        /// Response authority sections
        RESPONSE_AUTHORITY_SECTIONS = 16;
        /// Response additional sections
        RESPONSE_ADDITIONAL_SECTIONS = 17;
    }
}

flag_set! {
    /// Which `QueryResponseSignature` fields are recorded
    SignatureHints(u32) {
        /// `server-address-index`
        SERVER_ADDRESS = 0;
        /// `server-port`
        SERVER_PORT = 1;
        /// `qr-transport-flags`
        QR_TRANSPORT_FLAGS = 2;
        /// `qr-type`
        QR_TYPE = 3;
        /// `qr-sig-flags`
        QR_SIG_FLAGS = 4;
        /// `query-opcode`
        QUERY_OPCODE = 5;
        /// `qr-dns-flags`
        DNS_FLAGS = 6;
        /// `query-rcode`
        QUERY_RCODE = 7;
        /// `query-classtype-index`
        QUERY_CLASS_TYPE = 8;
        /// `query-qdcount`
        QUERY_QDCOUNT = 9;
        /// `query-ancount`
        QUERY_ANCOUNT = 10;
        /// `query-nscount`
        QUERY_NSCOUNT = 11;
        /// `query-arcount`
        QUERY_ARCOUNT = 12;
        /// `query-edns-version`
        QUERY_EDNS_VERSION = 13;
        /// `query-udp-size`
        QUERY_UDP_SIZE = 14;
        /// `query-opt-rdata-index`
        QUERY_OPT_RDATA = 15;
        /// `response-rcode`
        RESPONSE_RCODE = 16;
    }
}

flag_set! {
    /// Which RR fields are recorded
    RrHints(u8) {
        /// `ttl`
        TTL = 0;
        /// `rdata-index`
        RDATA_INDEX = 1;
    }
}

flag_set! {
    /// Which block-level optional arrays are recorded
    OtherDataHints(u8) {
        /// `malformed-messages`
        MALFORMED_MESSAGES = 0;
        /// `address-event-counts`
        ADDRESS_EVENT_COUNTS = 1;
    }
}

flag_set! {
    /// Storage flags describing how the data was processed
    StorageFlags(u8) {
        /// Data has been anonymized
        ANONYMIZED_DATA = 0;
        /// Data is sampled
        SAMPLED_DATA = 1;
        /// Names have been normalized to lower case
        NORMALIZED_NAMES = 2;
    }
}

/// Transport protocol carried in bits 1-4 of the transport flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Transport {
    /// Plain UDP
    Udp = 0,
    /// Plain TCP
    Tcp = 1,
    /// DNS over TLS
    Tls = 2,
    /// DNS over DTLS
    Dtls = 3,
    /// DNS over HTTPS
    Https = 4,
    /// Any other transport
    NonStandard = 15,
}

/// Transport flags of a query/response pair or event (`qr-transport-flags`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportFlags(pub u8);

impl TransportFlags {
    const IPV6_BIT: u8 = 0x01;
    const TRANSPORT_SHIFT: u8 = 1;
    const TRANSPORT_MASK: u8 = 0x1e;
    const TRAILING_DATA_BIT: u8 = 0x20;

    /// Build flags from their components
    #[must_use]
    pub const fn new(ipv6: bool, transport: Transport, query_trailing_data: bool) -> Self {
        let mut bits = (transport as u8) << Self::TRANSPORT_SHIFT;
        if ipv6 {
            bits |= Self::IPV6_BIT;
        }
        if query_trailing_data {
            bits |= Self::TRAILING_DATA_BIT;
        }
        Self(bits)
    }

    /// Raw bit value
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true for IPv6, false for IPv4
    #[must_use]
    pub const fn is_ipv6(self) -> bool {
        self.0 & Self::IPV6_BIT != 0
    }

    /// Transport protocol, or `None` for an unassigned value
    #[must_use]
    pub const fn transport(self) -> Option<Transport> {
        match (self.0 & Self::TRANSPORT_MASK) >> Self::TRANSPORT_SHIFT {
            0 => Some(Transport::Udp),
            1 => Some(Transport::Tcp),
            2 => Some(Transport::Tls),
            3 => Some(Transport::Dtls),
            4 => Some(Transport::Https),
            15 => Some(Transport::NonStandard),
            _ => None,
        }
    }

    /// Returns true if the query had trailing bytes after the DNS message
    #[must_use]
    pub const fn has_query_trailing_data(self) -> bool {
        self.0 & Self::TRAILING_DATA_BIT != 0
    }
}

/// Role of the host the traffic was captured on (`qr-type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum QueryResponseType {
    /// Stub resolver
    Stub = 0,
    /// Client
    Client = 1,
    /// Recursive resolver
    Resolver = 2,
    /// Authoritative server
    Auth = 3,
    /// Forwarder
    Forwarder = 4,
    /// Tool (e.g. dig)
    Tool = 5,
}

/// Kind of address event being counted (`ae-type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressEventType {
    /// TCP reset
    TcpReset = 0,
    /// ICMP time exceeded
    IcmpTimeExceeded = 1,
    /// ICMP destination unreachable
    IcmpDestUnreachable = 2,
    /// ICMPv6 time exceeded
    Icmpv6TimeExceeded = 3,
    /// ICMPv6 destination unreachable
    Icmpv6DestUnreachable = 4,
    /// ICMPv6 packet too big
    Icmpv6PacketTooBig = 5,
}
