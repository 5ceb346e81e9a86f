//! RFC 8618 integer map keys, one module per CBOR map.

pub mod file_preamble {
    pub const MAJOR_FORMAT_VERSION: u8 = 0;
    pub const MINOR_FORMAT_VERSION: u8 = 1;
    pub const PRIVATE_VERSION: u8 = 2;
    pub const BLOCK_PARAMETERS: u8 = 3;
}

pub mod block_parameters {
    pub const STORAGE_PARAMETERS: u8 = 0;
    pub const COLLECTION_PARAMETERS: u8 = 1;
}

pub mod storage_parameters {
    pub const TICKS_PER_SECOND: u8 = 0;
    pub const MAX_BLOCK_ITEMS: u8 = 1;
    pub const STORAGE_HINTS: u8 = 2;
    pub const OPCODES: u8 = 3;
    pub const RR_TYPES: u8 = 4;
    pub const STORAGE_FLAGS: u8 = 5;
    pub const CLIENT_ADDRESS_PREFIX_IPV4: u8 = 6;
    pub const CLIENT_ADDRESS_PREFIX_IPV6: u8 = 7;
    pub const SERVER_ADDRESS_PREFIX_IPV4: u8 = 8;
    pub const SERVER_ADDRESS_PREFIX_IPV6: u8 = 9;
    pub const SAMPLING_METHOD: u8 = 10;
    pub const ANONYMIZATION_METHOD: u8 = 11;
}

pub mod storage_hints {
    pub const QUERY_RESPONSE_HINTS: u8 = 0;
    pub const QUERY_RESPONSE_SIGNATURE_HINTS: u8 = 1;
    pub const RR_HINTS: u8 = 2;
    pub const OTHER_DATA_HINTS: u8 = 3;
}

pub mod collection_parameters {
    pub const QUERY_TIMEOUT: u8 = 0;
    pub const SKEW_TIMEOUT: u8 = 1;
    pub const SNAPLEN: u8 = 2;
    pub const PROMISC: u8 = 3;
    pub const INTERFACES: u8 = 4;
    pub const SERVER_ADDRESSES: u8 = 5;
    pub const VLAN_IDS: u8 = 6;
    pub const FILTER: u8 = 7;
    pub const GENERATOR_ID: u8 = 8;
    pub const HOST_ID: u8 = 9;
}

pub mod block {
    pub const BLOCK_PREAMBLE: u8 = 0;
    pub const BLOCK_STATISTICS: u8 = 1;
    pub const BLOCK_TABLES: u8 = 2;
    pub const QUERY_RESPONSES: u8 = 3;
    pub const ADDRESS_EVENT_COUNTS: u8 = 4;
    pub const MALFORMED_MESSAGES: u8 = 5;
}

pub mod block_preamble {
    pub const EARLIEST_TIME: u8 = 0;
    pub const BLOCK_PARAMETERS_INDEX: u8 = 1;
}

pub mod block_statistics {
    pub const PROCESSED_MESSAGES: u8 = 0;
    pub const QR_DATA_ITEMS: u8 = 1;
    pub const UNMATCHED_QUERIES: u8 = 2;
    pub const UNMATCHED_RESPONSES: u8 = 3;
    pub const DISCARDED_OPCODE: u8 = 4;
    pub const MALFORMED_ITEMS: u8 = 5;
}

pub mod block_tables {
    pub const IP_ADDRESS: u8 = 0;
    pub const CLASSTYPE: u8 = 1;
    pub const NAME_RDATA: u8 = 2;
    pub const QR_SIG: u8 = 3;
    pub const QLIST: u8 = 4;
    pub const QRR: u8 = 5;
    pub const RRLIST: u8 = 6;
    pub const RR: u8 = 7;
    pub const MALFORMED_MESSAGE_DATA: u8 = 8;
}

pub mod classtype {
    pub const TYPE: u8 = 0;
    pub const CLASS: u8 = 1;
}

pub mod qr_sig {
    pub const SERVER_ADDRESS_INDEX: u8 = 0;
    pub const SERVER_PORT: u8 = 1;
    pub const QR_TRANSPORT_FLAGS: u8 = 2;
    pub const QR_TYPE: u8 = 3;
    pub const QR_SIG_FLAGS: u8 = 4;
    pub const QUERY_OPCODE: u8 = 5;
    pub const QR_DNS_FLAGS: u8 = 6;
    pub const QUERY_RCODE: u8 = 7;
    pub const QUERY_CLASSTYPE_INDEX: u8 = 8;
    pub const QUERY_QDCOUNT: u8 = 9;
    pub const QUERY_ANCOUNT: u8 = 10;
    pub const QUERY_NSCOUNT: u8 = 11;
    pub const QUERY_ARCOUNT: u8 = 12;
    pub const QUERY_EDNS_VERSION: u8 = 13;
    pub const QUERY_UDP_SIZE: u8 = 14;
    pub const QUERY_OPT_RDATA_INDEX: u8 = 15;
    pub const RESPONSE_RCODE: u8 = 16;
}

pub mod question {
    pub const NAME_INDEX: u8 = 0;
    pub const CLASSTYPE_INDEX: u8 = 1;
}

pub mod rr {
    pub const NAME_INDEX: u8 = 0;
    pub const CLASSTYPE_INDEX: u8 = 1;
    pub const TTL: u8 = 2;
    pub const RDATA_INDEX: u8 = 3;
}

pub mod malformed_message_data {
    pub const SERVER_ADDRESS_INDEX: u8 = 0;
    pub const SERVER_PORT: u8 = 1;
    pub const MM_TRANSPORT_FLAGS: u8 = 2;
    pub const MM_PAYLOAD: u8 = 3;
}

pub mod query_response {
    pub const TIME_OFFSET: u8 = 0;
    pub const CLIENT_ADDRESS_INDEX: u8 = 1;
    pub const CLIENT_PORT: u8 = 2;
    pub const TRANSACTION_ID: u8 = 3;
    pub const QR_SIGNATURE_INDEX: u8 = 4;
    pub const CLIENT_HOPLIMIT: u8 = 5;
    pub const RESPONSE_DELAY: u8 = 6;
    pub const QUERY_NAME_INDEX: u8 = 7;
    pub const QUERY_SIZE: u8 = 8;
    pub const RESPONSE_SIZE: u8 = 9;
    pub const RESPONSE_PROCESSING_DATA: u8 = 10;
    pub const QUERY_EXTENDED: u8 = 11;
    pub const RESPONSE_EXTENDED: u8 = 12;
}

pub mod response_processing_data {
    pub const BAILIWICK_INDEX: u8 = 0;
    pub const PROCESSING_FLAGS: u8 = 1;
}

pub mod query_response_extended {
    pub const QUESTION_INDEX: u8 = 0;
    pub const ANSWER_INDEX: u8 = 1;
    pub const AUTHORITY_INDEX: u8 = 2;
    pub const ADDITIONAL_INDEX: u8 = 3;
}

pub mod address_event_count {
    pub const AE_TYPE: u8 = 0;
    pub const AE_CODE: u8 = 1;
    pub const AE_ADDRESS_INDEX: u8 = 2;
    pub const AE_TRANSPORT_FLAGS: u8 = 3;
    pub const AE_COUNT: u8 = 4;
}

pub mod malformed_message {
    pub const TIME_OFFSET: u8 = 0;
    pub const CLIENT_ADDRESS_INDEX: u8 = 1;
    pub const CLIENT_PORT: u8 = 2;
    pub const MESSAGE_DATA_INDEX: u8 = 3;
}
