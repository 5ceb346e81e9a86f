//! Per-block records that are not deduplicated.

use cdns_core::{
    AddressEventType, Index, ResponseProcessingFlags, TableKey, Timestamp, TransportFlags,
};

/// Earliest capture time and parameter set of a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockPreamble {
    /// Minimum timestamp of all items in the block
    pub earliest_time: Option<Timestamp>,
    /// Block parameter set the block was built with
    pub block_parameters_index: Index,
}

/// Running counters for a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStatistics {
    /// Messages seen, including discarded ones
    pub processed_messages: u64,
    /// Query/response items stored
    pub qr_data_items: u64,
    /// Queries without a matching response
    pub unmatched_queries: u64,
    /// Responses without a matching query
    pub unmatched_responses: u64,
    /// Messages dropped for their opcode
    pub discarded_opcode: u64,
    /// Malformed messages seen
    pub malformed_items: u64,
}

/// Bailiwick and cache state of a response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseProcessingData {
    /// Bailiwick name (name-rdata table)
    pub bailiwick_index: Option<Index>,
    /// Processing flags
    pub processing_flags: Option<ResponseProcessingFlags>,
}

impl ResponseProcessingData {
    /// Returns true if nothing is recorded
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bailiwick_index.is_none() && self.processing_flags.is_none()
    }
}

/// Extra sections of a query or response, as list indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryResponseExtended {
    /// Second and later questions (qlist table)
    pub question_index: Option<Index>,
    /// Answer section (rrlist table)
    pub answer_index: Option<Index>,
    /// Authority section (rrlist table)
    pub authority_index: Option<Index>,
    /// Additional section (rrlist table)
    pub additional_index: Option<Index>,
}

impl QueryResponseExtended {
    /// Returns true if no section is recorded
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.question_index.is_none()
            && self.answer_index.is_none()
            && self.authority_index.is_none()
            && self.additional_index.is_none()
    }
}

/// One stored query/response pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResponse {
    /// Ticks since the block's earliest time
    pub time_offset: Option<u64>,
    /// Client address (ip-address table)
    pub client_address_index: Option<Index>,
    /// Client port
    pub client_port: Option<u16>,
    /// DNS transaction id
    pub transaction_id: Option<u16>,
    /// Shared signature (qr-sig table)
    pub qr_signature_index: Option<Index>,
    /// Client hop limit
    pub client_hoplimit: Option<u8>,
    /// Ticks between query and response
    pub response_delay: Option<i64>,
    /// First question's name (name-rdata table)
    pub query_name_index: Option<Index>,
    /// Query size
    pub query_size: Option<u32>,
    /// Response size
    pub response_size: Option<u32>,
    /// Bailiwick and cache state
    pub response_processing_data: Option<ResponseProcessingData>,
    /// Extra query sections
    pub query_extended: Option<QueryResponseExtended>,
    /// Extra response sections
    pub response_extended: Option<QueryResponseExtended>,
}

/// One stored malformed message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MalformedMessage {
    /// Ticks since the block's earliest time
    pub time_offset: Option<u64>,
    /// Client address (ip-address table)
    pub client_address_index: Option<Index>,
    /// Client port
    pub client_port: Option<u16>,
    /// Server side and payload (malformed-message-data table)
    pub message_data_index: Option<Index>,
}

/// Identity of an address event counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressEventKey {
    /// Event type
    pub ae_type: AddressEventType,
    /// ICMP code
    pub ae_code: Option<u8>,
    /// Transport flags
    pub ae_transport_flags: Option<TransportFlags>,
    /// Address (ip-address table)
    pub ae_address_index: Index,
}

impl TableKey for AddressEventKey {
    type Key = Self;

    fn key(&self) -> &Self {
        self
    }
}
