//! C-DNS blocks.
//!
//! A [`CdnsBlock`] buffers query/response pairs, address event counts and
//! malformed messages until it is full. Repeated data goes into the block's
//! deduplicating tables and items refer to it by index, so every index
//! stored in a block is only valid within that block.
//!
//! Adding a record either succeeds completely or fails before the block is
//! touched: records are validated up front and table inserts never fail.

mod records;

pub use records::{
    AddressEventKey, BlockPreamble, BlockStatistics, MalformedMessage, QueryResponse,
    QueryResponseExtended, ResponseProcessingData,
};

use tracing::debug;

use cdns_core::{
    ByteString, CdnsError, ClassType, DedupTable, GenericAddressEventCount,
    GenericMalformedMessage, GenericQueryResponse, GenericResourceRecord, Index, IndexList,
    MalformedMessageData, OtherDataHints, QrSigFlags, Question, QueryResponseHints,
    QueryResponseSignature, ResourceRecord, Result, RrHints, SignatureHints, Timestamp,
};

use crate::config::BlockParameters;

/// Block under construction.
#[derive(Debug, Clone)]
pub struct CdnsBlock {
    parameters: BlockParameters,
    preamble: BlockPreamble,
    statistics: BlockStatistics,

    ip_addresses: DedupTable<ByteString>,
    classtypes: DedupTable<ClassType>,
    names_rdata: DedupTable<ByteString>,
    qr_signatures: DedupTable<QueryResponseSignature>,
    question_lists: DedupTable<IndexList>,
    questions: DedupTable<Question>,
    rr_lists: DedupTable<IndexList>,
    rrs: DedupTable<ResourceRecord>,
    malformed_message_data: DedupTable<MalformedMessageData>,

    query_responses: Vec<QueryResponse>,
    address_events: DedupTable<AddressEventKey>,
    // Parallel to `address_events`.
    address_event_counts: Vec<u64>,
    malformed_messages: Vec<MalformedMessage>,
}

impl Default for CdnsBlock {
    fn default() -> Self {
        Self::new(BlockParameters::default(), 0)
    }
}

impl CdnsBlock {
    /// Create an empty block built with the parameter set at `index`
    #[must_use]
    pub fn new(parameters: BlockParameters, index: Index) -> Self {
        Self {
            parameters,
            preamble: BlockPreamble {
                earliest_time: None,
                block_parameters_index: index,
            },
            statistics: BlockStatistics::default(),
            ip_addresses: DedupTable::new(),
            classtypes: DedupTable::new(),
            names_rdata: DedupTable::new(),
            qr_signatures: DedupTable::new(),
            question_lists: DedupTable::new(),
            questions: DedupTable::new(),
            rr_lists: DedupTable::new(),
            rrs: DedupTable::new(),
            malformed_message_data: DedupTable::new(),
            query_responses: Vec::new(),
            address_events: DedupTable::new(),
            address_event_counts: Vec::new(),
            malformed_messages: Vec::new(),
        }
    }

    // ---- Table operations ----

    /// Add an IP address (4 or 16 bytes, or fewer if truncated to a prefix)
    pub fn add_ip_address(&mut self, addr: &[u8]) -> Index {
        self.ip_addresses.add_by_key(addr, || ByteString::from(addr))
    }

    /// Add an RR class/type pair
    pub fn add_classtype(&mut self, classtype: ClassType) -> Index {
        self.classtypes.add(classtype)
    }

    /// Add a wire-format name or RDATA
    pub fn add_name_rdata(&mut self, bytes: &[u8]) -> Index {
        self.names_rdata.add_by_key(bytes, || ByteString::from(bytes))
    }

    /// Add a query/response signature
    pub fn add_qr_signature(&mut self, signature: QueryResponseSignature) -> Index {
        self.qr_signatures.add(signature)
    }

    /// Add a list of question indexes
    pub fn add_question_list(&mut self, list: &[Index]) -> Index {
        self.question_lists.add_by_key(list, || IndexList::from(list))
    }

    /// Add a question
    pub fn add_question(&mut self, question: Question) -> Index {
        self.questions.add(question)
    }

    /// Add a list of RR indexes
    pub fn add_rr_list(&mut self, list: &[Index]) -> Index {
        self.rr_lists.add_by_key(list, || IndexList::from(list))
    }

    /// Add a resource record
    pub fn add_rr(&mut self, rr: ResourceRecord) -> Index {
        self.rrs.add(rr)
    }

    /// Add malformed message data
    pub fn add_malformed_message_data(&mut self, data: MalformedMessageData) -> Index {
        self.malformed_message_data.add(data)
    }

    // ---- Composite operations ----

    /// Store a query/response pair.
    ///
    /// Returns `true` once the block holds `max_block_items` items and
    /// should be written out. A record whose opcode is not recorded by the
    /// block parameters only bumps the statistics.
    pub fn add_question_response_record(&mut self, qr: &GenericQueryResponse) -> Result<bool> {
        validate_address("client_ip", qr.client_ip.as_deref())?;
        validate_address("server_ip", qr.server_ip.as_deref())?;
        self.validate_timestamp(qr.ts)?;

        let has_query = qr.has_query();
        let has_response = qr.has_response();
        let messages = u64::from(has_query) + u64::from(has_response);

        if let Some(opcode) = qr.query_opcode {
            if !self.parameters.storage.opcodes.contains(&opcode) {
                debug!(opcode, "discarding query/response with unrecorded opcode");
                self.statistics.discarded_opcode += 1;
                self.statistics.processed_messages += messages;
                return Ok(self.is_full());
            }
        }

        let hints = self.parameters.storage.storage_hints;
        let qr_hint = |flag: QueryResponseHints| hints.query_response.contains(flag);
        let sig_hint = |flag: SignatureHints| hints.query_response_signature.contains(flag);

        let time_offset = self
            .time_offset(qr.ts)
            .filter(|_| qr_hint(QueryResponseHints::TIME_OFFSET));

        let client_address_index = match qr.client_ip.as_deref() {
            Some(addr) if qr_hint(QueryResponseHints::CLIENT_ADDRESS_INDEX) => {
                Some(self.add_client_address(addr))
            }
            _ => None,
        };
        let query_name_index = match qr.query_name.as_deref() {
            Some(name) if qr_hint(QueryResponseHints::QUERY_NAME_INDEX) => {
                Some(self.add_name_rdata(name))
            }
            _ => None,
        };

        // Second and later questions of either message share one hint.
        let query_extended = self.add_extended(
            [
                qr.query_questions.as_deref(),
                qr.query_answers.as_deref(),
                qr.query_authority.as_deref(),
                qr.query_additional.as_deref(),
            ],
            [
                qr_hint(QueryResponseHints::QUERY_QUESTION_SECTIONS),
                qr_hint(QueryResponseHints::QUERY_ANSWER_SECTIONS),
                qr_hint(QueryResponseHints::QUERY_AUTHORITY_SECTIONS),
                qr_hint(QueryResponseHints::QUERY_ADDITIONAL_SECTIONS),
            ],
        );
        let response_extended = self.add_extended(
            [
                qr.response_questions.as_deref(),
                qr.response_answers.as_deref(),
                qr.response_authority.as_deref(),
                qr.response_additional.as_deref(),
            ],
            [
                qr_hint(QueryResponseHints::QUERY_QUESTION_SECTIONS),
                qr_hint(QueryResponseHints::RESPONSE_ANSWER_SECTIONS),
                qr_hint(QueryResponseHints::RESPONSE_AUTHORITY_SECTIONS),
                qr_hint(QueryResponseHints::RESPONSE_ADDITIONAL_SECTIONS),
            ],
        );

        let qr_signature_index = if qr_hint(QueryResponseHints::QR_SIGNATURE_INDEX) {
            let server_address_index = match qr.server_ip.as_deref() {
                Some(addr) if sig_hint(SignatureHints::SERVER_ADDRESS) => {
                    Some(self.add_server_address(addr))
                }
                _ => None,
            };
            let query_classtype_index = qr
                .query_classtype
                .filter(|_| sig_hint(SignatureHints::QUERY_CLASS_TYPE))
                .map(|ct| self.add_classtype(ct));
            let query_opt_rdata_index = match qr.query_opt_rdata.as_deref() {
                Some(rdata) if sig_hint(SignatureHints::QUERY_OPT_RDATA) => {
                    Some(self.add_name_rdata(rdata))
                }
                _ => None,
            };
            let qr_sig_flags = qr.qr_sig_flags.unwrap_or_else(|| {
                let mut flags = QrSigFlags::empty();
                if has_query {
                    flags.insert(QrSigFlags::HAS_QUERY);
                }
                if has_response {
                    flags.insert(QrSigFlags::HAS_RESPONSE);
                }
                flags
            });

            let signature = QueryResponseSignature {
                server_address_index,
                server_port: qr.server_port.filter(|_| sig_hint(SignatureHints::SERVER_PORT)),
                qr_transport_flags: qr
                    .qr_transport_flags
                    .filter(|_| sig_hint(SignatureHints::QR_TRANSPORT_FLAGS)),
                qr_type: qr.qr_type.filter(|_| sig_hint(SignatureHints::QR_TYPE)),
                qr_sig_flags: Some(qr_sig_flags).filter(|_| sig_hint(SignatureHints::QR_SIG_FLAGS)),
                query_opcode: qr.query_opcode.filter(|_| sig_hint(SignatureHints::QUERY_OPCODE)),
                qr_dns_flags: qr.qr_dns_flags.filter(|_| sig_hint(SignatureHints::DNS_FLAGS)),
                query_rcode: qr.query_rcode.filter(|_| sig_hint(SignatureHints::QUERY_RCODE)),
                query_classtype_index,
                query_qdcount: qr.query_qdcount.filter(|_| sig_hint(SignatureHints::QUERY_QDCOUNT)),
                query_ancount: qr.query_ancount.filter(|_| sig_hint(SignatureHints::QUERY_ANCOUNT)),
                query_nscount: qr.query_nscount.filter(|_| sig_hint(SignatureHints::QUERY_NSCOUNT)),
                query_arcount: qr.query_arcount.filter(|_| sig_hint(SignatureHints::QUERY_ARCOUNT)),
                query_edns_version: qr
                    .query_edns_version
                    .filter(|_| sig_hint(SignatureHints::QUERY_EDNS_VERSION)),
                query_udp_size: qr
                    .query_udp_size
                    .filter(|_| sig_hint(SignatureHints::QUERY_UDP_SIZE)),
                query_opt_rdata_index,
                response_rcode: qr
                    .response_rcode
                    .filter(|_| sig_hint(SignatureHints::RESPONSE_RCODE)),
            };
            Some(self.add_qr_signature(signature))
        } else {
            None
        };

        let response_processing_data = if qr_hint(QueryResponseHints::RESPONSE_PROCESSING_DATA) {
            let data = ResponseProcessingData {
                bailiwick_index: qr.bailiwick.as_deref().map(|b| self.add_name_rdata(b)),
                processing_flags: qr.processing_flags,
            };
            (!data.is_empty()).then_some(data)
        } else {
            None
        };

        self.query_responses.push(QueryResponse {
            time_offset,
            client_address_index,
            client_port: qr.client_port.filter(|_| qr_hint(QueryResponseHints::CLIENT_PORT)),
            transaction_id: qr
                .transaction_id
                .filter(|_| qr_hint(QueryResponseHints::TRANSACTION_ID)),
            qr_signature_index,
            client_hoplimit: qr
                .client_hoplimit
                .filter(|_| qr_hint(QueryResponseHints::CLIENT_HOPLIMIT)),
            response_delay: qr
                .response_delay
                .filter(|_| qr_hint(QueryResponseHints::RESPONSE_DELAY)),
            query_name_index,
            query_size: qr.query_size.filter(|_| qr_hint(QueryResponseHints::QUERY_SIZE)),
            response_size: qr
                .response_size
                .filter(|_| qr_hint(QueryResponseHints::RESPONSE_SIZE)),
            response_processing_data,
            query_extended,
            response_extended,
        });

        self.statistics.processed_messages += messages;
        self.statistics.qr_data_items += 1;
        match (has_query, has_response) {
            (true, false) => self.statistics.unmatched_queries += 1,
            (false, true) => self.statistics.unmatched_responses += 1,
            _ => {}
        }

        Ok(self.is_full())
    }

    /// Count an address event; repeated keys accumulate.
    ///
    /// Returns the block's fullness, which address events never change.
    pub fn add_address_event_count(&mut self, aec: &GenericAddressEventCount) -> Result<bool> {
        validate_address("ip_address", Some(&aec.ip_address))?;

        if self
            .parameters
            .storage
            .storage_hints
            .other_data
            .contains(OtherDataHints::ADDRESS_EVENT_COUNTS)
        {
            let ae_address_index = self.add_client_address(&aec.ip_address);
            self.increment_address_event(
                AddressEventKey {
                    ae_type: aec.ae_type,
                    ae_code: aec.ae_code,
                    ae_transport_flags: aec.ae_transport_flags,
                    ae_address_index,
                },
                aec.count.unwrap_or(1),
            );
        }

        Ok(self.is_full())
    }

    /// Add `count` to the counter for `key`, creating it if needed
    pub fn increment_address_event(&mut self, key: AddressEventKey, count: u64) {
        let index = self.address_events.add(key);
        match self.address_event_counts.get_mut(index) {
            Some(total) => *total = total.saturating_add(count),
            None => self.address_event_counts.push(count),
        }
    }

    /// Store a message that could not be parsed as DNS
    pub fn add_malformed_message(&mut self, mm: &GenericMalformedMessage) -> Result<bool> {
        validate_address("client_ip", mm.client_ip.as_deref())?;
        validate_address("server_ip", mm.server_ip.as_deref())?;
        self.validate_timestamp(mm.ts)?;

        self.statistics.processed_messages += 1;
        self.statistics.malformed_items += 1;

        if !self
            .parameters
            .storage
            .storage_hints
            .other_data
            .contains(OtherDataHints::MALFORMED_MESSAGES)
        {
            return Ok(self.is_full());
        }

        let time_offset = self.time_offset(mm.ts);
        let client_address_index = mm.client_ip.as_deref().map(|a| self.add_client_address(a));
        let server_address_index = mm.server_ip.as_deref().map(|a| self.add_server_address(a));
        let message_data_index = self.add_malformed_message_data(MalformedMessageData {
            server_address_index,
            server_port: mm.server_port,
            mm_transport_flags: mm.mm_transport_flags,
            mm_payload: mm.mm_payload.clone(),
        });

        self.malformed_messages.push(MalformedMessage {
            time_offset,
            client_address_index,
            client_port: mm.client_port,
            message_data_index: Some(message_data_index),
        });

        Ok(self.is_full())
    }

    // ---- Lifecycle ----

    /// Remove all content, keeping the current parameter set
    pub fn clear(&mut self) {
        self.preamble.earliest_time = None;
        self.statistics = BlockStatistics::default();
        self.ip_addresses.clear();
        self.classtypes.clear();
        self.names_rdata.clear();
        self.qr_signatures.clear();
        self.question_lists.clear();
        self.questions.clear();
        self.rr_lists.clear();
        self.rrs.clear();
        self.malformed_message_data.clear();
        self.query_responses.clear();
        self.address_events.clear();
        self.address_event_counts.clear();
        self.malformed_messages.clear();
    }

    /// Remove all content and switch to the parameter set at `index`
    pub fn clear_with_parameters(&mut self, parameters: BlockParameters, index: Index) {
        self.clear();
        self.parameters = parameters;
        self.preamble.block_parameters_index = index;
    }

    /// Query/response pairs plus malformed messages
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.query_responses.len() + self.malformed_messages.len()
    }

    /// Returns true once the item count reaches `max_block_items`
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.item_count() >= self.parameters.storage.max_block_items
    }

    /// Returns true if writing the block would record nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
            && self.address_events.is_empty()
            && self.statistics == BlockStatistics::default()
    }

    // ---- Accessors ----

    /// Parameters the block is built with
    #[must_use]
    pub const fn parameters(&self) -> &BlockParameters {
        &self.parameters
    }

    /// Earliest time and parameter set index
    #[must_use]
    pub const fn preamble(&self) -> &BlockPreamble {
        &self.preamble
    }

    /// Block statistics
    #[must_use]
    pub const fn statistics(&self) -> &BlockStatistics {
        &self.statistics
    }

    /// The ip-address table
    #[must_use]
    pub const fn ip_addresses(&self) -> &DedupTable<ByteString> {
        &self.ip_addresses
    }

    /// The classtype table
    #[must_use]
    pub const fn classtypes(&self) -> &DedupTable<ClassType> {
        &self.classtypes
    }

    /// The name-rdata table
    #[must_use]
    pub const fn names_rdata(&self) -> &DedupTable<ByteString> {
        &self.names_rdata
    }

    /// The qr-sig table
    #[must_use]
    pub const fn qr_signatures(&self) -> &DedupTable<QueryResponseSignature> {
        &self.qr_signatures
    }

    /// The qlist table
    #[must_use]
    pub const fn question_lists(&self) -> &DedupTable<IndexList> {
        &self.question_lists
    }

    /// The qrr table
    #[must_use]
    pub const fn questions(&self) -> &DedupTable<Question> {
        &self.questions
    }

    /// The rrlist table
    #[must_use]
    pub const fn rr_lists(&self) -> &DedupTable<IndexList> {
        &self.rr_lists
    }

    /// The rr table
    #[must_use]
    pub const fn rrs(&self) -> &DedupTable<ResourceRecord> {
        &self.rrs
    }

    /// The malformed-message-data table
    #[must_use]
    pub const fn malformed_message_data(&self) -> &DedupTable<MalformedMessageData> {
        &self.malformed_message_data
    }

    /// Stored query/response pairs in insertion order
    #[must_use]
    pub fn query_responses(&self) -> &[QueryResponse] {
        &self.query_responses
    }

    /// Stored malformed messages in insertion order
    #[must_use]
    pub fn malformed_messages(&self) -> &[MalformedMessage] {
        &self.malformed_messages
    }

    /// Address event counters with their totals
    pub fn address_event_counts(&self) -> impl Iterator<Item = (&AddressEventKey, u64)> + '_ {
        self.address_events
            .iter()
            .zip(self.address_event_counts.iter().copied())
    }

    /// Total for one address event key
    #[must_use]
    pub fn address_event_count(&self, key: &AddressEventKey) -> Option<u64> {
        self.address_events
            .find(key)
            .and_then(|i| self.address_event_counts.get(i).copied())
    }

    // ---- Internals ----

    const fn ticks_per_second(&self) -> u64 {
        self.parameters.storage.ticks_per_second
    }

    fn validate_timestamp(&self, ts: Option<Timestamp>) -> Result<()> {
        match ts {
            Some(ts) if ts.ticks >= self.ticks_per_second() => Err(CdnsError::invalid_record(
                "ts",
                format!(
                    "{} ticks out of range for {} ticks per second",
                    ts.ticks,
                    self.ticks_per_second()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Offset of `ts` from the earliest time, moving the earliest time back
    /// (and shifting every stored offset) when `ts` precedes it.
    fn time_offset(&mut self, ts: Option<Timestamp>) -> Option<u64> {
        let ts = ts?;
        let tps = self.ticks_per_second();

        match self.preamble.earliest_time {
            Some(earliest) if ts >= earliest => Some(ts.ticks_since(&earliest, tps)),
            Some(earliest) => {
                let shift = earliest.ticks_since(&ts, tps);
                let offsets = self
                    .query_responses
                    .iter_mut()
                    .map(|qr| &mut qr.time_offset)
                    .chain(self.malformed_messages.iter_mut().map(|mm| &mut mm.time_offset));
                for offset in offsets.flatten() {
                    *offset = offset.saturating_add(shift);
                }
                self.preamble.earliest_time = Some(ts);
                Some(0)
            }
            None => {
                self.preamble.earliest_time = Some(ts);
                Some(0)
            }
        }
    }

    fn add_client_address(&mut self, addr: &[u8]) -> Index {
        let storage = &self.parameters.storage;
        let addr = apply_prefix(
            addr,
            storage.client_address_prefix_ipv4,
            storage.client_address_prefix_ipv6,
        );
        self.add_ip_address(&addr)
    }

    fn add_server_address(&mut self, addr: &[u8]) -> Index {
        let storage = &self.parameters.storage;
        let addr = apply_prefix(
            addr,
            storage.server_address_prefix_ipv4,
            storage.server_address_prefix_ipv6,
        );
        self.add_ip_address(&addr)
    }

    fn add_extended(
        &mut self,
        sections: [Option<&[GenericResourceRecord]>; 4],
        record: [bool; 4],
    ) -> Option<QueryResponseExtended> {
        let [questions, answers, authority, additional] = sections;
        let [keep_questions, keep_answers, keep_authority, keep_additional] = record;

        let extended = QueryResponseExtended {
            question_index: questions
                .filter(|_| keep_questions)
                .and_then(|q| self.add_question_section(q)),
            answer_index: answers
                .filter(|_| keep_answers)
                .and_then(|rrs| self.add_rr_section(rrs)),
            authority_index: authority
                .filter(|_| keep_authority)
                .and_then(|rrs| self.add_rr_section(rrs)),
            additional_index: additional
                .filter(|_| keep_additional)
                .and_then(|rrs| self.add_rr_section(rrs)),
        };
        (!extended.is_empty()).then_some(extended)
    }

    fn add_question_section(&mut self, records: &[GenericResourceRecord]) -> Option<Index> {
        let list: Vec<Index> = records
            .iter()
            .map(|r| {
                let question = Question {
                    name_index: self.add_name_rdata(&r.name),
                    classtype_index: self.add_classtype(r.classtype),
                };
                self.add_question(question)
            })
            .collect();

        (!list.is_empty()).then(|| self.add_question_list(&list))
    }

    fn add_rr_section(&mut self, records: &[GenericResourceRecord]) -> Option<Index> {
        let rr_hints = self.parameters.storage.storage_hints.rr;
        let mut list = Vec::with_capacity(records.len());

        for r in records {
            if !self.parameters.storage.rr_types.contains(&r.classtype.rr_type) {
                continue;
            }
            let rdata_index = match r.rdata.as_deref() {
                Some(rdata) if rr_hints.contains(RrHints::RDATA_INDEX) => {
                    Some(self.add_name_rdata(rdata))
                }
                _ => None,
            };
            let rr = ResourceRecord {
                name_index: self.add_name_rdata(&r.name),
                classtype_index: self.add_classtype(r.classtype),
                ttl: r.ttl.filter(|_| rr_hints.contains(RrHints::TTL)),
                rdata_index,
            };
            list.push(self.add_rr(rr));
        }

        (!list.is_empty()).then(|| self.add_rr_list(&list))
    }
}

fn validate_address(field: &'static str, addr: Option<&[u8]>) -> Result<()> {
    match addr {
        Some(a) if a.len() != 4 && a.len() != 16 => Err(CdnsError::invalid_record(
            field,
            format!("expected 4 or 16 address bytes, got {}", a.len()),
        )),
        _ => Ok(()),
    }
}

/// Truncate an address to its prefix: whole bytes only, trailing bits zero.
fn apply_prefix(addr: &[u8], prefix_v4: Option<u8>, prefix_v6: Option<u8>) -> Vec<u8> {
    let prefix = if addr.len() == 4 { prefix_v4 } else { prefix_v6 };
    let Some(prefix) = prefix else {
        return addr.to_vec();
    };

    let partial_bits = prefix % 8;
    let keep = usize::from(prefix / 8) + usize::from(partial_bits != 0);
    let mut out = addr.get(..keep).unwrap_or(addr).to_vec();
    if partial_bits != 0 {
        if let Some(last) = out.last_mut() {
            *last &= 0xff << (8 - partial_bits);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdns_core::{AddressEventType, TransportFlags, Transport};
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    const EXAMPLE_COM: &[u8] = b"\x07example\x03com\x00";
    const EXAMPLE_NET: &[u8] = b"\x07example\x03net\x00";
    const A_IN: ClassType = ClassType::new(1, 1);
    const AAAA_IN: ClassType = ClassType::new(28, 1);

    fn client(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, last))
    }

    fn query(client_last: u8, name: &[u8], ct: ClassType) -> GenericQueryResponse {
        GenericQueryResponse {
            ts: Some(Timestamp::new(1_700_000_000, 0)),
            query_opcode: Some(0),
            ..Default::default()
        }
        .with_client(client(client_last), 40000)
        .with_question(name.to_vec(), ct)
    }

    fn block_with(max_block_items: usize) -> CdnsBlock {
        CdnsBlock::new(BlockParameters::with_max_block_items(max_block_items), 0)
    }

    #[test]
    fn test_deduplicates_shared_data() {
        let mut block = CdnsBlock::default();
        block.add_question_response_record(&query(1, EXAMPLE_COM, A_IN)).unwrap();
        block.add_question_response_record(&query(1, EXAMPLE_NET, A_IN)).unwrap();
        block.add_question_response_record(&query(2, EXAMPLE_COM, AAAA_IN)).unwrap();

        assert_eq!(block.ip_addresses().len(), 2);
        assert_eq!(block.names_rdata().len(), 2);
        assert_eq!(block.classtypes().len(), 2);
        // Only the query class/type differs between signatures.
        assert_eq!(block.qr_signatures().len(), 2);

        let items: Vec<_> = block
            .query_responses()
            .iter()
            .map(|qr| (qr.client_address_index, qr.query_name_index, qr.qr_signature_index))
            .collect();
        assert_eq!(
            items,
            vec![
                (Some(0), Some(0), Some(0)),
                (Some(0), Some(1), Some(0)),
                (Some(1), Some(0), Some(1)),
            ]
        );
        assert_eq!(block.statistics().qr_data_items, 3);
        assert_eq!(block.statistics().unmatched_queries, 3);
    }

    #[test]
    fn test_indexes_stay_in_range() {
        let mut block = CdnsBlock::default();
        let mut qr = query(1, EXAMPLE_COM, A_IN).with_server(client(53), 53);
        qr.response_size = Some(80);
        qr.qr_sig_flags = Some(QrSigFlags::HAS_QUERY | QrSigFlags::HAS_RESPONSE);
        qr.query_opt_rdata = Some(vec![0, 10, 0, 0]);
        qr.bailiwick = Some(b"\x03com\x00".to_vec());
        qr.response_questions = Some(vec![GenericResourceRecord::question(EXAMPLE_NET, AAAA_IN)]);
        qr.response_answers = Some(vec![
            GenericResourceRecord::record(EXAMPLE_COM, A_IN, 300, vec![192, 0, 2, 80]),
            GenericResourceRecord::record(EXAMPLE_COM, A_IN, 300, vec![192, 0, 2, 81]),
        ]);
        qr.response_authority =
            Some(vec![GenericResourceRecord::record(b"\x03com\x00", ClassType::new(2, 1), 86400, EXAMPLE_NET)]);
        block.add_question_response_record(&qr).unwrap();
        block.add_question_response_record(&qr).unwrap();

        let names = block.names_rdata().len();
        let classtypes = block.classtypes().len();
        for q in block.questions() {
            assert!(q.name_index < names);
            assert!(q.classtype_index < classtypes);
        }
        for rr in block.rrs() {
            assert!(rr.name_index < names);
            assert!(rr.classtype_index < classtypes);
            assert!(rr.rdata_index.unwrap() < names);
        }
        for list in block.question_lists() {
            assert!(list.as_slice().iter().all(|&i| i < block.questions().len()));
        }
        for list in block.rr_lists() {
            assert!(list.as_slice().iter().all(|&i| i < block.rrs().len()));
        }
        for sig in block.qr_signatures() {
            assert!(sig.server_address_index.unwrap() < block.ip_addresses().len());
            assert!(sig.query_classtype_index.unwrap() < classtypes);
            assert!(sig.query_opt_rdata_index.unwrap() < names);
        }
        for qr in block.query_responses() {
            assert!(qr.qr_signature_index.unwrap() < block.qr_signatures().len());
            let ext = qr.response_extended.unwrap();
            assert!(ext.question_index.unwrap() < block.question_lists().len());
            assert!(ext.answer_index.unwrap() < block.rr_lists().len());
            assert!(ext.authority_index.unwrap() < block.rr_lists().len());
            assert_eq!(ext.additional_index, None);
            assert!(qr.query_extended.is_none());
        }

        // Identical records share every table entry.
        assert_eq!(block.query_responses()[0], block.query_responses()[1]);
        assert_eq!(block.rr_lists().len(), 2);
        assert_eq!(block.rrs().len(), 3);
        assert_eq!(block.statistics().processed_messages, 4);
        assert_eq!(block.statistics().unmatched_queries, 0);
    }

    #[test]
    fn test_full_at_max_block_items() {
        let mut block = block_with(2);
        assert!(!block.add_question_response_record(&query(1, EXAMPLE_COM, A_IN)).unwrap());
        assert!(block.add_question_response_record(&query(2, EXAMPLE_COM, A_IN)).unwrap());
        assert_eq!(block.item_count(), 2);
        assert!(block.is_full());
    }

    #[test]
    fn test_invalid_address_leaves_block_untouched() {
        let mut block = CdnsBlock::default();
        let mut qr = query(1, EXAMPLE_COM, A_IN);
        qr.client_ip = Some(vec![10, 0, 0]);

        let err = block.add_question_response_record(&qr).unwrap_err();
        assert!(err.is_record_error());
        assert!(block.is_empty());
        assert!(block.ip_addresses().is_empty());
        assert!(block.names_rdata().is_empty());
    }

    #[test]
    fn test_invalid_ticks_rejected() {
        let mut block = CdnsBlock::default();
        let mut qr = query(1, EXAMPLE_COM, A_IN);
        qr.ts = Some(Timestamp::new(1, 1_000_000));
        assert!(block.add_question_response_record(&qr).is_err());
        assert_eq!(block.item_count(), 0);
    }

    #[test]
    fn test_earlier_timestamp_shifts_offsets() {
        let mut block = CdnsBlock::default();
        let mut first = query(1, EXAMPLE_COM, A_IN);
        first.ts = Some(Timestamp::new(100, 500_000));
        let mut second = first.clone();
        second.ts = Some(Timestamp::new(101, 0));
        let mut earliest = first.clone();
        earliest.ts = Some(Timestamp::new(99, 0));

        block.add_question_response_record(&first).unwrap();
        block.add_question_response_record(&second).unwrap();
        block.add_question_response_record(&earliest).unwrap();

        let offsets: Vec<_> = block.query_responses().iter().map(|qr| qr.time_offset).collect();
        assert_eq!(offsets, vec![Some(1_500_000), Some(2_000_000), Some(0)]);
        assert_eq!(block.preamble().earliest_time, Some(Timestamp::new(99, 0)));
    }

    #[test]
    fn test_unrecorded_opcode_discarded() {
        let mut params = BlockParameters::default();
        params.storage.opcodes = vec![0];
        let mut block = CdnsBlock::new(params, 0);

        let mut notify = query(1, EXAMPLE_COM, ClassType::new(6, 1));
        notify.query_opcode = Some(4);
        assert!(!block.add_question_response_record(&notify).unwrap());

        assert_eq!(block.item_count(), 0);
        assert!(block.names_rdata().is_empty());
        assert_eq!(block.statistics().discarded_opcode, 1);
        assert_eq!(block.statistics().processed_messages, 1);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_hints_limit_stored_fields() {
        let mut params = BlockParameters::default();
        let hints = &mut params.storage.storage_hints;
        hints.query_response.remove(QueryResponseHints::CLIENT_PORT);
        hints.query_response.remove(QueryResponseHints::QR_SIGNATURE_INDEX);
        hints.rr.remove(RrHints::RDATA_INDEX);
        let mut block = CdnsBlock::new(params, 0);

        let mut qr = query(1, EXAMPLE_COM, A_IN);
        qr.response_answers =
            Some(vec![GenericResourceRecord::record(EXAMPLE_COM, A_IN, 60, vec![192, 0, 2, 9])]);
        block.add_question_response_record(&qr).unwrap();

        let stored = &block.query_responses()[0];
        assert_eq!(stored.client_port, None);
        assert_eq!(stored.qr_signature_index, None);
        assert!(block.qr_signatures().is_empty());
        // RDATA is not stored, so only the owner name is in the table.
        assert_eq!(block.names_rdata().len(), 1);
        assert_eq!(block.rrs().values()[0].rdata_index, None);
        assert_eq!(block.rrs().values()[0].ttl, Some(60));
    }

    #[test]
    fn test_unrecorded_rr_types_dropped() {
        let mut params = BlockParameters::default();
        params.storage.rr_types = vec![1];
        let mut block = CdnsBlock::new(params, 0);

        let mut qr = query(1, EXAMPLE_COM, A_IN);
        qr.response_answers = Some(vec![
            GenericResourceRecord::record(EXAMPLE_COM, A_IN, 60, vec![192, 0, 2, 9]),
            GenericResourceRecord::record(EXAMPLE_COM, ClassType::new(16, 1), 60, b"\x02hi".to_vec()),
        ]);
        qr.response_authority =
            Some(vec![GenericResourceRecord::record(b"\x03com\x00", ClassType::new(2, 1), 60, EXAMPLE_NET)]);
        block.add_question_response_record(&qr).unwrap();

        assert_eq!(block.rrs().len(), 1);
        let ext = block.query_responses()[0].response_extended.unwrap();
        assert!(ext.answer_index.is_some());
        assert_eq!(ext.authority_index, None);
    }

    #[test]
    fn test_empty_sections_not_stored() {
        let mut block = CdnsBlock::default();
        let mut qr = query(1, EXAMPLE_COM, A_IN);
        qr.response_answers = Some(Vec::new());
        block.add_question_response_record(&qr).unwrap();

        assert!(block.rr_lists().is_empty());
        assert_eq!(block.query_responses()[0].response_extended, None);
    }

    #[test]
    fn test_signature_flags_derived() {
        let mut block = CdnsBlock::default();
        let mut qr = query(1, EXAMPLE_COM, A_IN);
        qr.query_size = Some(29);
        qr.response_size = Some(100);
        block.add_question_response_record(&qr).unwrap();

        let sig = &block.qr_signatures().values()[0];
        assert_eq!(sig.qr_sig_flags, Some(QrSigFlags::HAS_QUERY | QrSigFlags::HAS_RESPONSE));
    }

    #[test]
    fn test_address_prefix_truncation() {
        assert_eq!(apply_prefix(&[192, 0, 2, 77], Some(24), None), vec![192, 0, 2]);
        assert_eq!(apply_prefix(&[192, 0, 2, 77], Some(20), None), vec![192, 0, 0]);
        assert_eq!(apply_prefix(&[192, 0, 2, 77], None, Some(48)), vec![192, 0, 2, 77]);
        assert_eq!(apply_prefix(&[192, 0, 2, 77], Some(0), None), Vec::<u8>::new());

        let v6 = Ipv6Addr::new(0x2001, 0xdb8, 0x1234, 0x5678, 0, 0, 0, 1).octets();
        assert_eq!(apply_prefix(&v6, Some(24), Some(48)), vec![0x20, 0x01, 0x0d, 0xb8, 0x12, 0x34]);

        let mut params = BlockParameters::default();
        params.storage.client_address_prefix_ipv4 = Some(24);
        let mut block = CdnsBlock::new(params, 0);
        block.add_question_response_record(&query(1, EXAMPLE_COM, A_IN)).unwrap();
        block.add_question_response_record(&query(2, EXAMPLE_COM, A_IN)).unwrap();
        assert_eq!(block.ip_addresses().len(), 1);
        assert_eq!(block.ip_addresses().values()[0].as_bytes(), &[192, 0, 2]);
    }

    #[test]
    fn test_address_events_accumulate() {
        let mut block = CdnsBlock::default();
        let reset = GenericAddressEventCount::new(AddressEventType::TcpReset, client(7));
        block.add_address_event_count(&reset).unwrap();
        block.add_address_event_count(&reset).unwrap();
        block
            .add_address_event_count(&GenericAddressEventCount {
                count: Some(5),
                ..reset.clone()
            })
            .unwrap();
        block
            .add_address_event_count(&GenericAddressEventCount {
                ae_transport_flags: Some(TransportFlags::new(false, Transport::Tcp, false)),
                ..reset
            })
            .unwrap();

        let key = AddressEventKey {
            ae_type: AddressEventType::TcpReset,
            ae_code: None,
            ae_transport_flags: None,
            ae_address_index: 0,
        };
        assert_eq!(block.address_event_count(&key), Some(7));
        assert_eq!(block.address_event_counts().count(), 2);
        assert_eq!(block.item_count(), 0);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_malformed_messages() {
        let mut block = block_with(1);
        let mm = GenericMalformedMessage {
            ts: Some(Timestamp::new(50, 0)),
            client_ip: Some(vec![192, 0, 2, 1]),
            client_port: Some(5353),
            server_ip: Some(vec![192, 0, 2, 53]),
            server_port: Some(53),
            mm_transport_flags: None,
            mm_payload: Some(vec![0xde, 0xad]),
        };
        assert!(block.add_malformed_message(&mm).unwrap());

        assert_eq!(block.malformed_messages().len(), 1);
        assert_eq!(block.malformed_message_data().len(), 1);
        assert_eq!(block.ip_addresses().len(), 2);
        assert_eq!(block.statistics().malformed_items, 1);
        let data = &block.malformed_message_data().values()[0];
        assert_eq!(data.server_address_index, Some(1));
        assert_eq!(data.mm_payload.as_deref(), Some(&[0xde, 0xad][..]));
    }

    #[test]
    fn test_clear_with_parameters() {
        let mut block = block_with(10);
        block.add_question_response_record(&query(1, EXAMPLE_COM, A_IN)).unwrap();
        assert!(!block.is_empty());

        block.clear_with_parameters(BlockParameters::with_max_block_items(1), 3);
        assert!(block.is_empty());
        assert!(block.ip_addresses().is_empty());
        assert_eq!(block.preamble().earliest_time, None);
        assert_eq!(block.preamble().block_parameters_index, 3);

        // Indexes restart from zero.
        assert_eq!(block.add_ip_address(&[10, 0, 0, 1]), 0);
        assert!(block.add_question_response_record(&query(2, EXAMPLE_NET, A_IN)).unwrap());
    }
}
