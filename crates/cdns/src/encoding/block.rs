//! Block encoding.

use ciborium::Value;

use cdns_core::{
    ByteString, ClassType, DnsFlags, IndexList, MalformedMessageData, QrSigFlags, Question,
    QueryResponseSignature, ResourceRecord, ResponseProcessingFlags, TransportFlags,
};

use super::keys::{
    address_event_count as aec_keys, block as block_keys, block_preamble as preamble_keys,
    block_statistics as stats_keys, block_tables as table_keys, classtype as ct_keys,
    malformed_message as mm_keys, malformed_message_data as mmd_keys, qr_sig as sig_keys,
    query_response as qr_keys, query_response_extended as ext_keys, question as q_keys,
    response_processing_data as rpd_keys, rr as rr_keys,
};
use super::{index_value, timestamp_value, MapBuilder};
use crate::block::{
    AddressEventKey, BlockPreamble, BlockStatistics, CdnsBlock, MalformedMessage, QueryResponse,
    QueryResponseExtended, ResponseProcessingData,
};

/// Convert a block to its CBOR map.
///
/// Empty tables and item arrays are left out; so is the whole tables map
/// when every table is empty.
pub fn block_to_value(block: &CdnsBlock) -> Value {
    MapBuilder::new()
        .insert(block_keys::BLOCK_PREAMBLE, block_preamble(block.preamble()))
        .insert(block_keys::BLOCK_STATISTICS, block_statistics(block.statistics()))
        .insert_opt(block_keys::BLOCK_TABLES, block_tables(block))
        .insert_array(
            block_keys::QUERY_RESPONSES,
            block.query_responses().iter().map(query_response).collect(),
        )
        .insert_array(
            block_keys::ADDRESS_EVENT_COUNTS,
            block
                .address_event_counts()
                .map(|(key, count)| address_event_count(key, count))
                .collect(),
        )
        .insert_array(
            block_keys::MALFORMED_MESSAGES,
            block.malformed_messages().iter().map(malformed_message).collect(),
        )
        .build()
}

fn block_preamble(preamble: &BlockPreamble) -> Value {
    MapBuilder::new()
        .insert_opt(preamble_keys::EARLIEST_TIME, preamble.earliest_time.map(timestamp_value))
        .insert(
            preamble_keys::BLOCK_PARAMETERS_INDEX,
            index_value(preamble.block_parameters_index),
        )
        .build()
}

fn block_statistics(stats: &BlockStatistics) -> Value {
    MapBuilder::new()
        .insert(stats_keys::PROCESSED_MESSAGES, stats.processed_messages)
        .insert(stats_keys::QR_DATA_ITEMS, stats.qr_data_items)
        .insert(stats_keys::UNMATCHED_QUERIES, stats.unmatched_queries)
        .insert(stats_keys::UNMATCHED_RESPONSES, stats.unmatched_responses)
        .insert(stats_keys::DISCARDED_OPCODE, stats.discarded_opcode)
        .insert(stats_keys::MALFORMED_ITEMS, stats.malformed_items)
        .build()
}

fn block_tables(block: &CdnsBlock) -> Option<Value> {
    let tables = MapBuilder::new()
        .insert_array(table_keys::IP_ADDRESS, block.ip_addresses().iter().map(bytes).collect())
        .insert_array(table_keys::CLASSTYPE, block.classtypes().iter().map(classtype).collect())
        .insert_array(table_keys::NAME_RDATA, block.names_rdata().iter().map(bytes).collect())
        .insert_array(table_keys::QR_SIG, block.qr_signatures().iter().map(signature).collect())
        .insert_array(table_keys::QLIST, block.question_lists().iter().map(index_list).collect())
        .insert_array(table_keys::QRR, block.questions().iter().map(question).collect())
        .insert_array(table_keys::RRLIST, block.rr_lists().iter().map(index_list).collect())
        .insert_array(table_keys::RR, block.rrs().iter().map(resource_record).collect())
        .insert_array(
            table_keys::MALFORMED_MESSAGE_DATA,
            block
                .malformed_message_data()
                .iter()
                .map(malformed_message_data)
                .collect(),
        );

    (!tables.is_empty()).then(|| tables.build())
}

fn bytes(b: &ByteString) -> Value {
    Value::Bytes(b.as_bytes().to_vec())
}

fn index_list(list: &IndexList) -> Value {
    Value::Array(list.as_slice().iter().copied().map(index_value).collect())
}

fn classtype(ct: &ClassType) -> Value {
    MapBuilder::new()
        .insert(ct_keys::TYPE, ct.rr_type)
        .insert(ct_keys::CLASS, ct.class)
        .build()
}

fn signature(sig: &QueryResponseSignature) -> Value {
    MapBuilder::new()
        .insert_opt(sig_keys::SERVER_ADDRESS_INDEX, sig.server_address_index.map(index_value))
        .insert_opt(sig_keys::SERVER_PORT, sig.server_port)
        .insert_opt(sig_keys::QR_TRANSPORT_FLAGS, sig.qr_transport_flags.map(TransportFlags::bits))
        .insert_opt(sig_keys::QR_TYPE, sig.qr_type.map(|t| t as u8))
        .insert_opt(sig_keys::QR_SIG_FLAGS, sig.qr_sig_flags.map(QrSigFlags::bits))
        .insert_opt(sig_keys::QUERY_OPCODE, sig.query_opcode)
        .insert_opt(sig_keys::QR_DNS_FLAGS, sig.qr_dns_flags.map(DnsFlags::bits))
        .insert_opt(sig_keys::QUERY_RCODE, sig.query_rcode)
        .insert_opt(sig_keys::QUERY_CLASSTYPE_INDEX, sig.query_classtype_index.map(index_value))
        .insert_opt(sig_keys::QUERY_QDCOUNT, sig.query_qdcount)
        .insert_opt(sig_keys::QUERY_ANCOUNT, sig.query_ancount)
        .insert_opt(sig_keys::QUERY_NSCOUNT, sig.query_nscount)
        .insert_opt(sig_keys::QUERY_ARCOUNT, sig.query_arcount)
        .insert_opt(sig_keys::QUERY_EDNS_VERSION, sig.query_edns_version)
        .insert_opt(sig_keys::QUERY_UDP_SIZE, sig.query_udp_size)
        .insert_opt(sig_keys::QUERY_OPT_RDATA_INDEX, sig.query_opt_rdata_index.map(index_value))
        .insert_opt(sig_keys::RESPONSE_RCODE, sig.response_rcode)
        .build()
}

fn question(q: &Question) -> Value {
    MapBuilder::new()
        .insert(q_keys::NAME_INDEX, index_value(q.name_index))
        .insert(q_keys::CLASSTYPE_INDEX, index_value(q.classtype_index))
        .build()
}

fn resource_record(rr: &ResourceRecord) -> Value {
    MapBuilder::new()
        .insert(rr_keys::NAME_INDEX, index_value(rr.name_index))
        .insert(rr_keys::CLASSTYPE_INDEX, index_value(rr.classtype_index))
        .insert_opt(rr_keys::TTL, rr.ttl)
        .insert_opt(rr_keys::RDATA_INDEX, rr.rdata_index.map(index_value))
        .build()
}

fn malformed_message_data(data: &MalformedMessageData) -> Value {
    MapBuilder::new()
        .insert_opt(mmd_keys::SERVER_ADDRESS_INDEX, data.server_address_index.map(index_value))
        .insert_opt(mmd_keys::SERVER_PORT, data.server_port)
        .insert_opt(mmd_keys::MM_TRANSPORT_FLAGS, data.mm_transport_flags.map(TransportFlags::bits))
        .insert_opt(mmd_keys::MM_PAYLOAD, data.mm_payload.clone().map(Value::Bytes))
        .build()
}

fn query_response(qr: &QueryResponse) -> Value {
    MapBuilder::new()
        .insert_opt(qr_keys::TIME_OFFSET, qr.time_offset)
        .insert_opt(qr_keys::CLIENT_ADDRESS_INDEX, qr.client_address_index.map(index_value))
        .insert_opt(qr_keys::CLIENT_PORT, qr.client_port)
        .insert_opt(qr_keys::TRANSACTION_ID, qr.transaction_id)
        .insert_opt(qr_keys::QR_SIGNATURE_INDEX, qr.qr_signature_index.map(index_value))
        .insert_opt(qr_keys::CLIENT_HOPLIMIT, qr.client_hoplimit)
        .insert_opt(qr_keys::RESPONSE_DELAY, qr.response_delay)
        .insert_opt(qr_keys::QUERY_NAME_INDEX, qr.query_name_index.map(index_value))
        .insert_opt(qr_keys::QUERY_SIZE, qr.query_size)
        .insert_opt(qr_keys::RESPONSE_SIZE, qr.response_size)
        .insert_opt(
            qr_keys::RESPONSE_PROCESSING_DATA,
            qr.response_processing_data.as_ref().map(response_processing_data),
        )
        .insert_opt(qr_keys::QUERY_EXTENDED, qr.query_extended.as_ref().map(extended))
        .insert_opt(qr_keys::RESPONSE_EXTENDED, qr.response_extended.as_ref().map(extended))
        .build()
}

fn response_processing_data(data: &ResponseProcessingData) -> Value {
    MapBuilder::new()
        .insert_opt(rpd_keys::BAILIWICK_INDEX, data.bailiwick_index.map(index_value))
        .insert_opt(
            rpd_keys::PROCESSING_FLAGS,
            data.processing_flags.map(ResponseProcessingFlags::bits),
        )
        .build()
}

fn extended(ext: &QueryResponseExtended) -> Value {
    MapBuilder::new()
        .insert_opt(ext_keys::QUESTION_INDEX, ext.question_index.map(index_value))
        .insert_opt(ext_keys::ANSWER_INDEX, ext.answer_index.map(index_value))
        .insert_opt(ext_keys::AUTHORITY_INDEX, ext.authority_index.map(index_value))
        .insert_opt(ext_keys::ADDITIONAL_INDEX, ext.additional_index.map(index_value))
        .build()
}

fn address_event_count(key: &AddressEventKey, count: u64) -> Value {
    MapBuilder::new()
        .insert(aec_keys::AE_TYPE, key.ae_type as u8)
        .insert_opt(aec_keys::AE_CODE, key.ae_code)
        .insert(aec_keys::AE_ADDRESS_INDEX, index_value(key.ae_address_index))
        .insert_opt(aec_keys::AE_TRANSPORT_FLAGS, key.ae_transport_flags.map(TransportFlags::bits))
        .insert(aec_keys::AE_COUNT, count)
        .build()
}

fn malformed_message(mm: &MalformedMessage) -> Value {
    MapBuilder::new()
        .insert_opt(mm_keys::TIME_OFFSET, mm.time_offset)
        .insert_opt(mm_keys::CLIENT_ADDRESS_INDEX, mm.client_address_index.map(index_value))
        .insert_opt(mm_keys::CLIENT_PORT, mm.client_port)
        .insert_opt(mm_keys::MESSAGE_DATA_INDEX, mm.message_data_index.map(index_value))
        .build()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get, keys, uint};
    use super::*;
    use crate::config::BlockParameters;
    use cdns_core::{
        AddressEventType, GenericAddressEventCount, GenericMalformedMessage,
        GenericQueryResponse, GenericResourceRecord, Timestamp,
    };
    use std::net::{IpAddr, Ipv4Addr};

    fn sample_query() -> GenericQueryResponse {
        GenericQueryResponse {
            ts: Some(Timestamp::new(1_700_000_000, 250)),
            transaction_id: Some(0x1234),
            query_opcode: Some(0),
            query_rcode: Some(0),
            query_size: Some(29),
            response_size: Some(45),
            response_rcode: Some(0),
            response_answers: Some(vec![GenericResourceRecord::record(
                b"\x07example\x03com\x00".to_vec(),
                ClassType::new(1, 1),
                3600,
                vec![93, 184, 216, 34],
            )]),
            ..Default::default()
        }
        .with_client(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 40000)
        .with_server(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 53)), 53)
        .with_question(b"\x07example\x03com\x00".to_vec(), ClassType::new(1, 1))
    }

    #[test]
    fn test_empty_block_has_preamble_and_statistics_only() {
        let value = block_to_value(&CdnsBlock::default());
        assert_eq!(keys(&value), vec![0, 1]);

        let preamble = get(&value, block_keys::BLOCK_PREAMBLE).unwrap();
        assert_eq!(keys(preamble), vec![1]);
        let stats = get(&value, block_keys::BLOCK_STATISTICS).unwrap();
        assert_eq!(uint(get(stats, stats_keys::PROCESSED_MESSAGES).unwrap()), 0);
    }

    #[test]
    fn test_query_response_block() {
        let mut block = CdnsBlock::new(BlockParameters::default(), 2);
        block.add_question_response_record(&sample_query()).unwrap();
        let value = block_to_value(&block);
        assert_eq!(keys(&value), vec![0, 1, 2, 3]);

        let preamble = get(&value, block_keys::BLOCK_PREAMBLE).unwrap();
        let earliest = get(preamble, preamble_keys::EARLIEST_TIME).unwrap().as_array().unwrap();
        assert_eq!((uint(&earliest[0]), uint(&earliest[1])), (1_700_000_000, 250));
        assert_eq!(uint(get(preamble, preamble_keys::BLOCK_PARAMETERS_INDEX).unwrap()), 2);

        let tables = get(&value, block_keys::BLOCK_TABLES).unwrap();
        // No questions beyond the first and no malformed messages.
        assert_eq!(keys(tables), vec![0, 1, 2, 3, 6, 7]);
        let addresses = get(tables, table_keys::IP_ADDRESS).unwrap().as_array().unwrap();
        assert_eq!(addresses[0].as_bytes().map(Vec::as_slice), Some(&[192, 0, 2, 1][..]));
        assert_eq!(addresses[1].as_bytes().map(Vec::as_slice), Some(&[192, 0, 2, 53][..]));

        let rr = &get(tables, table_keys::RR).unwrap().as_array().unwrap()[0];
        assert_eq!(uint(get(rr, rr_keys::TTL).unwrap()), 3600);
        assert_eq!(uint(get(rr, rr_keys::RDATA_INDEX).unwrap()), 1);

        let qr = &get(&value, block_keys::QUERY_RESPONSES).unwrap().as_array().unwrap()[0];
        assert_eq!(uint(get(qr, qr_keys::TIME_OFFSET).unwrap()), 0);
        assert_eq!(uint(get(qr, qr_keys::TRANSACTION_ID).unwrap()), 0x1234);
        assert_eq!(uint(get(qr, qr_keys::QR_SIGNATURE_INDEX).unwrap()), 0);
        assert!(get(qr, qr_keys::QUERY_EXTENDED).is_none());
        let ext = get(qr, qr_keys::RESPONSE_EXTENDED).unwrap();
        assert_eq!(keys(ext), vec![1]);
    }

    #[test]
    fn test_address_events_and_malformed_messages() {
        let mut block = CdnsBlock::default();
        block
            .add_address_event_count(&GenericAddressEventCount {
                ae_code: Some(3),
                ..GenericAddressEventCount::new(
                    AddressEventType::IcmpDestUnreachable,
                    IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7)),
                )
            })
            .unwrap();
        block
            .add_malformed_message(&GenericMalformedMessage {
                mm_payload: Some(vec![1, 2, 3]),
                ..Default::default()
            })
            .unwrap();

        let value = block_to_value(&block);
        assert_eq!(keys(&value), vec![0, 1, 2, 4, 5]);

        let aec = &get(&value, block_keys::ADDRESS_EVENT_COUNTS).unwrap().as_array().unwrap()[0];
        assert_eq!(keys(aec), vec![0, 1, 2, 4]);
        assert_eq!(uint(get(aec, aec_keys::AE_TYPE).unwrap()), 2);
        assert_eq!(uint(get(aec, aec_keys::AE_COUNT).unwrap()), 1);

        let mm = &get(&value, block_keys::MALFORMED_MESSAGES).unwrap().as_array().unwrap()[0];
        assert_eq!(keys(mm), vec![3]);
        let tables = get(&value, block_keys::BLOCK_TABLES).unwrap();
        let data = &get(tables, table_keys::MALFORMED_MESSAGE_DATA).unwrap().as_array().unwrap()[0];
        assert_eq!(
            get(data, mmd_keys::MM_PAYLOAD).unwrap().as_bytes().map(Vec::as_slice),
            Some(&[1, 2, 3][..])
        );
    }
}
