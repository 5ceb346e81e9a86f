//! File preamble encoding.

use ciborium::Value;

use cdns_core::{address_bytes, StorageFlags};

use super::keys::{
    block_parameters as bp_keys, collection_parameters as cp_keys, file_preamble as fp_keys,
    storage_hints as hint_keys, storage_parameters as sp_keys,
};
use super::MapBuilder;
use crate::config::{
    BlockParameters, CollectionParameters, FilePreamble, StorageHints, StorageParameters,
};

/// Convert the file preamble to its CBOR map
pub fn file_preamble_to_value(preamble: &FilePreamble) -> Value {
    MapBuilder::new()
        .insert(fp_keys::MAJOR_FORMAT_VERSION, preamble.major_format_version)
        .insert(fp_keys::MINOR_FORMAT_VERSION, preamble.minor_format_version)
        .insert_opt(fp_keys::PRIVATE_VERSION, preamble.private_version)
        .insert(
            fp_keys::BLOCK_PARAMETERS,
            Value::Array(preamble.block_parameters.iter().map(block_parameters).collect()),
        )
        .build()
}

fn block_parameters(bp: &BlockParameters) -> Value {
    MapBuilder::new()
        .insert(bp_keys::STORAGE_PARAMETERS, storage_parameters(&bp.storage))
        .insert_opt(bp_keys::COLLECTION_PARAMETERS, bp.collection.as_ref().map(collection_parameters))
        .build()
}

fn storage_parameters(sp: &StorageParameters) -> Value {
    MapBuilder::new()
        .insert(sp_keys::TICKS_PER_SECOND, sp.ticks_per_second)
        .insert(sp_keys::MAX_BLOCK_ITEMS, sp.max_block_items as u64)
        .insert(sp_keys::STORAGE_HINTS, storage_hints(&sp.storage_hints))
        .insert(
            sp_keys::OPCODES,
            Value::Array(sp.opcodes.iter().copied().map(Value::from).collect()),
        )
        .insert(
            sp_keys::RR_TYPES,
            Value::Array(sp.rr_types.iter().copied().map(Value::from).collect()),
        )
        .insert_opt(sp_keys::STORAGE_FLAGS, sp.storage_flags.map(StorageFlags::bits))
        .insert_opt(sp_keys::CLIENT_ADDRESS_PREFIX_IPV4, sp.client_address_prefix_ipv4)
        .insert_opt(sp_keys::CLIENT_ADDRESS_PREFIX_IPV6, sp.client_address_prefix_ipv6)
        .insert_opt(sp_keys::SERVER_ADDRESS_PREFIX_IPV4, sp.server_address_prefix_ipv4)
        .insert_opt(sp_keys::SERVER_ADDRESS_PREFIX_IPV6, sp.server_address_prefix_ipv6)
        .insert_opt(sp_keys::SAMPLING_METHOD, sp.sampling_method.as_deref())
        .insert_opt(sp_keys::ANONYMIZATION_METHOD, sp.anonymization_method.as_deref())
        .build()
}

fn storage_hints(hints: &StorageHints) -> Value {
    MapBuilder::new()
        .insert(hint_keys::QUERY_RESPONSE_HINTS, hints.query_response.bits())
        .insert(
            hint_keys::QUERY_RESPONSE_SIGNATURE_HINTS,
            hints.query_response_signature.bits(),
        )
        .insert(hint_keys::RR_HINTS, hints.rr.bits())
        .insert(hint_keys::OTHER_DATA_HINTS, hints.other_data.bits())
        .build()
}

fn collection_parameters(cp: &CollectionParameters) -> Value {
    MapBuilder::new()
        .insert_opt(cp_keys::QUERY_TIMEOUT, cp.query_timeout)
        .insert_opt(cp_keys::SKEW_TIMEOUT, cp.skew_timeout)
        .insert_opt(cp_keys::SNAPLEN, cp.snaplen)
        .insert_opt(cp_keys::PROMISC, cp.promisc)
        .insert_array(
            cp_keys::INTERFACES,
            cp.interfaces.iter().map(|i| Value::from(i.as_str())).collect(),
        )
        .insert_array(
            cp_keys::SERVER_ADDRESSES,
            cp.server_addresses
                .iter()
                .map(|&addr| Value::Bytes(address_bytes(addr)))
                .collect(),
        )
        .insert_array(
            cp_keys::VLAN_IDS,
            cp.vlan_ids.iter().copied().map(Value::from).collect(),
        )
        .insert_opt(cp_keys::FILTER, cp.filter.as_deref())
        .insert_opt(cp_keys::GENERATOR_ID, cp.generator_id.as_deref())
        .insert_opt(cp_keys::HOST_ID, cp.host_id.as_deref())
        .build()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get, keys, uint};
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_default_preamble() {
        let value = file_preamble_to_value(&FilePreamble::default());
        assert_eq!(keys(&value), vec![0, 1, 3]);

        let sets = get(&value, fp_keys::BLOCK_PARAMETERS).unwrap().as_array().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(keys(&sets[0]), vec![0, 1]);

        // Only the generator id is collected by default.
        let collection = get(&sets[0], bp_keys::COLLECTION_PARAMETERS).unwrap();
        assert_eq!(keys(collection), vec![8]);
        assert_eq!(
            get(collection, cp_keys::GENERATOR_ID).unwrap().as_text(),
            Some(crate::config::DEFAULT_GENERATOR_ID)
        );

        let storage = get(&sets[0], bp_keys::STORAGE_PARAMETERS).unwrap();
        assert_eq!(keys(storage), vec![0, 1, 2, 3, 4]);
        assert_eq!(uint(get(storage, sp_keys::TICKS_PER_SECOND).unwrap()), 1_000_000);
        assert_eq!(uint(get(storage, sp_keys::MAX_BLOCK_ITEMS).unwrap()), 10_000);

        let hints = get(storage, sp_keys::STORAGE_HINTS).unwrap();
        assert_eq!(uint(get(hints, hint_keys::QUERY_RESPONSE_HINTS).unwrap()), 0x3_ffff);
        assert_eq!(uint(get(hints, hint_keys::QUERY_RESPONSE_SIGNATURE_HINTS).unwrap()), 0x1_ffff);

        let opcodes = get(storage, sp_keys::OPCODES).unwrap().as_array().unwrap();
        assert_eq!(opcodes.len(), 6);
    }

    #[test]
    fn test_optional_parameters() {
        let mut fp = FilePreamble {
            private_version: Some(3),
            ..FilePreamble::default()
        };
        fp.block_parameters[0].storage.client_address_prefix_ipv4 = Some(24);
        fp.block_parameters[0].storage.anonymization_method = Some("prefix".into());
        fp.block_parameters[0].collection = Some(CollectionParameters {
            promisc: Some(false),
            interfaces: vec!["eth0".into(), "eth1".into()],
            server_addresses: vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 53))],
            generator_id: Some("cdns".into()),
            ..CollectionParameters::default()
        });

        let value = file_preamble_to_value(&fp);
        assert_eq!(uint(get(&value, fp_keys::PRIVATE_VERSION).unwrap()), 3);

        let set = &get(&value, fp_keys::BLOCK_PARAMETERS).unwrap().as_array().unwrap()[0];
        let storage = get(set, bp_keys::STORAGE_PARAMETERS).unwrap();
        assert_eq!(uint(get(storage, sp_keys::CLIENT_ADDRESS_PREFIX_IPV4).unwrap()), 24);
        assert_eq!(
            get(storage, sp_keys::ANONYMIZATION_METHOD).unwrap().as_text(),
            Some("prefix")
        );

        let collection = get(set, bp_keys::COLLECTION_PARAMETERS).unwrap();
        assert_eq!(keys(collection), vec![3, 4, 5, 8]);
        assert_eq!(get(collection, cp_keys::PROMISC).unwrap().as_bool(), Some(false));
        let servers = get(collection, cp_keys::SERVER_ADDRESSES).unwrap().as_array().unwrap();
        assert_eq!(servers[0].as_bytes().map(Vec::as_slice), Some(&[192, 0, 2, 53][..]));
    }
}
