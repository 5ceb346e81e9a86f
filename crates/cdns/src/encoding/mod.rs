//! CBOR encoding of C-DNS files.
//!
//! A C-DNS file is a definite array of three items: the text `"C-DNS"`,
//! the file preamble map and an indefinite array of block maps closed by a
//! break byte. Every map uses the small integer keys from [`keys`] and
//! leaves out absent fields and empty arrays.
//!
//! Blocks and the preamble are built as [`ciborium::Value`] trees and
//! serialized with `ciborium::into_writer`; only the framing bytes around
//! the block stream are written by hand, since blocks are streamed one at a
//! time.

pub mod block;
pub mod keys;
pub mod preamble;

use ciborium::Value;

use cdns_core::{CdnsError, Index, Timestamp, FILE_TYPE_ID};

use crate::config::FilePreamble;

/// Array header for the three top-level file items
pub const CBOR_ARRAY_OF_3: u8 = 0x83;

/// Header opening the indefinite-length block array
pub const CBOR_INDEFINITE_ARRAY: u8 = 0x9f;

/// Break byte closing the block array
pub const CBOR_BREAK: u8 = 0xff;

pub use block::block_to_value;
pub use preamble::file_preamble_to_value;

/// Serialize a CBOR value to bytes
pub fn to_vec(value: &Value) -> crate::Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CdnsError::Cbor(e.to_string()))?;
    Ok(buf)
}

/// Bytes preceding the first block: array header, file type, preamble and
/// the opening of the block array.
pub fn file_header(preamble: &FilePreamble) -> crate::Result<Vec<u8>> {
    let mut buf = vec![CBOR_ARRAY_OF_3];
    ciborium::into_writer(&Value::Text(FILE_TYPE_ID.into()), &mut buf)
        .map_err(|e| CdnsError::Cbor(e.to_string()))?;
    ciborium::into_writer(&file_preamble_to_value(preamble), &mut buf)
        .map_err(|e| CdnsError::Cbor(e.to_string()))?;
    buf.push(CBOR_INDEFINITE_ARRAY);
    Ok(buf)
}

/// Integer-keyed CBOR map under construction.
#[derive(Debug, Default)]
pub(crate) struct MapBuilder(Vec<(Value, Value)>);

impl MapBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(mut self, key: u8, value: impl Into<Value>) -> Self {
        self.0.push((Value::from(key), value.into()));
        self
    }

    pub(crate) fn insert_opt<V: Into<Value>>(self, key: u8, value: Option<V>) -> Self {
        match value {
            Some(v) => self.insert(key, v),
            None => self,
        }
    }

    /// Insert an array, leaving it out when empty
    pub(crate) fn insert_array(self, key: u8, items: Vec<Value>) -> Self {
        if items.is_empty() {
            self
        } else {
            self.insert(key, Value::Array(items))
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn build(self) -> Value {
        Value::Map(self.0)
    }
}

pub(crate) fn index_value(index: Index) -> Value {
    Value::from(index as u64)
}

pub(crate) fn timestamp_value(ts: Timestamp) -> Value {
    Value::Array(vec![Value::from(ts.secs), Value::from(ts.ticks)])
}

#[cfg(test)]
pub(crate) mod test_support {
    use ciborium::Value;

    /// Value stored under an integer key of a CBOR map
    pub fn get(map: &Value, key: u8) -> Option<&Value> {
        map.as_map()?
            .iter()
            .find(|(k, _)| k.as_integer() == Some(key.into()))
            .map(|(_, v)| v)
    }

    /// Integer keys of a CBOR map, in order
    pub fn keys(map: &Value) -> Vec<u64> {
        map.as_map()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(k, _)| k.as_integer().and_then(|i| u64::try_from(i).ok()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Unsigned integer value
    pub fn uint(value: &Value) -> u64 {
        value
            .as_integer()
            .and_then(|i| u64::try_from(i).ok())
            .expect("unsigned integer")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{get, keys, uint};
    use super::*;

    #[test]
    fn test_file_header_framing() {
        let header = file_header(&FilePreamble::default()).unwrap();
        assert_eq!(header[0], CBOR_ARRAY_OF_3);
        // Text string of length 5.
        assert_eq!(header[1], 0x65);
        assert_eq!(&header[2..7], b"C-DNS");
        assert_eq!(header.last(), Some(&CBOR_INDEFINITE_ARRAY));

        let preamble: Value = ciborium::from_reader(&header[7..header.len() - 1]).unwrap();
        assert_eq!(keys(&preamble), vec![0, 1, 3]);
        assert_eq!(uint(get(&preamble, 0).unwrap()), 1);
    }

    #[test]
    fn test_map_builder_skips_absent() {
        let value = MapBuilder::new()
            .insert(0, 7u64)
            .insert_opt::<u64>(1, None)
            .insert_array(2, Vec::new())
            .insert_array(3, vec![Value::from(1u8)])
            .build();
        assert_eq!(keys(&value), vec![0, 3]);
    }

    #[test]
    fn test_to_vec_roundtrip() {
        let value = timestamp_value(Timestamp::new(1_700_000_000, 42));
        let bytes = to_vec(&value).unwrap();
        let decoded: Value = ciborium::from_reader(&bytes[..]).unwrap();
        assert_eq!(decoded, value);
    }
}
