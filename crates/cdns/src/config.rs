//! File preamble and block parameter configuration.
//!
//! The preamble is written once at the start of every C-DNS output and
//! carries the full list of block parameter sets; each block names the set
//! it was built with by index.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;

use cdns_core::{
    CdnsError, Index, OpCode, OtherDataHints, QueryResponseHints, RrHints, RrType, SignatureHints,
    StorageFlags, MAJOR_FORMAT_VERSION, MINOR_FORMAT_VERSION,
};

/// Generator id recorded in the default collection parameters
pub const DEFAULT_GENERATOR_ID: &str = concat!("cdns ", env!("CARGO_PKG_VERSION"));

/// Global parameters of a C-DNS file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePreamble {
    /// Format major version
    #[serde(default = "default_major_version")]
    pub major_format_version: u8,

    /// Format minor version
    #[serde(default = "default_minor_version")]
    pub minor_format_version: u8,

    /// Implementation-specific version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_version: Option<u64>,

    /// Block parameter sets referenced by index from each block
    #[serde(default = "default_block_parameters")]
    pub block_parameters: Vec<BlockParameters>,
}

/// One selectable set of block parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParameters {
    /// What is stored and how
    #[serde(default)]
    pub storage: StorageParameters,

    /// How the data was collected
    #[serde(default = "default_collection", skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionParameters>,
}

/// Storage parameters: flush threshold, tick resolution and field selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageParameters {
    /// Sub-second resolution of timestamps and time offsets
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u64,

    /// Item count at which a block is considered full
    #[serde(default = "default_max_block_items")]
    pub max_block_items: usize,

    /// Which optional fields are recorded
    #[serde(default)]
    pub storage_hints: StorageHints,

    /// Opcodes recorded; messages with other opcodes are discarded
    #[serde(default = "OpCode::all_codes")]
    pub opcodes: Vec<u8>,

    /// RR types recorded in answer/authority/additional sections
    #[serde(default = "RrType::all_codes")]
    pub rr_types: Vec<u16>,

    /// How the data was processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_flags: Option<StorageFlags>,

    /// Prefix length client IPv4 addresses are truncated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address_prefix_ipv4: Option<u8>,

    /// Prefix length client IPv6 addresses are truncated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address_prefix_ipv6: Option<u8>,

    /// Prefix length server IPv4 addresses are truncated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address_prefix_ipv4: Option<u8>,

    /// Prefix length server IPv6 addresses are truncated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address_prefix_ipv6: Option<u8>,

    /// Free-form description of the sampling method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_method: Option<String>,

    /// Free-form description of the anonymization method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymization_method: Option<String>,
}

/// Field-selection hints, one bit per optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageHints {
    /// `QueryResponse` fields
    #[serde(default = "QueryResponseHints::all")]
    pub query_response: QueryResponseHints,

    /// `QueryResponseSignature` fields
    #[serde(default = "SignatureHints::all")]
    pub query_response_signature: SignatureHints,

    /// RR fields
    #[serde(default = "RrHints::all")]
    pub rr: RrHints,

    /// Malformed messages and address event counts
    #[serde(default = "OtherDataHints::all")]
    pub other_data: OtherDataHints,
}

/// Collection parameters; informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionParameters {
    /// Milliseconds to wait for a response before a query counts as unmatched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout: Option<u64>,

    /// Microseconds a response may precede its query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skew_timeout: Option<u64>,

    /// Capture snap length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snaplen: Option<u64>,

    /// Whether interfaces were in promiscuous mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promisc: Option<bool>,

    /// Capture interfaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    /// Server addresses the collector considered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server_addresses: Vec<IpAddr>,

    /// VLAN ids captured
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vlan_ids: Vec<u16>,

    /// Capture filter expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Name and version of the collecting software
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_id: Option<String>,

    /// Host the data was collected on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
}

impl Default for FilePreamble {
    fn default() -> Self {
        Self {
            major_format_version: default_major_version(),
            minor_format_version: default_minor_version(),
            private_version: None,
            block_parameters: default_block_parameters(),
        }
    }
}

impl Default for BlockParameters {
    fn default() -> Self {
        Self {
            storage: StorageParameters::default(),
            collection: default_collection(),
        }
    }
}

impl Default for StorageParameters {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            max_block_items: default_max_block_items(),
            storage_hints: StorageHints::default(),
            opcodes: OpCode::all_codes(),
            rr_types: RrType::all_codes(),
            storage_flags: None,
            client_address_prefix_ipv4: None,
            client_address_prefix_ipv6: None,
            server_address_prefix_ipv4: None,
            server_address_prefix_ipv6: None,
            sampling_method: None,
            anonymization_method: None,
        }
    }
}

impl Default for StorageHints {
    fn default() -> Self {
        Self {
            query_response: QueryResponseHints::all(),
            query_response_signature: SignatureHints::all(),
            rr: RrHints::all(),
            other_data: OtherDataHints::all(),
        }
    }
}

impl FilePreamble {
    /// Preamble with a single block parameter set
    #[must_use]
    pub fn with_block_parameters(block_parameters: BlockParameters) -> Self {
        Self {
            block_parameters: vec![block_parameters],
            ..Self::default()
        }
    }

    /// Load a preamble from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a preamble from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let preamble: Self =
            toml::from_str(content).map_err(|e| CdnsError::Config(e.to_string()))?;
        preamble.validate()?;
        Ok(preamble)
    }

    /// Check the preamble can drive an exporter
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_parameters.is_empty() {
            return Err(CdnsError::Config(
                "at least one block parameter set is required".into(),
            ));
        }

        for (i, bp) in self.block_parameters.iter().enumerate() {
            bp.validate().map_err(|e| match e {
                CdnsError::Config(reason) => {
                    CdnsError::Config(format!("block parameters {i}: {reason}"))
                }
                other => other,
            })?;
        }

        Ok(())
    }

    /// Block parameter set at `index`
    #[must_use]
    pub fn block_parameters(&self, index: Index) -> Option<&BlockParameters> {
        self.block_parameters.get(index)
    }

    /// Number of block parameter sets
    #[must_use]
    pub fn block_parameters_len(&self) -> usize {
        self.block_parameters.len()
    }

    /// Validate and append a block parameter set, returning its index
    pub fn add_block_parameters(
        &mut self,
        block_parameters: BlockParameters,
    ) -> crate::Result<Index> {
        block_parameters.validate()?;
        self.block_parameters.push(block_parameters);
        Ok(self.block_parameters.len() - 1)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string(self).map_err(|e| CdnsError::Config(e.to_string()))
    }
}

impl BlockParameters {
    /// Default parameters with a custom flush threshold
    #[must_use]
    pub fn with_max_block_items(max_block_items: usize) -> Self {
        Self {
            storage: StorageParameters {
                max_block_items,
                ..StorageParameters::default()
            },
            ..Self::default()
        }
    }

    /// Check the set can drive a block
    pub fn validate(&self) -> crate::Result<()> {
        let storage = &self.storage;
        if storage.ticks_per_second == 0 {
            return Err(CdnsError::Config("ticks_per_second must be positive".into()));
        }
        if storage.max_block_items == 0 {
            return Err(CdnsError::Config("max_block_items must be positive".into()));
        }
        check_prefix("client_address_prefix_ipv4", storage.client_address_prefix_ipv4, 32)?;
        check_prefix("client_address_prefix_ipv6", storage.client_address_prefix_ipv6, 128)?;
        check_prefix("server_address_prefix_ipv4", storage.server_address_prefix_ipv4, 32)?;
        check_prefix("server_address_prefix_ipv6", storage.server_address_prefix_ipv6, 128)
    }
}

fn check_prefix(field: &str, prefix: Option<u8>, max: u8) -> crate::Result<()> {
    match prefix {
        Some(p) if p > max => Err(CdnsError::Config(format!(
            "{field} must be at most {max}, got {p}"
        ))),
        _ => Ok(()),
    }
}

// Default value functions for serde.
const fn default_major_version() -> u8 {
    MAJOR_FORMAT_VERSION
}

const fn default_minor_version() -> u8 {
    MINOR_FORMAT_VERSION
}

const fn default_ticks_per_second() -> u64 {
    1_000_000
}

const fn default_max_block_items() -> usize {
    10_000
}

#[allow(clippy::unnecessary_wraps)]
fn default_collection() -> Option<CollectionParameters> {
    Some(CollectionParameters {
        generator_id: Some(DEFAULT_GENERATOR_ID.to_string()),
        ..CollectionParameters::default()
    })
}

fn default_block_parameters() -> Vec<BlockParameters> {
    vec![BlockParameters::default()]
}
