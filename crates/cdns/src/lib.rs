//! cdns: block-structured C-DNS (RFC 8618) export of captured DNS traffic.
//!
//! Query/response pairs handed over by a packet parser are buffered into
//! blocks. Each block deduplicates repeated data (addresses, names,
//! class/type pairs, signatures, resource records) into per-block tables and
//! is written as one CBOR item once it holds `max_block_items` items.
//!
//! # Layers
//!
//! - [`config`]: file preamble and block parameters, loadable from TOML
//! - [`block`]: the block under construction and its tables
//! - [`encoding`]: CBOR maps for blocks and the preamble, plus file framing
//! - [`output`]: destinations, gzip/xz compression and the byte encoder
//! - [`exporter`]: buffering, flushing, parameter switching and rotation
//!
//! # Example
//!
//! ```rust,no_run
//! use cdns::{CdnsExporter, ClassType, Compression, FilePreamble, GenericQueryResponse};
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! let preamble = FilePreamble::load("cdns.toml".as_ref())?;
//! let mut exporter = CdnsExporter::new(preamble, "capture.cdns.gz", Compression::Gzip)?;
//!
//! let qr = GenericQueryResponse::default()
//!     .with_client(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 40000)
//!     .with_question(b"\x07example\x03com\x00".to_vec(), ClassType::new(1, 1));
//! exporter.buffer(&qr)?;
//!
//! exporter.write_block()?;
//! exporter.close()?;
//! # Ok::<(), cdns::CdnsError>(())
//! ```

pub mod block;
pub mod config;
pub mod encoding;
pub mod exporter;
pub mod output;

// Re-exports for convenience.
pub use block::CdnsBlock;
pub use cdns_core::*;
pub use config::{
    BlockParameters, CollectionParameters, FilePreamble, StorageHints, StorageParameters,
    DEFAULT_GENERATOR_ID,
};
pub use exporter::{CdnsExporter, ExporterState};
pub use output::{CdnsEncoder, Compression, OutputDestination};
