//! Output destinations, compression and the byte-level encoder.

mod compress;
mod encoder;

pub use compress::{CompressWriter, Compression};
pub use encoder::{CdnsEncoder, OutputDestination};
