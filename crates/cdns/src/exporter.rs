//! Block-buffering C-DNS exporter.
//!
//! The exporter owns the file preamble, one block under construction and
//! the output encoder. Records are buffered into the block; whenever the
//! block fills up it is written out and a fresh block is started with the
//! active block parameters.
//!
//! Output framing is written lazily: the file header goes out right before
//! the first block of each output, and the break byte closing the block
//! array is written when the output is rotated, closed or dropped. An
//! output that never received a block is left empty.

use tracing::{debug, info, warn};

use cdns_core::{
    CdnsError, GenericAddressEventCount, GenericMalformedMessage, GenericQueryResponse, Index,
};

use crate::block::CdnsBlock;
use crate::config::{BlockParameters, FilePreamble};
use crate::encoding;
use crate::output::{CdnsEncoder, Compression, OutputDestination};

/// Lifecycle state of the current output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterState {
    /// Last rotation failed; nothing can be written until the next one
    NoOutputOpened,
    /// Output open, header not yet written
    OutputOpenNoBlocksWritten,
    /// Header and at least one block written
    OutputOpenBlocksWritten,
}

/// Encoder plus the framing state of the current output.
#[derive(Debug)]
struct Output {
    encoder: CdnsEncoder,
    blocks_written: usize,
    // Number of parameter sets in the header already written, if any.
    header_parameter_sets: Option<usize>,
}

impl Output {
    fn write_block(&mut self, preamble: &FilePreamble, block: &CdnsBlock) -> crate::Result<usize> {
        if !self.encoder.is_open() {
            return Err(CdnsError::Output("no output opened".into()));
        }

        let index = block.preamble().block_parameters_index;
        let available = self
            .header_parameter_sets
            .unwrap_or_else(|| preamble.block_parameters_len());
        if index >= available {
            return Err(CdnsError::Encoding(format!(
                "block parameters index {index} is not in the file preamble ({available} sets)"
            )));
        }

        let mut written = 0;
        if self.header_parameter_sets.is_none() {
            written += self.encoder.write(&encoding::file_header(preamble)?)?;
            self.header_parameter_sets = Some(preamble.block_parameters_len());
        }
        written += self.encoder.write_value(&encoding::block_to_value(block))?;
        self.blocks_written += 1;

        debug!(
            items = block.item_count(),
            bytes = written,
            blocks = self.blocks_written,
            "wrote C-DNS block"
        );
        Ok(written)
    }

    /// Terminate the block array if one was opened and release the output.
    fn finish(&mut self) -> crate::Result<usize> {
        let terminated = if self.header_parameter_sets.is_some() && self.encoder.is_open() {
            self.encoder.write_break()
        } else {
            Ok(0)
        };
        self.header_parameter_sets = None;
        self.blocks_written = 0;

        let closed = self.encoder.close();
        let written = terminated?;
        closed?;
        Ok(written)
    }
}

/// Buffers DNS records into blocks and writes them as C-DNS.
#[derive(Debug)]
pub struct CdnsExporter {
    file_preamble: FilePreamble,
    block: CdnsBlock,
    output: Output,
    active_block_parameters: Index,
    closed: bool,
}

impl CdnsExporter {
    /// Validate the preamble and open the first output.
    ///
    /// Block parameter set 0 is active initially.
    pub fn new(
        file_preamble: FilePreamble,
        destination: impl Into<OutputDestination>,
        compression: Compression,
    ) -> crate::Result<Self> {
        file_preamble.validate()?;
        let parameters = file_preamble
            .block_parameters(0)
            .cloned()
            .ok_or_else(|| CdnsError::Config("no block parameters".into()))?;

        let mut encoder = CdnsEncoder::new(compression);
        encoder.open(destination.into())?;

        info!(
            block_parameters = file_preamble.block_parameters_len(),
            compression = %compression,
            "C-DNS exporter started"
        );

        Ok(Self {
            file_preamble,
            block: CdnsBlock::new(parameters, 0),
            output: Output {
                encoder,
                blocks_written: 0,
                header_parameter_sets: None,
            },
            active_block_parameters: 0,
            closed: false,
        })
    }

    /// Buffer a query/response pair.
    ///
    /// Returns the bytes written, which is 0 unless the record filled the
    /// block and it was flushed. An invalid record is rejected without
    /// touching the buffered block.
    ///
    /// With no output open, a record that would fill the block is refused
    /// with an output error and not stored. If the output is open but the
    /// flush fails, the record is kept and the full block is written by the
    /// next call; the caller must not buffer the same record again.
    pub fn buffer(&mut self, qr: &GenericQueryResponse) -> crate::Result<usize> {
        let mut written = self.make_room()?;
        if self.block.add_question_response_record(qr)? {
            written += self.write_block()?;
        }
        Ok(written)
    }

    /// Buffer an address event count
    pub fn buffer_address_event(&mut self, aec: &GenericAddressEventCount) -> crate::Result<usize> {
        if self.block.add_address_event_count(aec)? {
            self.write_block()
        } else {
            Ok(0)
        }
    }

    /// Buffer a malformed message
    ///
    /// Follows the same rules as [`Self::buffer`].
    pub fn buffer_malformed_message(
        &mut self,
        mm: &GenericMalformedMessage,
    ) -> crate::Result<usize> {
        let mut written = self.make_room()?;
        if self.block.add_malformed_message(mm)? {
            written += self.write_block()?;
        }
        Ok(written)
    }

    // Flush a block left full by an earlier failed write, then refuse an
    // item that would fill the block while no output is open.
    fn make_room(&mut self) -> crate::Result<usize> {
        let written = if self.block.is_full() {
            self.write_block()?
        } else {
            0
        };

        if !self.output.encoder.is_open()
            && self.block.item_count() + 1 >= self.block.parameters().storage.max_block_items
        {
            return Err(CdnsError::Output("no output opened".into()));
        }
        Ok(written)
    }

    /// Write the buffered block and start a new one with the active
    /// parameters.
    ///
    /// The block is written even if empty. If writing fails the block stays
    /// buffered.
    pub fn write_block(&mut self) -> crate::Result<usize> {
        let written = self.output.write_block(&self.file_preamble, &self.block)?;
        match self.file_preamble.block_parameters(self.active_block_parameters) {
            Some(parameters) => self
                .block
                .clear_with_parameters(parameters.clone(), self.active_block_parameters),
            None => self.block.clear(),
        }
        Ok(written)
    }

    /// Write a block built outside the exporter; the buffered block is not
    /// affected.
    pub fn write_external_block(&mut self, block: &CdnsBlock) -> crate::Result<usize> {
        self.output.write_block(&self.file_preamble, block)
    }

    /// Close the current output and continue in `destination`.
    ///
    /// With `flush_current` the buffered block is written to the old output
    /// first; otherwise it carries over to the new one. The old output is
    /// finished even if the flush fails or the new one cannot be opened,
    /// leaving the exporter in [`ExporterState::NoOutputOpened`]. A block
    /// that failed to flush stays buffered.
    pub fn rotate_output(
        &mut self,
        destination: impl Into<OutputDestination>,
        flush_current: bool,
    ) -> crate::Result<usize> {
        let flushed = if flush_current && self.output.encoder.is_open() {
            self.write_block()
        } else {
            Ok(0)
        };
        let finished = self.output.finish();
        let written = flushed? + finished?;

        let destination = destination.into();
        let name = destination.to_string();
        self.output.encoder.open(destination)?;

        info!(destination = %name, bytes = written, "rotated C-DNS output");
        Ok(written)
    }

    /// Select the parameter set for blocks started after the current one.
    ///
    /// Returns false if `index` is not in the file preamble, or was added
    /// after the current output's header was written.
    pub fn set_active_block_parameters(&mut self, index: Index) -> bool {
        let available = self
            .output
            .header_parameter_sets
            .unwrap_or_else(|| self.file_preamble.block_parameters_len());
        if index >= available {
            warn!(index, available, "block parameters index not available");
            return false;
        }

        self.active_block_parameters = index;
        true
    }

    /// Parameter set used for new blocks
    pub const fn active_block_parameters(&self) -> Index {
        self.active_block_parameters
    }

    /// Validate a parameter set and add it to the file preamble.
    ///
    /// The set becomes selectable once it is part of a written header, i.e.
    /// immediately if the current output has no blocks yet, else after the
    /// next rotation. An invalid set is rejected and never selectable.
    pub fn add_block_parameters(&mut self, parameters: BlockParameters) -> crate::Result<Index> {
        self.file_preamble.add_block_parameters(parameters)
    }

    /// Items in the buffered block
    pub fn block_item_count(&self) -> usize {
        self.block.item_count()
    }

    /// The buffered block
    pub const fn block(&self) -> &CdnsBlock {
        &self.block
    }

    /// The file preamble
    pub const fn file_preamble(&self) -> &FilePreamble {
        &self.file_preamble
    }

    /// Blocks written to the current output
    pub const fn blocks_written(&self) -> usize {
        self.output.blocks_written
    }

    /// State of the current output
    pub const fn state(&self) -> ExporterState {
        if !self.output.encoder.is_open() {
            ExporterState::NoOutputOpened
        } else if self.output.blocks_written == 0 {
            ExporterState::OutputOpenNoBlocksWritten
        } else {
            ExporterState::OutputOpenBlocksWritten
        }
    }

    /// Terminate and release the current output, reporting failures.
    ///
    /// The buffered block is not written; call [`Self::write_block`] first
    /// to keep it.
    pub fn close(mut self) -> crate::Result<usize> {
        self.closed = true;
        self.teardown()
    }

    fn teardown(&mut self) -> crate::Result<usize> {
        if !self.block.is_empty() {
            warn!(items = self.block.item_count(), "discarding unwritten C-DNS block");
        }
        self.output.finish()
    }
}

impl Drop for CdnsExporter {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.teardown() {
            warn!(error = %e, "failed to finish C-DNS output");
        }
    }
}
