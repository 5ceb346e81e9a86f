//! Write a small gzip-compressed C-DNS file from synthetic traffic.
//!
//! Run with: cargo run --example export_file -- out.cdns.gz

use std::net::{IpAddr, Ipv4Addr};

use cdns::{
    BlockParameters, CdnsExporter, ClassType, Compression, FilePreamble, GenericQueryResponse,
    GenericResourceRecord, QrSigFlags, Result, Timestamp,
};

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "out.cdns.gz".to_string());

    // Small blocks so the run produces several of them.
    let preamble = FilePreamble::with_block_parameters(BlockParameters::with_max_block_items(100));
    let mut exporter = CdnsExporter::new(preamble, path.as_str(), Compression::Gzip)?;

    let names: [&[u8]; 3] = [
        b"\x07example\x03com\x00",
        b"\x07example\x03net\x00",
        b"\x03www\x07example\x03org\x00",
    ];
    let server = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 53));
    let start = Timestamp::now(1_000_000);

    let mut written = 0;
    for i in 0..1_000u32 {
        let client = IpAddr::V4(Ipv4Addr::new(198, 51, 100, (i % 50) as u8));
        let name = names[i as usize % names.len()];
        let ts = Timestamp::new(start.secs + u64::from(i / 100), u64::from(i % 100) * 10_000);

        let qr = GenericQueryResponse {
            ts: Some(ts),
            transaction_id: Some(i as u16),
            query_opcode: Some(0),
            qr_sig_flags: Some(QrSigFlags::HAS_QUERY | QrSigFlags::HAS_RESPONSE),
            query_rcode: Some(0),
            response_rcode: Some(0),
            query_size: Some(40),
            response_size: Some(56),
            response_delay: Some(1_200),
            response_answers: Some(vec![GenericResourceRecord::record(
                name,
                ClassType::new(1, 1),
                300,
                vec![203, 0, 113, (i % 4) as u8],
            )]),
            ..Default::default()
        }
        .with_client(client, 30_000 + (i % 1_000) as u16)
        .with_server(server, 53)
        .with_question(name, ClassType::new(1, 1));

        written += exporter.buffer(&qr)?;
    }

    if exporter.block_item_count() > 0 {
        written += exporter.write_block()?;
    }
    let blocks = exporter.blocks_written();
    written += exporter.close()?;

    println!("{path}: {blocks} blocks, {written} bytes before compression");
    Ok(())
}
