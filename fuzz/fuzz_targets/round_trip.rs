#![no_main]

use libfuzzer_sys::fuzz_target;
use zstream::{CodecSession, CompressionLevel, Context, Format};

fuzz_target!(|data: &[u8]| {
    let (chunk, data) = match data.split_first() {
        Some((first, rest)) => (usize::from(*first) + 1, rest),
        None => return,
    };
    let ctx = Context::new(CompressionLevel::Default, chunk);

    let mut compressed: Vec<u8> = Vec::new();
    {
        let mut encoder = CodecSession::compressor(&mut compressed, Format::Gzip, ctx).unwrap();
        let totals = encoder.compress(data).unwrap();
        assert_eq!(totals.written, compressed.len() as u64);
    }

    let mut decompressed: Vec<u8> = Vec::new();
    {
        let mut decoder = CodecSession::decompressor(&mut decompressed, Format::Gzip, ctx).unwrap();
        let totals = decoder.decompress(&compressed).unwrap();
        assert_eq!(totals.read, compressed.len() as u64);
        assert_eq!(totals.written, decompressed.len() as u64);
    }
    assert_eq!(decompressed, data);
});
