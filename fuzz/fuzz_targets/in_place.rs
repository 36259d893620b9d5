#![no_main]

use libfuzzer_sys::fuzz_target;
use zstream::same_buffer::{compress_in_place, decompress_in_place, reserve_headroom};
use zstream::{looks_gzip_compressed, Context, Format};

fuzz_target!(|data: &[u8]| {
    if looks_gzip_compressed(data) {
        return;
    }
    let mut buffer = data.to_vec();
    reserve_headroom(&mut buffer, Format::Zlib);
    compress_in_place(&mut buffer, Format::Zlib, Context::default()).unwrap();
    decompress_in_place(&mut buffer, Format::Zlib, Context::default()).unwrap();
    assert_eq!(buffer, data);
});
