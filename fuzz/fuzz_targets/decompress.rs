#![no_main]

use libfuzzer_sys::fuzz_target;
use zstream::{decompress_to_vec, Format};

fuzz_target!(|data: &[u8]| {
    for format in [Format::Deflate, Format::Zlib, Format::Gzip] {
        let _ = decompress_to_vec(data, format);
    }
});
