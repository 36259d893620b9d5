use std::fs;
use std::io::{self, Cursor};

use zstream::{
    compress_stream, compress_to_vec, decompress_stream, decompress_to_vec, CodecSession,
    CompressionLevel, Context, Direction, Error, Format, Totals, WriteSink,
};

fn get_sample(len: usize) -> Vec<u8> {
    let phrase = b"a sink receives every chunk of output as soon as it is ready. ";
    phrase.iter().cycle().take(len).copied().collect()
}

#[test]
fn test_multiple_adds_match_single_add() {
    let input = get_sample(100_000);
    let ctx = Context::new(CompressionLevel::Default, 512);

    let mut whole = Vec::new();
    CodecSession::compressor(&mut whole, Format::Gzip, ctx)
        .unwrap()
        .compress(&input)
        .unwrap();

    let mut pieces = Vec::new();
    {
        let mut session = CodecSession::compressor(&mut pieces, Format::Gzip, ctx).unwrap();
        for part in input.chunks(3_333) {
            session.add(part).unwrap();
        }
        let totals = session.finish().unwrap();
        assert_eq!(totals.read, input.len() as u64);
    }

    let mut single = Vec::new();
    {
        let mut session = CodecSession::compressor(&mut single, Format::Gzip, ctx).unwrap();
        session.add(&input).unwrap();
        session.finish().unwrap();
    }

    assert_eq!(pieces, single);
    assert_eq!(decompress_to_vec(&whole, Format::Gzip).unwrap(), input);
    assert_eq!(decompress_to_vec(&pieces, Format::Gzip).unwrap(), input);
}

#[test]
fn test_sessions_on_separate_threads() {
    fn assert_send<T: Send>() {}
    assert_send::<CodecSession<'static, Vec<u8>>>();

    let handles: Vec<_> = (0..4u8)
        .map(|id| {
            std::thread::spawn(move || {
                let input = vec![id; 50_000];
                let compressed =
                    compress_to_vec(&input, Format::Gzip, CompressionLevel::Default).unwrap();
                (input, compressed)
            })
        })
        .collect();
    for handle in handles {
        let (input, compressed) = handle.join().unwrap();
        assert_eq!(decompress_to_vec(&compressed, Format::Gzip).unwrap(), input);
    }
}

#[test]
fn test_add_is_chainable() {
    let mut out = Vec::new();
    {
        let mut session =
            CodecSession::compressor(&mut out, Format::Zlib, Context::default()).unwrap();
        session.add(b"one, ").unwrap().add(b"two, ").unwrap().add(b"three").unwrap();
        session.finish().unwrap();
    }
    assert_eq!(decompress_to_vec(&out, Format::Zlib).unwrap(), b"one, two, three");
}

#[test]
fn test_drop_finishes_the_pass() {
    let input = get_sample(20_000);
    let mut out = Vec::new();
    {
        let mut session =
            CodecSession::compressor(&mut out, Format::Gzip, Context::default()).unwrap();
        session.add(&input).unwrap();
        // No finish; the trailer is written when the session goes away.
    }
    assert_eq!(decompress_to_vec(&out, Format::Gzip).unwrap(), input);
}

#[test]
fn test_idle_session() {
    let mut out = Vec::new();
    let session = CodecSession::new(&mut out);
    assert!(!session.is_initialised());
    assert_eq!(session.direction(), None);
    assert_eq!(session.format(), None);
    assert_eq!(session.total_in(), 0);
    assert_eq!(session.total_out(), 0);
    drop(session);
    assert!(out.is_empty());
}

#[test]
fn test_init_failure_leaves_session_idle() {
    let mut out = Vec::new();
    let mut session = CodecSession::new(&mut out);
    let res = session.init_compress(Format::Gzip, CompressionLevel::Precise(15));
    assert!(matches!(res, Err(Error::Init(_))));
    assert!(!session.is_initialised());

    // The session can still be set up with valid parameters.
    session
        .init_compress(Format::Gzip, CompressionLevel::Best)
        .unwrap();
    assert_eq!(session.direction(), Some(Direction::Compress));
    assert_eq!(session.format(), Some(Format::Gzip));
    session.compress(b"recovered").unwrap();
    drop(session);
    assert_eq!(decompress_to_vec(&out, Format::Gzip).unwrap(), b"recovered");
}

#[test]
fn test_zero_chunk_size_fails_initialisation() {
    let mut out = Vec::new();
    let ctx = Context::new(CompressionLevel::Default, 0);
    let res = CodecSession::compressor(&mut out, Format::Deflate, ctx);
    assert!(matches!(res, Err(Error::Init(_))));
}

#[test]
fn test_reinit_after_finish() {
    let input = get_sample(5_000);
    let mut out = Vec::new();
    let (first, second) = {
        let mut session = CodecSession::new(&mut out);
        session
            .init_compress(Format::Deflate, CompressionLevel::Fast)
            .unwrap();
        let first = session.compress(&input).unwrap();
        assert!(!session.is_initialised());

        session
            .init_compress(Format::Zlib, CompressionLevel::Best)
            .unwrap();
        session.add(&input).unwrap();
        let second = session.finish().unwrap();
        (first, second)
    };
    assert_eq!(out.len() as u64, first.written + second.written);

    let split = first.written as usize;
    assert_eq!(decompress_to_vec(&out[..split], Format::Deflate).unwrap(), input);
    assert_eq!(decompress_to_vec(&out[split..], Format::Zlib).unwrap(), input);
}

#[test]
fn test_totals_track_the_pass() {
    let input = get_sample(40_000);
    let mut out = Vec::new();
    let totals = {
        let mut session =
            CodecSession::compressor(&mut out, Format::Gzip, Context::default()).unwrap();
        session.add(&input[..10_000]).unwrap();
        assert_eq!(session.total_in(), 10_000);
        assert!(session.total_out() <= 10_000);
        session.add(&input[10_000..]).unwrap();
        session.finish().unwrap()
    };
    assert_eq!(totals.read, 40_000);
    assert_eq!(totals.written, out.len() as u64);
    assert!(totals.ratio() > 10.0);
    assert_eq!(Totals::default().ratio(), 0.0);
}

#[test]
fn test_corrupt_input_fails_the_session() {
    let mut out = Vec::new();
    let mut session =
        CodecSession::decompressor(&mut out, Format::Deflate, Context::default()).unwrap();
    // A final block with the reserved block type.
    let err = session.add(&[0xff; 64]).err().unwrap();
    assert!(err.is_data_error());
    assert!(!session.is_initialised());
}

#[test]
fn test_truncated_stream_is_reported() {
    let input = get_sample(10_000);
    for format in [Format::Deflate, Format::Zlib, Format::Gzip] {
        let compressed = compress_to_vec(&input, format, CompressionLevel::Default).unwrap();
        for cut in [compressed.len() / 2, compressed.len() - 1] {
            let res = decompress_to_vec(&compressed[..cut], format);
            assert!(matches!(res, Err(Error::Truncated)), "{:?} cut at {}", format, cut);
        }
    }
    assert!(matches!(
        decompress_to_vec(&[], Format::Gzip),
        Err(Error::Truncated)
    ));
}

#[test]
fn test_gzip_trailer_is_verified() {
    let input = get_sample(3_000);
    let compressed = compress_to_vec(&input, Format::Gzip, CompressionLevel::Default).unwrap();

    let mut bad_crc = compressed.clone();
    let at = bad_crc.len() - 8;
    bad_crc[at] ^= 1;
    assert!(matches!(
        decompress_to_vec(&bad_crc, Format::Gzip),
        Err(Error::Corrupt(_))
    ));

    let mut bad_len = compressed;
    let at = bad_len.len() - 4;
    bad_len[at] ^= 1;
    assert!(matches!(
        decompress_to_vec(&bad_len, Format::Gzip),
        Err(Error::Corrupt(_))
    ));
}

#[test]
fn test_preset_dictionary_is_a_data_error() {
    // A zlib header with the FDICT flag set, followed by the dictionary id.
    let stream = [0x78, 0x20, 0x00, 0x00, 0x00, 0x01];
    let err = decompress_to_vec(&stream, Format::Zlib).err().unwrap();
    assert!(
        matches!(
            err,
            Error::NeedDictionary(_) | Error::Corrupt(_) | Error::Truncated
        ),
        "{:?}",
        err
    );
    assert!(err.is_data_error());
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_bad_gzip_magic() {
    let res = decompress_to_vec(b"plain text, not gzip", Format::Gzip);
    assert!(matches!(res, Err(Error::Corrupt(_))));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "session misuse")]
fn test_finish_twice_panics_in_debug() {
    let mut out = Vec::new();
    let mut session =
        CodecSession::compressor(&mut out, Format::Gzip, Context::default()).unwrap();
    session.finish().unwrap();
    let _ = session.finish();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "session misuse")]
fn test_add_before_init_panics_in_debug() {
    let mut out = Vec::new();
    let mut session = CodecSession::new(&mut out);
    let _ = session.add(b"too early");
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "session misuse")]
fn test_decompress_on_compressor_panics_in_debug() {
    let mut out = Vec::new();
    let mut session =
        CodecSession::compressor(&mut out, Format::Zlib, Context::default()).unwrap();
    let _ = session.decompress(b"wrong direction");
}

#[test]
fn test_write_sink_forwards_output() {
    let input = get_sample(30_000);
    let mut sink = WriteSink::new(Cursor::new(Vec::new()));
    let totals = {
        let mut session =
            CodecSession::compressor(&mut sink, Format::Zlib, Context::default()).unwrap();
        session.compress(&input).unwrap()
    };
    assert_eq!(sink.written(), totals.written);
    let cursor = sink.into_inner().unwrap();
    let compressed = cursor.into_inner();
    assert_eq!(compressed.len() as u64, totals.written);
    assert_eq!(decompress_to_vec(&compressed, Format::Zlib).unwrap(), input);
}

#[test]
fn test_stream_helpers_with_small_blocks() {
    let input = get_sample(64_000);
    let ctx = Context::new(CompressionLevel::Best, 100).with_read_block(7);

    let mut compressed = Vec::new();
    let totals = compress_stream(&input[..], &mut compressed, Format::Gzip, ctx).unwrap();
    assert_eq!(totals.read, input.len() as u64);
    assert_eq!(totals.written, compressed.len() as u64);

    let mut decompressed = Vec::new();
    let totals = decompress_stream(&compressed[..], &mut decompressed, Format::Gzip, ctx).unwrap();
    assert_eq!(totals.read, compressed.len() as u64);
    assert_eq!(decompressed, input);
}

#[test]
fn test_stream_helpers_on_files() {
    let dir = std::env::temp_dir();
    let id = std::process::id();
    let plain = dir.join(format!("zstream-session-{}.txt", id));
    let packed = dir.join(format!("zstream-session-{}.txt.gz", id));
    let unpacked = dir.join(format!("zstream-session-{}.out", id));

    let input = get_sample(250_000);
    fs::write(&plain, &input).unwrap();

    let ctx = Context::default();
    let totals = compress_stream(
        fs::File::open(&plain).unwrap(),
        fs::File::create(&packed).unwrap(),
        Format::Gzip,
        ctx,
    )
    .unwrap();
    assert_eq!(totals.written, fs::metadata(&packed).unwrap().len());

    decompress_stream(
        fs::File::open(&packed).unwrap(),
        fs::File::create(&unpacked).unwrap(),
        Format::Gzip,
        ctx,
    )
    .unwrap();
    assert_eq!(fs::read(&unpacked).unwrap(), input);

    for path in [plain, packed, unpacked] {
        let _ = fs::remove_file(path);
    }
}
