//! Detects data that is already gzip-compressed.
//!
//! The check only looks at the first three bytes. Those bytes are unusual in
//! text, so false positives are rare, but this is a guard against compressing
//! data twice and not a format validator. The third byte is the DEFLATE method
//! byte, which is what `gzip` and `tar zcf` write.

use std::io::{self, Read, Seek, SeekFrom};

use crate::utils::signatures::{match_signature, GZIP_SIG};

/// Returns true if 'bytes' starts with the gzip/DEFLATE magic.
pub fn looks_gzip_compressed(bytes: &[u8]) -> bool {
    match_signature(bytes, &GZIP_SIG)
}

/// Peeks at the next three bytes of 'stream' and reports whether they look
/// like a gzip header. The read position is restored before returning.
pub fn peek_gzip_compressed<R: Read + Seek>(stream: &mut R) -> io::Result<bool> {
    let start = stream.stream_position()?;
    let mut head = [0u8; 3];
    let mut filled = 0;
    let read = loop {
        if filled == head.len() {
            break Ok(());
        }
        match stream.read(&mut head[filled..]) {
            Ok(0) => break Ok(()),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => break Err(err),
        }
    };
    stream.seek(SeekFrom::Start(start))?;
    read?;
    Ok(looks_gzip_compressed(&head[..filled]))
}
