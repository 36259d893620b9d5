//! A collection of utilities for handling signatures and size bounds.

/// Signatures of the gzip container.
pub mod signatures {
    /// The gzip magic followed by the DEFLATE compression method.
    pub const GZIP_SIG: [u8; 3] = [0x1f, 0x8b, 0x08];
    pub const FILE_EXTENSION: &str = ".gz";

    /// Return True if 'input' starts with 'signature'.
    pub fn match_signature(input: &[u8], signature: &[u8]) -> bool {
        input.starts_with(signature)
    }
}

/// Returns the worst-case compressed size of 'len' input bytes in 'format'.
///
/// This is the bound zlib documents for the default memory level, plus the
/// framing overhead.
pub fn compress_bound(len: usize, format: crate::Format) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13 + format.overhead()
}
