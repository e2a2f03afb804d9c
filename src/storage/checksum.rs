//! CRC32 framing checksums for the snapshot log
//!
//! A frame's checksum covers its length prefix and body, so a torn write
//! anywhere in the frame is detected on the next open.

use crc32fast::Hasher;

/// Computes the checksum of a frame from its length prefix and body.
pub fn frame_checksum(length_prefix: [u8; 4], body: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&length_prefix);
    hasher.update(body);
    hasher.finalize()
}

/// Verifies a frame checksum.
pub fn verify_frame(length_prefix: [u8; 4], body: &[u8], expected: u32) -> bool {
    frame_checksum(length_prefix, body) == expected
}
