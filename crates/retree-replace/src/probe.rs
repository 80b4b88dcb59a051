//! Binary file detection.

use std::io::{self, Read};

use memchr::memchr;

/// Number of leading bytes inspected when classifying a file.
pub const PROBE_LEN: u64 = 8000;

/// Reads up to [`PROBE_LEN`] bytes from the front of `reader`.
pub(crate) fn read_head<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut head = Vec::new();
    reader.by_ref().take(PROBE_LEN).read_to_end(&mut head)?;
    Ok(head)
}

/// Treats content with a NUL byte in its head as binary, as `diff` and `grep`
/// do.
#[must_use]
pub fn is_binary(head: &[u8]) -> bool {
    memchr(0, head).is_some()
}
