//! The Internet checksum (RFC 1071).
//!
//! The buffer is summed as big-endian 16-bit words, an odd trailing byte is
//! treated as if followed by a zero byte, carries are folded back into the low
//! 16 bits and the one's complement of the result is returned.

/// Calculate the Internet checksum of an arbitrary byte buffer.
///
/// Re-summing a buffer which already carries its own checksum yields zero.
#[must_use]
pub fn checksum(data: &[u8]) -> u16 {
    finalize_checksum(sum_be_words(data))
}

fn sum_be_words(data: &[u8]) -> u64 {
    data.chunks(2)
        .map(|word| match *word {
            [hi, lo] => u64::from(u16::from_be_bytes([hi, lo])),
            [hi] => u64::from(hi) << 8,
            _ => 0,
        })
        .sum()
}

#[expect(clippy::cast_possible_truncation)]
const fn finalize_checksum(mut sum: u64) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}
