//! Variable-width length prefixes for protocol words.
//!
//! A word is a length-prefixed byte string. The prefix width is selected by
//! marker bits in the first byte; a zero-length word terminates a sentence
//! and is meaningful, not an error.

/// Append the length prefix for a word of `len` bytes
pub fn encode_length(len: u32, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x4000 {
        out.push(0x80 | (len >> 8) as u8);
        out.push(len as u8);
    } else if len < 0x20_0000 {
        out.push(0xC0 | (len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else if len < 0x1000_0000 {
        out.push(0xE0 | (len >> 24) as u8);
        out.push((len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else {
        out.push(0xF0);
        out.extend_from_slice(&len.to_be_bytes());
    }
}

/// Decode a length prefix from the front of `buf`.
///
/// Returns the decoded length and the number of prefix bytes consumed, or
/// `None` when `buf` holds fewer bytes than the declared width. "Not enough
/// bytes yet" is the only way this can fail; it must never be confused with
/// a protocol error.
pub fn decode_length(buf: &[u8]) -> Option<(u32, usize)> {
    let first = *buf.first()?;
    if first < 0x80 {
        Some((first as u32, 1))
    } else if first < 0xC0 {
        if buf.len() < 2 {
            return None;
        }
        Some((((first & 0x3F) as u32) << 8 | buf[1] as u32, 2))
    } else if first < 0xE0 {
        if buf.len() < 3 {
            return None;
        }
        Some((
            ((first & 0x1F) as u32) << 16 | (buf[1] as u32) << 8 | buf[2] as u32,
            3,
        ))
    } else if first < 0xF0 {
        if buf.len() < 4 {
            return None;
        }
        Some((
            ((first & 0x0F) as u32) << 24
                | (buf[1] as u32) << 16
                | (buf[2] as u32) << 8
                | buf[3] as u32,
            4,
        ))
    } else {
        if buf.len() < 5 {
            return None;
        }
        Some((
            (buf[1] as u32) << 24 | (buf[2] as u32) << 16 | (buf[3] as u32) << 8 | buf[4] as u32,
            5,
        ))
    }
}

/// Append one length-prefixed word
pub fn encode_word(word: &str, out: &mut Vec<u8>) {
    encode_length(word.len() as u32, out);
    out.extend_from_slice(word.as_bytes());
}

/// Encode a full sentence: each word length-prefixed, then the zero-length
/// terminator word
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        encode_word(word.as_ref(), &mut out);
    }
    out.push(0);
    out
}
