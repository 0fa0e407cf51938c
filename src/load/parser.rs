//! Field splitting for the caret-delimited USDA flat files
//!
//! Records look like `~01001~^~0100~^~Butter, salted~^...`: fields are separated
//! by `^`, text fields are wrapped in `~`, and text is Windows-1252 encoded.
//! Trimming happens on the raw bytes, decoding last.

use encoding_rs::WINDOWS_1252;
use std::io::{self, BufRead};

pub const FIELD_SEPARATOR: u8 = b'^';
pub const TEXT_QUOTE: u8 = b'~';

/// Split one raw line into decoded, trimmed fields
pub fn parse_line(line: &[u8]) -> Vec<String> {
    line.split(|b| *b == FIELD_SEPARATOR)
        .map(|field| decode_cp1252(clean_field(field)))
        .collect()
}

/// Strip surrounding whitespace, then surrounding tildes
fn clean_field(field: &[u8]) -> &[u8] {
    trim_matches(field.trim_ascii(), TEXT_QUOTE)
}

fn trim_matches(mut bytes: &[u8], b: u8) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if *first != b {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if *last != b {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Decode legacy Windows-1252 bytes into a UTF-8 string
pub fn decode_cp1252(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Read the next raw line into `buf`, without its terminator
///
/// `\n`, `\r\n` and a bare `\r` all end a line. Returns `false` at end of input.
pub fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    let mut read_any = false;

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(read_any);
        }
        read_any = true;

        match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(end) => {
                let terminator = available[end];
                buf.extend_from_slice(&available[..end]);
                reader.consume(end + 1);

                if terminator == b'\r' && reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                return Ok(true);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

/// Whether a raw line carries no record at all
pub fn is_blank(line: &[u8]) -> bool {
    line.trim_ascii().is_empty()
}
