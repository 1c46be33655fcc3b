//! Binary/text classification and line normalization

/// Number of leading bytes inspected by the binary heuristic
pub const BINARY_SNIFF_LEN: usize = 100;

/// Share of control bytes (in percent) in the sniffed prefix above which a buffer
/// is treated as binary
const CONTROL_BYTE_THRESHOLD_PERCENT: usize = 10;

/// Outcome of classifying a raw byte buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Non-text content; the bytes are not trusted to round-trip as a string
    Binary,
    /// UTF-8 text, decoded
    Text(String),
}

impl Classification {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary)
    }

    /// The decoded text, or `None` for binary content.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary => None,
        }
    }
}

/// Classify a raw buffer as binary or text.
///
/// Empty buffers are `Text("")`. A buffer is binary when its first
/// [`BINARY_SNIFF_LEN`] bytes contain a NUL or too many control bytes, or
/// when the full buffer is not valid UTF-8. Decoding failures never error.
pub fn classify(buffer: &[u8]) -> Classification {
    if buffer.is_empty() {
        return Classification::Text(String::new());
    }

    if looks_binary(buffer) {
        return Classification::Binary;
    }

    match std::str::from_utf8(buffer) {
        Ok(text) => Classification::Text(text.to_string()),
        Err(_) => Classification::Binary,
    }
}

/// Byte-pattern heuristic over the sniffed prefix of `buffer`.
pub fn looks_binary(buffer: &[u8]) -> bool {
    let prefix = &buffer[..buffer.len().min(BINARY_SNIFF_LEN)];
    if prefix.is_empty() {
        return false;
    }

    let mut control = 0usize;
    for &byte in prefix {
        if byte == 0 {
            return true;
        }
        if is_control_byte(byte) {
            control += 1;
        }
    }

    control * 100 > prefix.len() * CONTROL_BYTE_THRESHOLD_PERCENT
}

fn is_control_byte(byte: u8) -> bool {
    // tab, LF, form feed, CR, backspace and ESC show up in ordinary text
    (byte < 0x20 && !matches!(byte, b'\t' | b'\n' | 0x0c | b'\r' | 0x08 | 0x1b)) || byte == 0x7f
}

/// Split text into normalized lines.
///
/// `\r\n` is treated as `\n`, trailing whitespace is trimmed from every
/// line, and the newline terminating the last line does not start a new
/// one. Empty text has no lines.
pub fn normalize_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(str::trim_end).collect()
}
