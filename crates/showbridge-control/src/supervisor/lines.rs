//! Line framing for child process output

/// Accumulates output chunks and yields complete lines.
///
/// The trailing partial line is kept until the chunk that completes it
/// arrives. Works on bytes so multi-byte characters split across chunks
/// survive.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, without the
    /// line terminator.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Bytes of the incomplete trailing line
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Parse one output line as JSON. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<serde_json::Result<serde_json::Value>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_partial_line() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"measured\":").is_empty());
        assert_eq!(buffer.pending_len(), 12);

        let lines = buffer.push(b"60}\n{\"measured\":61}\n{\"mea");
        assert_eq!(lines, vec!["{\"measured\":60}", "{\"measured\":61}"]);
        assert_eq!(buffer.pending_len(), 5);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"a\r\n\nb\n");
        assert_eq!(lines, vec!["a", "", "b"]);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn test_split_utf8() {
        let mut buffer = LineBuffer::new();
        let text = "dB\u{00B0}\n".as_bytes();
        assert!(buffer.push(&text[..3]).is_empty());
        assert_eq!(buffer.push(&text[3..]), vec!["dB\u{00B0}"]);
    }

    #[test]
    fn test_parse_line() {
        assert!(parse_line("   ").is_none());
        assert!(parse_line("{\"measured\": 60}").unwrap().is_ok());
        assert!(parse_line("not json").unwrap().is_err());
    }
}
