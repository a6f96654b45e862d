use super::cleaner::clean_line;

/// Reassembles complete lines from an arbitrary stream of byte chunks.
///
/// Bytes are buffered until a newline arrives, so multi-byte UTF-8
/// characters and escape sequences split across chunk boundaries decode
/// correctly. The produced lines depend only on the byte stream, never on
/// how it was chunked.
pub struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed a chunk and return every completed, cleaned, non-empty line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let cleaned = clean_line(&text);
            if !cleaned.is_empty() {
                lines.push(cleaned);
            }
        }
        lines
    }

    /// Drain any partial trailing line, cleaned, if it has visible content
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        let cleaned = clean_line(&String::from_utf8_lossy(&raw));
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut assembler = LineAssembler::new();
        assert_eq!(assembler.push(b"hello\n"), vec!["hello"]);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut assembler = LineAssembler::new();
        assert!(assembler.push(b"hel").is_empty());
        assert!(assembler.push(b"lo").is_empty());
        assert_eq!(assembler.push(b" world\n"), vec!["hello world"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut assembler = LineAssembler::new();
        assert_eq!(assembler.push(b"one\ntwo\nthree\n"), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_crlf_only_line_suppressed() {
        let mut assembler = LineAssembler::new();
        assert!(assembler.push(b"\r\n").is_empty());
        assert!(assembler.flush().is_none());
    }

    #[test]
    fn test_escape_heavy_stream() {
        let mut assembler = LineAssembler::new();
        let mut lines = assembler.push(b"\x1b[2Khello\n");
        lines.extend(assembler.push(b"wor"));
        lines.extend(assembler.push(b"ld\x07\n"));
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut assembler = LineAssembler::new();
        let bytes = "温度\n".as_bytes();
        assert!(assembler.push(&bytes[..2]).is_empty());
        assert_eq!(assembler.push(&bytes[2..]), vec!["温度"]);
    }

    #[test]
    fn test_flush_returns_partial_line() {
        let mut assembler = LineAssembler::new();
        assembler.push(b"no newline yet");
        assert_eq!(assembler.flush(), Some("no newline yet".to_string()));
        assert_eq!(assembler.flush(), None);
    }

    #[test]
    fn test_flush_suppresses_control_only_tail() {
        let mut assembler = LineAssembler::new();
        assembler.push(b"\x1b[2K\x07");
        assert_eq!(assembler.flush(), None);
    }
}
