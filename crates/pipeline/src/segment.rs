//! Punctuation-boundary segmentation of streamed model text.

use unicode_segmentation::UnicodeSegmentation;

/// Characters that may end a speakable segment. Covers ASCII and
/// full-width CJK punctuation since replies mix both.
const BOUNDARY_CHARS: &[char] = &[
    ',', '.', '?', '!', ';', ':', '，', '。', '？', '！', '；', '：',
];

/// Accumulates streamed tokens and cuts speakable segments at
/// punctuation boundaries.
///
/// A segment is cut only when it has at least `max(2, chars already
/// flushed)` characters, so the first segments are short (low latency)
/// and later ones grow, avoiding choppy playback of single characters.
/// The unflushed tail is returned by [`SegmentBuffer::flush_tail`]
/// with no minimum-length check.
#[derive(Default)]
pub struct SegmentBuffer {
    full: String,
    pending: String,
    flushed_len: usize,
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one token. Returns a segment when the accumulated text
    /// now ends on a boundary character and meets the minimum length.
    pub fn push(&mut self, token: &str) -> Option<String> {
        self.full.push_str(token);
        self.pending.push_str(token);

        let last = self.pending.chars().last()?;
        if !BOUNDARY_CHARS.contains(&last) {
            return None;
        }

        let min_len = self.flushed_len.max(2);
        let pending_len = self.pending.graphemes(true).count();
        if pending_len < min_len {
            return None;
        }

        self.flushed_len += pending_len;
        Some(std::mem::take(&mut self.pending))
    }

    /// Flush whatever is left after the stream ends. Whitespace-only
    /// tails are discarded.
    pub fn flush_tail(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.pending);
        if tail.trim().is_empty() {
            None
        } else {
            self.flushed_len += tail.graphemes(true).count();
            Some(tail)
        }
    }

    /// Everything accumulated so far, flushed or not.
    pub fn full_text(&self) -> &str {
        &self.full
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_at_punctuation() {
        let mut buf = SegmentBuffer::new();
        assert_eq!(buf.push("Hello"), None);
        assert_eq!(buf.push(" there,"), Some("Hello there,".to_string()));
        assert_eq!(buf.push(" how are"), None);
        assert_eq!(buf.push(" you?"), Some(" how are you?".to_string()));
        assert_eq!(buf.flush_tail(), None);
        assert_eq!(buf.full_text(), "Hello there, how are you?");
    }

    #[test]
    fn single_character_segment_is_held_back() {
        let mut buf = SegmentBuffer::new();
        assert_eq!(buf.push(","), None);
        assert_eq!(buf.push(" ok."), Some(", ok.".to_string()));
    }

    #[test]
    fn minimum_grows_with_flushed_length() {
        let mut buf = SegmentBuffer::new();
        assert_eq!(buf.push("Yes,"), Some("Yes,".to_string()));
        // next boundary at 3 chars < 4 already flushed, so it waits
        assert_eq!(buf.push(" I,"), None);
        assert_eq!(buf.push(" will."), Some(" I, will.".to_string()));
    }

    #[test]
    fn cjk_punctuation_is_a_boundary() {
        let mut buf = SegmentBuffer::new();
        assert_eq!(buf.push("今天杭州小雨，"), Some("今天杭州小雨，".to_string()));
        assert_eq!(buf.push("记得带伞。"), None); // 5 chars < 7 flushed
        assert_eq!(buf.flush_tail(), Some("记得带伞。".to_string()));
    }

    #[test]
    fn whitespace_tail_is_discarded() {
        let mut buf = SegmentBuffer::new();
        buf.push("Done.");
        buf.push("  ");
        assert_eq!(buf.flush_tail(), None);
    }
}
