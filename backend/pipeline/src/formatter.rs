//! Splits a transcript into message-sized segments.
//!
//! Segments are exact substrings of the input: joined back together they
//! reproduce the text byte for byte. Lengths are counted in chars. Break
//! preference, latest position first: newline, sentence end, any whitespace,
//! hard cut. Newline and sentence breaks only count in the back half of the
//! window so a stray early line break does not produce a tiny segment.

/// One bounded chunk of a transcript, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub index: usize,
    pub text: String,
}

/// Lazy, restartable segmentation of `text` into chunks of at most
/// `max_chars` chars. Empty input yields exactly one empty segment.
pub fn chunk(text: &str, max_chars: usize) -> Segments<'_> {
    Segments {
        text,
        pos: 0,
        max_chars: max_chars.max(1),
        index: 0,
        finished: false,
    }
}

#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
    max_chars: usize,
    index: usize,
    finished: bool,
}

impl<'a> Segments<'a> {
    fn emit(&mut self, piece: &'a str) -> TranscriptSegment {
        let segment = TranscriptSegment {
            index: self.index,
            text: piece.to_string(),
        };
        self.index += 1;
        segment
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = TranscriptSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.text.is_empty() {
            self.finished = true;
            return Some(self.emit(""));
        }
        if self.pos >= self.text.len() {
            self.finished = true;
            return None;
        }

        let rest = &self.text[self.pos..];
        let window_end = rest
            .char_indices()
            .nth(self.max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let cut = if window_end == rest.len() {
            rest.len()
        } else {
            find_break(&rest[..window_end], self.max_chars)
        };

        self.pos += cut;
        Some(self.emit(&rest[..cut]))
    }
}

/// Byte offset to cut `window` at. The separator stays with the left part.
fn find_break(window: &str, max_chars: usize) -> usize {
    let half = window
        .char_indices()
        .nth(max_chars / 2)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut newline = None;
    let mut sentence = None;
    let mut space = None;
    let mut prev: Option<char> = None;
    for (i, c) in window.char_indices() {
        let after = i + c.len_utf8();
        if c == '\n' {
            newline = Some(after);
        }
        if c.is_whitespace() {
            space = Some(after);
            if matches!(prev, Some('.' | '!' | '?' | '…')) {
                sentence = Some(after);
            }
        }
        prev = Some(c);
    }

    newline
        .filter(|&cut| cut > half)
        .or(sentence.filter(|&cut| cut > half))
        .or(space)
        .unwrap_or(window.len())
}
