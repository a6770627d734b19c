//! Text chunking with natural-boundary preference

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into overlapping windows of roughly `chunk_size` characters.
///
/// Boundaries are preferred in order: paragraph, sentence, word, and only
/// then a hard character cut. The overlap is taken from the tail of the
/// previous chunk, so consecutive chunks share trailing context.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. Sizes are in characters, not bytes.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Chunk one combined text.
    ///
    /// Text no longer than `chunk_size` characters yields exactly one chunk
    /// with no overlap applied.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        // Tracks whether `current` holds anything beyond the carried
        // overlap, so a window is never closed on overlap text alone.
        let mut fresh = false;

        for segment in self.split_segments(text) {
            if fresh && char_len(&current) + char_len(&segment) > self.chunk_size {
                let finished = current.trim().to_string();
                current = self.overlap_tail(&current);
                fresh = false;
                if !finished.is_empty() {
                    chunks.push(finished);
                }
            }
            current.push_str(&segment);
            fresh = true;
        }

        let last = current.trim();
        if !last.is_empty() {
            chunks.push(last.to_string());
        }

        chunks
    }

    /// Break text into segments no longer than the window, preferring
    /// paragraph, then sentence, then word boundaries.
    fn split_segments(&self, text: &str) -> Vec<String> {
        let mut segments = Vec::new();

        for paragraph in text.split_inclusive("\n\n") {
            if char_len(paragraph) <= self.chunk_size {
                segments.push(paragraph.to_string());
                continue;
            }
            for sentence in paragraph.split_sentence_bounds() {
                if char_len(sentence) <= self.chunk_size {
                    segments.push(sentence.to_string());
                    continue;
                }
                for word in sentence.split_word_bounds() {
                    if char_len(word) <= self.chunk_size {
                        segments.push(word.to_string());
                    } else {
                        segments.extend(hard_cut(word, self.chunk_size));
                    }
                }
            }
        }

        segments
    }

    /// The overlap carried into the next chunk: the previous chunk's tail,
    /// preferably starting at a word boundary.
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.overlap {
            return text.to_string();
        }
        let tail: String = chars[chars.len() - self.overlap..].iter().collect();
        match tail.find(' ') {
            Some(position) if position + 1 < tail.len() => tail[position + 1..].to_string(),
            _ => tail,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn hard_cut(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|piece| piece.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_exactly_one_chunk() {
        let chunker = TextChunker::new(500, 50);
        let text = "질문: 예약 취소는 어떻게 하나요?\n답변: 24시간 전까지 가능합니다.";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = TextChunker::new(100, 10);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n ").is_empty());
    }

    #[test]
    fn long_text_is_split_with_bounded_chunks() {
        let chunker = TextChunker::new(40, 10);
        let sentence = "진료 예약은 전화로 하실 수 있습니다. ";
        let text = sentence.repeat(10);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        // Each window stays within size plus the carried overlap.
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40 + 10, "oversized chunk: {:?}", chunk);
        }
    }

    #[test]
    fn consecutive_chunks_share_overlap_content() {
        let chunker = TextChunker::new(30, 12);
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let head: String = pair[1].chars().take(4).collect();
            assert!(
                pair[0].contains(head.trim()),
                "no shared overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn unbreakable_run_gets_hard_cuts() {
        let chunker = TextChunker::new(10, 2);
        let text = "a".repeat(35);
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        // All content survives the cuts.
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total >= 35);
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_character() {
        let chunker = TextChunker::new(20, 5);
        let text = "가나다라마바사아자차카타파하".repeat(5);
        // Would panic on a byte-level slice inside a syllable.
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
    }
}
