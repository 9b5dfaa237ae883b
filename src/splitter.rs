//! Recursive character text splitter.
//!
//! Splits long text into overlapping chunks, preferring to break at the
//! highest-priority separator present: paragraph, then line, then space,
//! then nowhere (hard character cut). Lengths are `char` counts, not bytes.
use std::collections::VecDeque;

/// Default separator preference order: paragraph, line, space, none.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Create a splitter with the default separator order.
    ///
    /// `chunk_overlap` must be smaller than `chunk_size`.
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(
            chunk_overlap < chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split `text` into chunks of at most `chunk_size` chars (oversized
    /// unsplittable pieces excepted), adjacent chunks sharing up to
    /// `chunk_overlap` chars of context.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Pick the first separator that actually occurs in the text; the
        // empty separator always matches and means per-character splitting.
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut next_separators: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() || text.contains(sep.as_str()) {
                separator = sep.clone();
                next_separators = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(|c| c.to_string()).collect()
        } else {
            text.split(separator.as_str()).map(|s| s.to_string()).collect()
        };

        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<String> = Vec::new();

        for piece in splits {
            if piece.chars().count() < self.chunk_size {
                good_splits.push(piece);
            } else {
                if !good_splits.is_empty() {
                    final_chunks.extend(self.merge_splits(&good_splits, &separator));
                    good_splits.clear();
                }
                if next_separators.is_empty() {
                    final_chunks.push(piece);
                } else {
                    final_chunks.extend(self.split_with(&piece, next_separators));
                }
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, &separator));
        }

        final_chunks
    }

    /// Greedily pack splits into chunks up to `chunk_size`, carrying
    /// `chunk_overlap` chars of trailing context into the next chunk.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = separator.chars().count();
        let mut docs = Vec::new();
        let mut current: VecDeque<&String> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = piece.chars().count();
            let joined_len = total + len + if current.is_empty() { 0 } else { sep_len };

            if joined_len > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_splits(&current, separator) {
                    docs.push(doc);
                }
                // Shrink the window until it fits inside the overlap budget
                // and leaves room for the incoming piece.
                while total > self.chunk_overlap
                    || (total + len + if current.is_empty() { 0 } else { sep_len }
                        > self.chunk_size
                        && total > 0)
                {
                    let first = current.pop_front().expect("window is non-empty");
                    total -= first.chars().count()
                        + if current.is_empty() { 0 } else { sep_len };
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        if let Some(doc) = join_splits(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

fn join_splits(splits: &VecDeque<&String>, separator: &str) -> Option<String> {
    let text = splits
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(separator)
        .trim()
        .to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::new(600, 50);
        let chunks = splitter.split("Just one short paragraph.");
        assert_eq!(chunks, vec!["Just one short paragraph."]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = TextSplitter::new(600, 50);
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let splitter = TextSplitter::new(100, 20);
        let text = "alpha beta gamma. ".repeat(40);
        let a = splitter.split(&text);
        let b = splitter.split(&text);
        assert_eq!(a, b);
        assert!(a.len() >= 2);
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(100, 20);
        let text = "word ".repeat(200);
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 100, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(40, 0);
        let text = "first paragraph here\n\nsecond paragraph here\n\nthird paragraph here";
        let chunks = splitter.split(&text);
        assert_eq!(
            chunks,
            vec![
                "first paragraph here",
                "second paragraph here",
                "third paragraph here"
            ]
        );
    }

    #[test]
    fn test_order_preserved() {
        let splitter = TextSplitter::new(60, 10);
        let paragraphs: Vec<String> = (0..12).map(|i| format!("paragraph number {i:02}")).collect();
        let text = paragraphs.join("\n\n");
        let chunks = splitter.split(&text);

        // Every paragraph appears, and first occurrences are in order
        let mut last_pos = 0;
        for para in &paragraphs {
            let pos = chunks
                .iter()
                .position(|c| c.contains(para.as_str()))
                .unwrap_or_else(|| panic!("{para} missing from chunks"));
            assert!(pos >= last_pos, "out-of-order chunk for {para}");
            last_pos = pos;
        }
    }

    #[test]
    fn test_overlap_carries_context() {
        let splitter = TextSplitter::new(50, 20);
        let text = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen";
        let chunks = splitter.split(&text);
        assert!(chunks.len() >= 2);

        // Some suffix words of chunk N reappear at the start of chunk N+1
        let first_tail = chunks[0].split(' ').next_back().unwrap();
        assert!(
            chunks[1].contains(first_tail),
            "expected overlap between {:?} and {:?}",
            chunks[0],
            chunks[1]
        );
    }

    #[test]
    fn test_unbroken_text_hard_cut() {
        let splitter = TextSplitter::new(30, 5);
        let text = "x".repeat(100);
        let chunks = splitter.split(&text);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
        }
    }

    #[test]
    fn test_multibyte_chars_counted_not_bytes() {
        let splitter = TextSplitter::new(30, 5);
        let text = "日本語のテキスト".repeat(20);
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 30);
        }
    }
}
