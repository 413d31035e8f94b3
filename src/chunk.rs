//! Fixed-width text chunker.
//!
//! Splits document text into [`Chunk`]s of at most `chunk_size` characters.
//! Chunks are contiguous and never overlap, so joining them in order
//! reproduces the input exactly. Boundaries are counted in `char`s, which
//! keeps every chunk valid UTF-8 regardless of the script the document uses.

use crate::models::Chunk;

/// Number of chunks `split_text` produces for a text of `len` characters.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size).max(1)
}

/// Split text into chunks of `chunk_size` characters; the last one may be shorter.
/// Returns chunks with contiguous indices starting at 0.
///
/// # Panics
///
/// Panics if `chunk_size` is zero. Configuration loading rejects that value.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<Chunk> {
    assert!(chunk_size > 0, "chunk_size must be > 0");

    // Guarantee at least one chunk
    if text.is_empty() {
        return vec![Chunk {
            index: 0,
            offset: 0,
            text: String::new(),
        }];
    }

    let mut chunks = Vec::new();
    let mut start_byte = 0;
    let mut offset = 0;
    let mut taken = 0;

    for (byte_idx, _) in text.char_indices() {
        if taken == chunk_size {
            chunks.push(Chunk {
                index: chunks.len(),
                offset,
                text: text[start_byte..byte_idx].to_string(),
            });
            offset += taken;
            start_byte = byte_idx;
            taken = 0;
        }
        taken += 1;
    }

    // Flush remaining
    chunks.push(Chunk {
        index: chunks.len(),
        offset,
        text: text[start_byte..].to_string(),
    });

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = split_text("Hello, world!", 4000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text() {
        let chunks = split_text("", 4000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "");
        assert_eq!(chunk_count(0, 4000), 1);
    }

    #[test]
    fn test_exact_multiple() {
        let chunks = split_text("abcdef", 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "def"]);
        assert_eq!(chunks[1].offset, 3);
    }

    #[test]
    fn test_last_chunk_truncated() {
        let chunks = split_text("abcdefg", 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_count_and_concatenation() {
        let text = (0..250)
            .map(|i| format!("Sentence number {}.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let len = text.chars().count();
        for size in [1, 7, 64, 100, 4000] {
            let chunks = split_text(&text, size);
            assert_eq!(chunks.len(), len.div_ceil(size), "size {}", size);
            assert_eq!(chunks.len(), chunk_count(len, size));
            let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(joined, text, "size {}", size);
            for (i, c) in chunks.iter().enumerate() {
                assert_eq!(c.index, i);
                assert!(!c.text.is_empty());
                assert!(c.text.chars().count() <= size);
            }
        }
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "캠핑장 예약 플랫폼";
        let chunks = split_text(text, 2);
        assert_eq!(chunks.len(), text.chars().count().div_ceil(2));
        assert_eq!(chunks[0].text, "캠핑");
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(chunks[2].offset, 4);
    }
}
