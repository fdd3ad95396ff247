use crate::error::ProcessError;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 200,
            separator: "\n".to_string(),
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.chunk_size == 0 {
            return Err(ProcessError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ProcessError::InvalidChunkConfig(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits a document into chunks of at most `chunk_size` characters,
/// preferring boundaries at `separator` occurrences and carrying up to
/// `chunk_overlap` trailing characters into the next chunk.
///
/// A single separator-free unit longer than `chunk_size` is never merged
/// with its neighbors; it is emitted on its own and window-split with
/// stride `chunk_size - chunk_overlap`, so content is never truncated.
/// Same input and config always produce the same sequence. An empty
/// document yields an empty sequence.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let separator = config.separator.as_str();
    let separator_len = separator.chars().count();

    let units: Vec<&str> = if separator.is_empty() {
        vec![text]
    } else {
        text.split(separator).filter(|unit| !unit.is_empty()).collect()
    };

    let mut merged: Vec<String> = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for unit in units {
        let unit_len = unit.chars().count();
        let joined_len = total + unit_len + if current.is_empty() { 0 } else { separator_len };

        if joined_len > config.chunk_size && !current.is_empty() {
            merged.push(join_units(&current, separator));

            // Retain at most chunk_overlap trailing characters, and make
            // room for the incoming unit.
            while !current.is_empty()
                && (total > config.chunk_overlap
                    || total + unit_len + separator_len > config.chunk_size)
            {
                let removed = current.pop_front().map(|u| u.chars().count()).unwrap_or(0);
                total -= removed + if current.is_empty() { 0 } else { separator_len };
            }
        }

        total += unit_len + if current.is_empty() { 0 } else { separator_len };
        current.push_back(unit);
    }

    if !current.is_empty() {
        merged.push(join_units(&current, separator));
    }

    let mut chunks = Vec::new();
    for chunk in merged {
        let char_count = chunk.chars().count();
        if char_count <= config.chunk_size {
            chunks.push(chunk);
            continue;
        }

        let chars: Vec<char> = chunk.chars().collect();
        let stride = config
            .chunk_size
            .saturating_sub(config.chunk_overlap)
            .max(1);
        let mut start = 0;
        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += stride;
        }
    }

    chunks
}

fn join_units(units: &VecDeque<&str>, separator: &str) -> String {
    units
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::{split_text, ChunkingConfig};

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
            separator: "\n".to_string(),
        }
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let chunks = split_text("", &ChunkingConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = "first line\nsecond line\nthird line\n".repeat(60);
        let config = ChunkingConfig::default();
        assert_eq!(split_text(&text, &config), split_text(&text, &config));
    }

    #[test]
    fn chunks_respect_size_bound_when_no_unit_is_oversized() {
        let text = "a short line of text\n".repeat(200);
        let chunks = split_text(&text, &ChunkingConfig::default());
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1_000);
        }
    }

    fn shared_overlap(previous: &str, next: &str) -> usize {
        (1..=next.len())
            .rev()
            .find(|&len| previous.ends_with(&next[..len]))
            .unwrap_or(0)
    }

    #[test]
    fn consecutive_chunks_carry_overlap() {
        let text = (0..40)
            .map(|n| format!("line number {n:03} with some padding text"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = split_text(&text, &config(200, 80));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let overlap = shared_overlap(&pair[0], &pair[1]);
            assert!(overlap > 0, "next chunk should start with a tail of the previous one");
            assert!(overlap <= 80);
        }
    }

    #[test]
    fn oversized_unit_is_window_split_not_truncated() {
        let text = "A".repeat(1_500);
        let chunks = split_text(&text, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 1_000);
        assert_eq!(chunks[1].chars().count(), 700);
        assert_eq!(&chunks[0][800..], &chunks[1][..200]);
    }

    #[test]
    fn oversized_unit_keeps_all_content() {
        let text = format!("intro\n{}\noutro", "B".repeat(450));
        let chunks = split_text(&text, &config(100, 20));
        let joined = chunks.concat();
        assert!(joined.contains("intro"));
        assert!(joined.contains("outro"));
        assert!(joined.matches('B').count() >= 450);
    }

    #[test]
    fn splitting_prefers_separator_boundaries() {
        let text = "alpha\nbeta\ngamma";
        let chunks = split_text(text, &config(11, 4));
        assert_eq!(chunks[0], "alpha\nbeta");
        assert!(chunks[1].ends_with("gamma"));
    }
}
