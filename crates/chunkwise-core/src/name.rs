//! Chunk artifact naming: `{base}_chunk_{index}`.

/// Separator between the source file's base name and the chunk index.
pub const CHUNK_MARKER: &str = "_chunk_";

/// Zero-padding width used when nothing else is configured.
pub const DEFAULT_INDEX_WIDTH: usize = 5;

/// Format the artifact name for chunk `index` of `base`.
///
/// ```
/// use chunkwise_core::chunk_name;
///
/// assert_eq!(chunk_name("game.zip", 7, 5), "game.zip_chunk_00007");
/// assert_eq!(chunk_name("game.zip", 123456, 5), "game.zip_chunk_123456");
/// ```
pub fn chunk_name(base: &str, index: u64, width: usize) -> String {
    format!("{base}{CHUNK_MARKER}{index:0width$}")
}

/// Split a chunk name into its base name and index.
///
/// Padded and unpadded suffixes are both accepted. Returns `None` when the
/// name carries no marker or the suffix is not a plain decimal number.
pub fn parse_chunk_name(name: &str) -> Option<(&str, u64)> {
    let (base, digits) = name.rsplit_once(CHUNK_MARKER)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|index| (base, index))
}

/// Smallest padding width that keeps `num_chunks` names in numeric order
/// when sorted as strings.
pub fn required_width(num_chunks: u64) -> usize {
    let max_index = num_chunks.saturating_sub(1);
    max_index.checked_ilog10().map_or(1, |digits| digits as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_padded_and_unpadded() {
        assert_eq!(parse_chunk_name("a.zip_chunk_00012"), Some(("a.zip", 12)));
        assert_eq!(parse_chunk_name("a.zip_chunk_12"), Some(("a.zip", 12)));
        assert_eq!(parse_chunk_name("a_chunk_b.bin_chunk_3"), Some(("a_chunk_b.bin", 3)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_chunk_name("a.zip"), None);
        assert_eq!(parse_chunk_name("a.zip_chunk_"), None);
        assert_eq!(parse_chunk_name("a.zip_chunk_-1"), None);
        assert_eq!(parse_chunk_name("a.zip_chunk_1a"), None);
        assert_eq!(parse_chunk_name("a.zip_chunk_+1"), None);
    }

    #[test]
    fn test_required_width() {
        assert_eq!(required_width(0), 1);
        assert_eq!(required_width(1), 1);
        assert_eq!(required_width(10), 1);
        assert_eq!(required_width(11), 2);
        assert_eq!(required_width(100_000), 5);
        assert_eq!(required_width(100_001), 6);
    }

    #[test]
    fn test_padded_names_sort_numerically() {
        let width = required_width(1200);
        let mut names: Vec<String> = (0..1200).rev().map(|i| chunk_name("f", i, width)).collect();
        names.sort();
        let indices: Vec<u64> = names.iter().map(|n| parse_chunk_name(n).unwrap().1).collect();
        assert_eq!(indices, (0..1200).collect::<Vec<_>>());
    }
}
