//! Boundary-preferring overlapping text chunker.
//!
//! Splits document text into [`Chunk`]s of at most `max_chars` characters,
//! cutting on the strongest boundary available inside each window: paragraph
//! break, then line break, then sentence terminator, then whitespace, with a
//! hard cut as the last resort for unbroken token runs. Consecutive chunks
//! share `overlap_chars` characters of context so retrieval never loses the
//! sentence that straddles a cut.
//!
//! Each chunk is a verbatim slice of the (newline-normalized) input, so
//! dropping every non-first chunk's overlap prefix and concatenating the rest
//! reproduces the normalized document exactly. Splitting is pure: identical
//! input yields identical output on every call.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Chunker parameters.
///
/// `max_chars` must be strictly greater than `overlap_chars`; otherwise the
/// overlap step could not advance through the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum characters per chunk
    pub max_chars: usize,
    /// Characters of context repeated from the end of the previous chunk
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 200,
        }
    }
}

impl ChunkerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars,
            overlap_chars,
        }
    }

    /// Validate the parameter combination
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(Error::InvalidConfiguration {
                field: "max_chars".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.overlap_chars >= self.max_chars {
            return Err(Error::InvalidConfiguration {
                field: "overlap_chars".to_string(),
                message: format!(
                    "must be less than max_chars ({} >= {})",
                    self.overlap_chars, self.max_chars
                ),
            });
        }
        Ok(())
    }
}

/// A bounded, positioned segment of a source document, the unit of retrieval.
///
/// Immutable once created; a document's chunk set is only ever replaced
/// wholesale by re-ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identity derived from the document id and ordinal
    pub chunk_id: String,
    /// Owning document id
    pub document_id: String,
    /// 0-based position within the document's chunk sequence
    pub ordinal: usize,
    /// Chunk text (non-empty, at most `max_chars` characters)
    pub text: String,
    /// Character span `(start, end)` in the normalized source document
    pub char_span: (usize, usize),
    /// Characters shared with the end of the previous chunk
    pub overlap_with_previous: usize,
}

/// Normalize line endings so spans and reconstruction are well defined.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Reassemble chunk texts into the normalized source document.
///
/// Expects the chunks ordered by `ordinal`; each non-first chunk contributes
/// everything after its overlap prefix.
#[must_use]
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.extend(chunk.text.chars().skip(chunk.overlap_with_previous));
    }
    out
}

/// Split `text` into ordered, overlapping chunks.
///
/// Empty input produces an empty sequence; input no longer than `max_chars`
/// produces a single chunk with zero overlap. Fails with
/// [`Error::InvalidConfiguration`] when the parameters are inconsistent.
pub fn split(document_id: &str, text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    let normalized = normalize_text(text);
    let chars: Vec<char> = normalized.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut prev_cut = 0usize;
    let mut ordinal = 0usize;

    loop {
        let cut = if chars.len() - start <= config.max_chars {
            chars.len()
        } else {
            find_cut(&chars, prev_cut.max(start), start + config.max_chars)
        };

        chunks.push(Chunk {
            chunk_id: format!("{}#{}", document_id, ordinal),
            document_id: document_id.to_string(),
            ordinal,
            text: chars[start..cut].iter().collect(),
            char_span: (start, cut),
            overlap_with_previous: prev_cut.saturating_sub(start),
        });

        if cut == chars.len() {
            break;
        }

        ordinal += 1;
        prev_cut = cut;
        // Step back for overlap, but never give up forward progress: the
        // clamp keeps the window start strictly advancing even when
        // overlap_chars is close to max_chars.
        start = cut.saturating_sub(config.overlap_chars).max(start + 1);
    }

    Ok(chunks)
}

/// Find the best cut point `p` with `floor < p <= limit`.
///
/// Boundary preference, strongest first: end of a paragraph break, end of a
/// line, after a sentence terminator, after any whitespace. Falls back to a
/// hard cut at `limit` when the window contains no boundary at all.
fn find_cut(chars: &[char], floor: usize, limit: usize) -> usize {
    debug_assert!(floor < limit && limit < chars.len());

    let paragraph = |c: &[char], p: usize| p >= 2 && c[p - 1] == '\n' && c[p - 2] == '\n';
    let line = |c: &[char], p: usize| c[p - 1] == '\n';
    let sentence = |c: &[char], p: usize| {
        matches!(c[p - 1], '.' | '!' | '?') && (p == c.len() || c[p].is_whitespace())
    };
    let whitespace = |c: &[char], p: usize| c[p - 1].is_whitespace();

    rfind_cut(chars, floor, limit, paragraph)
        .or_else(|| rfind_cut(chars, floor, limit, line))
        .or_else(|| rfind_cut(chars, floor, limit, sentence))
        .or_else(|| rfind_cut(chars, floor, limit, whitespace))
        .unwrap_or(limit)
}

/// Latest position in `(floor, limit]` satisfying `pred`, if any.
fn rfind_cut<F>(chars: &[char], floor: usize, limit: usize, pred: F) -> Option<usize>
where
    F: Fn(&[char], usize) -> bool,
{
    let mut p = limit;
    while p > floor {
        if pred(chars, p) {
            return Some(p);
        }
        p -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_chars: usize, overlap_chars: usize) -> ChunkerConfig {
        ChunkerConfig::new(max_chars, overlap_chars)
    }

    #[test]
    fn test_empty_input() {
        let chunks = split("doc1", "", &cfg(100, 10)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_input_single_chunk() {
        let chunks = split("doc1", "Hello, world!", &cfg(100, 10)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[0].overlap_with_previous, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].char_span, (0, 13));
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(split("doc1", "text", &cfg(0, 0)).is_err());
        assert!(split("doc1", "text", &cfg(10, 10)).is_err());
        assert!(split("doc1", "text", &cfg(10, 20)).is_err());
        // overlap_chars = 0 is legal
        assert!(split("doc1", "text", &cfg(10, 0)).is_ok());
    }

    #[test]
    fn test_length_bound_holds() {
        let text = "word ".repeat(500);
        for (max, overlap) in [(50, 10), (80, 0), (100, 99), (37, 5)] {
            let chunks = split("doc1", &text, &cfg(max, overlap)).unwrap();
            for chunk in &chunks {
                assert!(
                    chunk.text.chars().count() <= max,
                    "chunk {} exceeds {} chars",
                    chunk.chunk_id,
                    max
                );
            }
        }
    }

    #[test]
    fn test_reconstruction_is_lossless() {
        let text = "First paragraph with a few sentences. Second sentence here!\n\n\
                    Second paragraph follows after a break.\nA new line inside it.\n\n\
                    Third paragraph is the last one, and it rambles on for a while \
                    so that several cuts are required to cover it completely.";
        for (max, overlap) in [(40, 10), (60, 0), (50, 45), (25, 8)] {
            let chunks = split("doc1", text, &cfg(max, overlap)).unwrap();
            assert!(chunks.len() > 1);
            assert_eq!(
                reassemble(&chunks),
                normalize_text(text),
                "reconstruction failed for max={} overlap={}",
                max,
                overlap
            );
        }
    }

    #[test]
    fn test_split_is_restartable() {
        let text = "Alpha beta gamma. Delta epsilon zeta.\n\nEta theta iota kappa lambda.";
        let first = split("doc1", text, &cfg(30, 8)).unwrap();
        let second = split("doc1", text, &cfg(30, 8)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let text = format!("{}\n\n{}", "a".repeat(20), "b".repeat(50));
        let chunks = split("doc1", &text, &cfg(40, 0)).unwrap();
        // First cut lands right after the paragraph break, not mid-b-run.
        assert_eq!(chunks[0].char_span.1, 22);
        assert!(chunks[0].text.ends_with("\n\n"));
    }

    #[test]
    fn test_prefers_sentence_boundary_over_whitespace() {
        let text = "One two three four. five six seven eight nine ten eleven twelve";
        let chunks = split("doc1", text, &cfg(30, 0)).unwrap();
        assert_eq!(chunks[0].text, "One two three four.");
    }

    #[test]
    fn test_hard_cut_on_unbroken_run() {
        let text = "x".repeat(250);
        let chunks = split("doc1", &text, &cfg(100, 0)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].char_span, (0, 100));
        assert_eq!(chunks[1].char_span, (100, 200));
        assert_eq!(chunks[2].char_span, (200, 250));
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_overlap_near_max_terminates() {
        // overlap one below max forces the forward-progress clamp
        let text = "words and more words ".repeat(40);
        let chunks = split("doc1", &text, &cfg(20, 19)).unwrap();
        assert!(!chunks.is_empty());
        for pair in chunks.windows(2) {
            assert!(pair[1].char_span.0 > pair[0].char_span.0);
            assert!(pair[1].char_span.1 > pair[0].char_span.1);
        }
        assert_eq!(reassemble(&chunks), normalize_text(&text));
    }

    #[test]
    fn test_overlap_matches_previous_suffix() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        let chunks = split("doc1", &text, &cfg(60, 15)).unwrap();
        for pair in chunks.windows(2) {
            let overlap = pair[1].overlap_with_previous;
            assert!(overlap <= 15);
            let prev: Vec<char> = pair[0].text.chars().collect();
            let suffix: String = prev[prev.len() - overlap..].iter().collect();
            let prefix: String = pair[1].text.chars().take(overlap).collect();
            assert_eq!(suffix, prefix);
        }
    }

    #[test]
    fn test_chunk_ids_stable_and_ordinals_contiguous() {
        let text = "sentence one. sentence two. sentence three. ".repeat(8);
        let chunks = split("policy-doc", &text, &cfg(50, 10)).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
            assert_eq!(chunk.chunk_id, format!("policy-doc#{}", i));
            assert_eq!(chunk.document_id, "policy-doc");
        }
    }

    #[test]
    fn test_crlf_normalization() {
        let text = "line one\r\nline two\r\rline three";
        let chunks = split("doc1", text, &cfg(100, 0)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "line one\nline two\n\nline three");
    }

    #[test]
    fn test_multibyte_text_spans() {
        let text = "문서 내용은 여러 문장으로 이루어져 있습니다. 두 번째 문장입니다. ".repeat(6);
        let chunks = split("doc1", &text, &cfg(40, 10)).unwrap();
        let normalized = normalize_text(&text);
        let total_chars = normalized.chars().count();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 40);
            let (start, end) = chunk.char_span;
            assert!(start < end && end <= total_chars);
        }
        assert_eq!(reassemble(&chunks), normalized);
    }

    #[test]
    fn test_three_hundred_char_policy_is_one_chunk() {
        let text = "v".repeat(300);
        let chunks = split("vacation-policy", &text, &cfg(1000, 200)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].overlap_with_previous, 0);
    }
}
