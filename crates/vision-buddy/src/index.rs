//! A small in-memory index over local text documents.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use vision_buddy_core::tool::{DocumentIndex, Error as ToolError};

/// Characters per chunk.
pub const CHUNK_SIZE: usize = 500;
/// Characters shared by two neighboring chunks.
pub const CHUNK_OVERLAP: usize = 100;

/// Errors from loading documents into a [`LexicalIndex`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The glob pattern is malformed.
    #[error("invalid document pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// A matched file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

struct Chunk {
    text: String,
    term_counts: HashMap<String, usize>,
}

/// Ranks overlapping chunks of the loaded documents by how many query terms
/// they contain, weighting rare terms higher.
#[derive(Default)]
pub struct LexicalIndex {
    chunks: Vec<Chunk>,
    // Number of chunks each term appears in.
    document_frequency: HashMap<String, usize>,
}

impl LexicalIndex {
    /// Builds an index from in-memory documents.
    pub fn from_documents<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for document in documents {
            for text in split_into_chunks(document.as_ref()) {
                index.insert(text);
            }
        }
        index
    }

    /// Builds an index from the text files matching a glob pattern.
    ///
    /// Paths that cannot be listed are skipped, but a matched file that
    /// cannot be read is an error.
    pub fn load(pattern: &str) -> Result<Self, IndexError> {
        let mut documents = Vec::new();
        for entry in glob::glob(pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!("skipping unreadable path: {err}");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|source| {
                IndexError::Io {
                    path: path.clone(),
                    source,
                }
            })?;
            debug!("loaded {} ({} bytes)", path.display(), text.len());
            documents.push(text);
        }
        let index = Self::from_documents(documents);
        info!("indexed {} chunks from {pattern:?}", index.len());
        Ok(index)
    }

    /// Returns the number of chunks.
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if nothing has been indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn insert(&mut self, text: String) {
        let mut term_counts = HashMap::new();
        for term in terms(&text) {
            *term_counts.entry(term).or_insert(0) += 1;
        }
        for term in term_counts.keys() {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
        self.chunks.push(Chunk { text, term_counts });
    }

    /// Returns the texts of the `k` best chunks for `query`, best first.
    /// Chunks sharing no term with the query are never returned.
    pub fn top_chunks(&self, query: &str, k: usize) -> Vec<&str> {
        let query_terms: HashSet<String> = terms(query).collect();
        let total = self.chunks.len() as f64;

        let mut scored: Vec<(f64, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(idx, chunk)| {
                let score: f64 = query_terms
                    .iter()
                    .filter_map(|term| {
                        let tf = *chunk.term_counts.get(term)? as f64;
                        let df = self.document_frequency[term] as f64;
                        Some((1.0 + tf.ln()) * (1.0 + total / df).ln())
                    })
                    .sum();
                (score > 0.0).then_some((score, idx))
            })
            .collect();
        // Ties keep document order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(k)
            .map(|(_, idx)| self.chunks[idx].text.as_str())
            .collect()
    }
}

#[async_trait]
impl DocumentIndex for LexicalIndex {
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<String>, ToolError> {
        Ok(self
            .top_chunks(query, k)
            .into_iter()
            .map(str::to_owned)
            .collect())
    }
}

const STOP_WORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for",
    "from", "has", "have", "how", "in", "is", "it", "its", "me", "my", "of",
    "on", "or", "that", "the", "this", "to", "was", "what", "when", "which",
    "who", "why", "with",
];

/// Lowercase alphanumeric words of two or more characters, stop words
/// excluded.
fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
}

/// Splits `text` into windows of [`CHUNK_SIZE`] characters, each starting
/// [`CHUNK_SIZE`] - [`CHUNK_OVERLAP`] characters after the previous one.
/// Whitespace-only windows are dropped.
fn split_into_chunks(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = CHUNK_SIZE - CHUNK_OVERLAP;
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + CHUNK_SIZE).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_owned());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_split_into_chunks() {
        assert!(split_into_chunks("").is_empty());
        assert!(split_into_chunks("   \n ").is_empty());
        assert_eq!(split_into_chunks("short text"), ["short text"]);

        let text: String = (0..1000)
            .map(|i| if i % 10 == 9 { ' ' } else { 'a' })
            .collect();
        let chunks = split_into_chunks(&text);
        // Windows start at 0, 400 and 800.
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].chars().count() <= CHUNK_SIZE);
        let expected_overlap: String = text
            .chars()
            .skip(CHUNK_SIZE - CHUNK_OVERLAP)
            .take(CHUNK_OVERLAP)
            .collect();
        assert!(chunks[1].starts_with(expected_overlap.trim()));
    }

    #[test]
    fn test_top_chunks() {
        let index = LexicalIndex::from_documents([
            "Cataract is a clouding of the lens.",
            "Glaucoma is optic nerve damage, often with raised eye pressure.",
            "Angle-closure glaucoma is an emergency. Glaucoma needs treatment.",
        ]);
        assert_eq!(index.len(), 3);

        let hits = index.top_chunks("What is glaucoma?", 5);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].starts_with("Angle-closure"));
        assert!(hits[1].starts_with("Glaucoma is optic"));

        assert_eq!(index.top_chunks("glaucoma", 1).len(), 1);
        assert!(index.top_chunks("retinoblastoma", 5).is_empty());
        assert!(LexicalIndex::default().top_chunks("lens", 5).is_empty());
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("uveitis.txt")).unwrap();
        writeln!(file, "Uveitis is inflammation of the uvea.").unwrap();
        fs::write(dir.path().join("notes.md"), "Not indexed.").unwrap();

        let pattern = format!("{}/*.txt", dir.path().display());
        let index = LexicalIndex::load(&pattern).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.top_chunks("uvea", 5).len(), 1);

        assert!(matches!(
            LexicalIndex::load("[unclosed"),
            Err(IndexError::Pattern(_))
        ));
    }

    #[tokio::test]
    async fn test_search() {
        let index = LexicalIndex::from_documents(["Myopia is nearsightedness."]);
        let passages = index.search("myopia", 5).await.unwrap();
        assert_eq!(passages, ["Myopia is nearsightedness."]);
    }
}
