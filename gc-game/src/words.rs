//! Category word lists and word-pair selection
//!
//! A category is one file in the words folder: the file stem is the category
//! name and every non-blank line is a candidate word. The table is loaded once
//! at startup and shared read-only by every round.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Word list loading and selection errors
#[derive(Debug, Error)]
pub enum WordListError {
    /// Fewer than two categories available
    #[error("At least two categories are required, found {found}")]
    InsufficientCategories { found: usize },

    /// A category has no candidate words
    #[error("Category '{0}' has no words")]
    EmptyCategory(String),

    /// Word list file or folder could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Summary of one loaded category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub word_count: usize,
}

/// Immutable table of categories keyed by name
///
/// Backed by a `BTreeMap` so iteration order (and therefore seeded
/// selection) does not depend on hashing.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    categories: BTreeMap<String, Vec<String>>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a category, normalising its words
    pub fn insert<S: AsRef<str>>(&mut self, name: impl Into<String>, words: &[S]) {
        let normalised = normalise_words(words.iter().map(|w| w.as_ref()));
        self.categories.insert(name.into(), normalised);
    }

    /// Builder-style variant of [`CategoryTable::insert`]
    pub fn with_category<S: AsRef<str>>(mut self, name: impl Into<String>, words: &[S]) -> Self {
        self.insert(name, words);
        self
    }

    /// Load every regular file in `folder` as a category
    ///
    /// Calling this again re-reads the folder; callers swap in the new table.
    pub fn load_dir(folder: &Path) -> Result<Self, WordListError> {
        let io_err = |source| WordListError::Io {
            path: folder.to_path_buf(),
            source,
        };

        let mut table = Self::new();
        for entry in std::fs::read_dir(folder).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();

            if !path.is_file() {
                debug!("Skipping non-file entry {}", path.display());
                continue;
            }

            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!("Skipping word list with non UTF-8 name: {}", path.display());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let content = std::fs::read_to_string(&path).map_err(|source| WordListError::Io {
                path: path.clone(),
                source,
            })?;
            let words = parse_word_list(&content);
            debug!(category = name, words = words.len(), "Loaded word list");
            table.categories.insert(name.to_string(), words);
        }

        info!(
            "Loaded {} categories from {}",
            table.categories.len(),
            folder.display()
        );
        Ok(table)
    }

    /// Check the table can serve rounds: two or more categories, none empty
    pub fn validate(&self) -> Result<(), WordListError> {
        if self.categories.len() < 2 {
            return Err(WordListError::InsufficientCategories {
                found: self.categories.len(),
            });
        }
        if let Some((name, _)) = self.categories.iter().find(|(_, words)| words.is_empty()) {
            return Err(WordListError::EmptyCategory(name.clone()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn words(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .map(|(name, words)| CategorySummary {
                name: name.clone(),
                word_count: words.len(),
            })
            .collect()
    }
}

/// One drawn word and the category it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickedWord {
    pub category: String,
    pub word: String,
}

/// Two words drawn from two distinct categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordPair {
    pub first: PickedWord,
    pub second: PickedWord,
}

impl WordPair {
    /// Space-joined answer used for scoring
    pub fn answer(&self) -> String {
        format!("{} {}", self.first.word, self.second.word)
    }

    pub fn categories(&self) -> [String; 2] {
        [self.first.category.clone(), self.second.category.clone()]
    }

    pub fn words(&self) -> [String; 2] {
        [self.first.word.clone(), self.second.word.clone()]
    }
}

/// Draw two distinct categories, then one word from each
///
/// Categories are sampled without replacement; words are sampled uniformly
/// and independently.
pub fn select_pair<R: Rng + ?Sized>(
    table: &CategoryTable,
    rng: &mut R,
) -> Result<WordPair, WordListError> {
    let names: Vec<&String> = table.categories.keys().collect();
    if names.len() < 2 {
        return Err(WordListError::InsufficientCategories { found: names.len() });
    }

    let picked = index::sample(rng, names.len(), 2);
    let first = pick_word(table, names[picked.index(0)], rng)?;
    let second = pick_word(table, names[picked.index(1)], rng)?;

    Ok(WordPair { first, second })
}

fn pick_word<R: Rng + ?Sized>(
    table: &CategoryTable,
    category: &str,
    rng: &mut R,
) -> Result<PickedWord, WordListError> {
    let word = table
        .words(category)
        .and_then(|words| words.choose(rng))
        .ok_or_else(|| WordListError::EmptyCategory(category.to_string()))?;

    Ok(PickedWord {
        category: category.to_string(),
        word: word.clone(),
    })
}

/// Parse word list file content: one word per line
///
/// Lines are trimmed and lower-cased. Blank lines and `#` comments are
/// skipped, duplicates keep their first occurrence.
pub fn parse_word_list(content: &str) -> Vec<String> {
    normalise_words(content.lines().filter(|line| !line.trim_start().starts_with('#')))
}

fn normalise_words<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in words {
        let word = word.trim().to_lowercase();
        if word.is_empty() || out.contains(&word) {
            continue;
        }
        out.push(word);
    }
    out
}
