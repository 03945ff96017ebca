//! The trained embedding vocabulary.
//!
//! Vectors are stored contiguously, one row of `dimensions` values per key,
//! in insertion order.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Read-only mapping from track identifier to a fixed-length vector.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    dimensions: usize,
    index: HashMap<String, usize>,
    data: Vec<f32>,
}

impl Vocabulary {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Build a vocabulary from `(key, vector)` pairs.
    pub fn from_pairs<I, K>(dimensions: usize, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<f32>)>,
        K: Into<String>,
    {
        let mut vocab = Self::new(dimensions);
        for (key, vector) in pairs {
            vocab.insert(key, &vector)?;
        }
        Ok(vocab)
    }

    /// Add a vector. Returns `false` if the key was already present, in
    /// which case the first vector is kept.
    ///
    /// # Errors
    /// Returns `Error::InvalidData` if the vector length differs from the
    /// vocabulary dimension.
    pub fn insert(&mut self, key: impl Into<String>, vector: &[f32]) -> Result<bool> {
        if vector.len() != self.dimensions {
            return Err(Error::InvalidData(format!(
                "vector has {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }

        let key = key.into();
        if self.index.contains_key(&key) {
            return Ok(false);
        }

        let row = self.index.len();
        self.index.insert(key, row);
        self.data.extend_from_slice(vector);
        Ok(true)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&[f32]> {
        let row = *self.index.get(key)?;
        let start = row * self.dimensions;
        self.data.get(start..start + self.dimensions)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
