//! Text search for trackmap.
//!
//! Tokenizes track and artist names and builds the inverted index the web
//! client uses for prefix-free keyword search. Postings are ordinal
//! positions in the exported track list.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod index;
pub mod tokenize;

pub use index::SearchIndex;
pub use tokenize::{tokenize, MIN_TOKEN_LEN};
