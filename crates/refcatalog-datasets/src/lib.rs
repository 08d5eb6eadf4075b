//! Parsers for the open lexical datasets behind the reference catalog.
//!
//! Each module turns one dataset into in-memory intermediate records and
//! has no side effects beyond reading its input. Parsers fail only on
//! whole-file or whole-directory problems ([`DatasetError`]); malformed
//! rows are counted in the module's `Stats` and skipped.
//!
//! | module         | input                                             |
//! |----------------|---------------------------------------------------|
//! | [`wiktionary`] | Kaikki.org English Wiktionary JSON Lines dump     |
//! | [`ngsl`]       | NGSL and NAWL CSV word lists                      |
//! | [`cmu`]        | CMU Pronouncing Dictionary                        |
//! | [`wordnet`]    | Open English WordNet JSON directory               |
//! | [`tatoeba`]    | Tatoeba English/Russian sentence pairs (TSV)      |
//!
//! Files are read through [`SourceBuffer`], memory-mapped or owned
//! depending on [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use std::collections::HashSet;
//! use std::path::Path;
//!
//! use refcatalog_datasets::{LoadMode, tatoeba};
//!
//! # fn main() -> Result<(), refcatalog_datasets::DatasetError> {
//! let known: HashSet<String> = ["cat".to_string()].into();
//! let examples = tatoeba::parse(Path::new("sentences.tsv"), &known, 5, LoadMode::Mmap)?;
//! for (word, pairs) in &examples.by_word {
//!     println!("{word}: {} pairs", pairs.len());
//! }
//! # Ok(()) }
//! ```

mod buffer;
mod error;

pub mod cmu;
pub mod ngsl;
pub mod tatoeba;
pub mod wiktionary;
pub mod wordnet;

pub use buffer::{LoadMode, SourceBuffer};
pub use error::DatasetError;
