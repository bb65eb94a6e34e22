//! Streaming conversion of the DBLP XML dump into relational tables.
//!
//! The dump is read once, event by event: [`parser::Parser`] yields one
//! [`record::Record`] per bibliographic entry, [`postprocess::PostProcessor`]
//! drops unwanted entry types and cleans the year, and
//! [`authors::AuthorGraph`] assigns author identities while
//! [`tables::TableWriter`] writes `publications.csv`, `authors.csv` and
//! `authorships.csv`. [`convert::run`] wires the stages together.

pub mod authors;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod logger;
pub mod pages;
pub mod parser;
pub mod postprocess;
pub mod record;
pub mod schema;
pub mod source;
pub mod tables;

pub use error::{ConvertError, ParseError, SourceError};
pub use parser::Parser;
pub use record::{FieldValue, Record};
