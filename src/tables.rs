//! CSV output for the publication, author and authorship tables.
//!
//! Files are written under a `.partial` name and only renamed into place by
//! [`TableWriter::finish`], so a failed run leaves no half-written tables.

use crate::authors::{AuthorIndex, Authorship};
use crate::error::ConvertError;
use crate::record::{FieldValue, Record};
use crate::schema::FIELDS;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const PUBLICATION_FILE: &str = "publications.csv";
pub const AUTHOR_FILE: &str = "authors.csv";
pub const AUTHORSHIP_FILE: &str = "authorships.csv";

const RECORD_COLUMNS: [&str; 5] = ["id", "type", "key", "mdate", "publtype"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorRow<'a> {
    author_string: &'a str,
    identity: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorshipRow<'a> {
    publication_id: u64,
    author_string: &'a str,
    title: &'a str,
    identity: usize,
}

pub struct TableWriter {
    dir: PathBuf,
    null_marker: String,
    publications: Writer<File>,
    authorships: Writer<File>,
}

impl TableWriter {
    /// Creates `dir` if needed and opens the partial publication and
    /// authorship files with their headers written.
    pub fn create(dir: &Path, null_marker: &str) -> Result<TableWriter, ConvertError> {
        fs::create_dir_all(dir)?;

        let mut publications = open_partial(dir, PUBLICATION_FILE)?;
        let header = RECORD_COLUMNS
            .iter()
            .copied()
            .chain(FIELDS.iter().map(|(field, _)| *field));
        publications.write_record(header)?;

        let mut authorships = open_partial(dir, AUTHORSHIP_FILE)?;
        authorships.write_record(["publicationId", "authorString", "title", "identity"])?;

        Ok(TableWriter {
            dir: dir.to_path_buf(),
            null_marker: null_marker.to_string(),
            publications,
            authorships,
        })
    }

    pub fn write_publication(&mut self, id: u64, record: &Record) -> Result<(), ConvertError> {
        let mut row = Vec::with_capacity(RECORD_COLUMNS.len() + FIELDS.len());
        row.push(id.to_string());
        row.push(record.kind.clone());
        for attribute in [&record.key, &record.mdate, &record.publtype] {
            row.push(attribute.clone().unwrap_or_else(|| self.null_marker.clone()));
        }
        for (field, _) in FIELDS {
            row.push(self.render(record.get(field))?);
        }
        self.publications.write_record(&row)?;
        Ok(())
    }

    pub fn write_authorship(&mut self, link: &Authorship) -> Result<(), ConvertError> {
        self.authorships.serialize(AuthorshipRow {
            publication_id: link.publication_id,
            author_string: &link.author,
            title: link.title.as_deref().unwrap_or(&self.null_marker),
            identity: link.identity,
        })?;
        Ok(())
    }

    /// Writes the author table and moves all three files into place.
    pub fn finish(mut self, authors: &AuthorIndex) -> Result<(), ConvertError> {
        let mut author_table = open_partial(&self.dir, AUTHOR_FILE)?;
        author_table.write_record(["authorString", "identity"])?;
        for (author_string, identity) in authors.authors() {
            author_table.serialize(AuthorRow {
                author_string,
                identity,
            })?;
        }
        author_table.flush()?;
        self.publications.flush()?;
        self.authorships.flush()?;

        for name in [PUBLICATION_FILE, AUTHORSHIP_FILE, AUTHOR_FILE] {
            fs::rename(partial_path(&self.dir, name), self.dir.join(name))?;
        }
        Ok(())
    }

    /// Drops the partial files after a failed run.
    pub fn abandon(self) {
        let dir = self.dir.clone();
        drop(self);
        for name in [PUBLICATION_FILE, AUTHORSHIP_FILE, AUTHOR_FILE] {
            let path = partial_path(&dir, name);
            if path.exists() {
                if let Err(error) = fs::remove_file(&path) {
                    warn!(path = %path.display(), %error, "could not remove partial table");
                }
            }
        }
    }

    fn render(&self, value: &FieldValue) -> Result<String, ConvertError> {
        Ok(match value {
            FieldValue::Scalar(text) => text.clone(),
            FieldValue::List(values) => serde_json::to_string(values)?,
            FieldValue::Absent => self.null_marker.clone(),
        })
    }
}

fn partial_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.partial"))
}

fn open_partial(dir: &Path, name: &str) -> Result<Writer<File>, ConvertError> {
    let writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(partial_path(dir, name))?;
    Ok(writer)
}
