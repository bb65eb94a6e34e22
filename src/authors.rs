use crate::record::Record;
use std::collections::HashMap;

/// Dense author identities in first-encounter order, starting at 1.
#[derive(Debug, Default)]
pub struct AuthorIndex {
    ids: HashMap<String, usize>,
    names: Vec<String>,
}

impl AuthorIndex {
    /// Returns the identity of `name`, assigning the next one on first sight.
    pub fn identify(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        self.names.push(name.to_string());
        let id = self.names.len();
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Distinct authors sorted by identity.
    pub fn authors(&self) -> impl Iterator<Item = (&str, usize)> {
        self.names
            .iter()
            .zip(1..)
            .map(|(name, id)| (name.as_str(), id))
    }
}

/// One author of one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorship {
    pub publication_id: u64,
    pub author: String,
    pub title: Option<String>,
    pub identity: usize,
}

/// Explodes the author lists of the kept records into authorship rows.
#[derive(Debug, Default)]
pub struct AuthorGraph {
    index: AuthorIndex,
    links: u64,
}

impl AuthorGraph {
    /// Links every author of `record`, in document order. Records without
    /// authors produce no rows.
    pub fn link(&mut self, publication_id: u64, record: &Record) -> Vec<Authorship> {
        let title = record.scalar("title").map(str::to_string);
        let rows: Vec<Authorship> = record
            .list("author")
            .iter()
            .map(|author| Authorship {
                publication_id,
                author: author.clone(),
                title: title.clone(),
                identity: self.index.identify(author),
            })
            .collect();
        self.links += rows.len() as u64;
        rows
    }

    pub fn index(&self) -> &AuthorIndex {
        &self.index
    }

    pub fn links(&self) -> u64 {
        self.links
    }
}
