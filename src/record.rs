use crate::pages::page_count;
use crate::schema::FieldKind;
use std::collections::HashMap;

/// Value of one field on a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    #[default]
    Absent,
}

static ABSENT: FieldValue = FieldValue::Absent;

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

/// One bibliographic entry.
///
/// `kind` is the element name that opened it. The attributes are kept as
/// `None` when missing so an absent `mdate` stays distinct from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub kind: String,
    pub key: Option<String>,
    pub mdate: Option<String>,
    pub publtype: Option<String>,
    fields: HashMap<&'static str, FieldValue>,
}

impl Record {
    pub fn new(kind: &str) -> Record {
        Record {
            kind: kind.to_string(),
            ..Record::default()
        }
    }

    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&ABSENT)
    }

    pub fn scalar(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            FieldValue::Scalar(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Entries of a repeatable field, empty when the field never occurred.
    pub fn list(&self, field: &str) -> &[String] {
        match self.get(field) {
            FieldValue::List(values) => values.as_slice(),
            _ => &[],
        }
    }

    pub fn set(&mut self, field: &'static str, value: FieldValue) {
        if value.is_absent() {
            self.fields.remove(field);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub fn push(&mut self, field: &'static str, value: String) {
        match self.fields.entry(field).or_insert_with(|| FieldValue::List(Vec::new())) {
            FieldValue::List(values) => values.push(value),
            other => *other = FieldValue::List(vec![value]),
        }
    }
}

/// Owns the record under construction between its open and close events.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    current: Option<Record>,
}

impl RecordBuilder {
    /// Starts a record for a record-boundary element, reading the
    /// `key`, `mdate` and `publtype` attributes.
    pub fn open(&mut self, kind: &str, attributes: &[(String, String)]) {
        let mut record = Record::new(kind);
        for (name, value) in attributes {
            match name.as_str() {
                "key" => record.key = Some(value.clone()),
                "mdate" => record.mdate = Some(value.clone()),
                "publtype" => record.publtype = Some(value.clone()),
                _ => (),
            }
        }
        self.current = Some(record);
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn kind(&self) -> Option<&str> {
        self.current.as_ref().map(|record| record.kind.as_str())
    }

    /// Stores the assembled text of a closed field element. `pages` is
    /// replaced by its page count. Ignored when no record is open.
    pub fn commit(&mut self, field: &'static str, kind: FieldKind, text: &str) {
        let Some(record) = self.current.as_mut() else {
            return;
        };
        let text = text.trim();
        match kind {
            FieldKind::Scalar if field == "pages" => {
                record.set(field, FieldValue::Scalar(page_count(text)));
            }
            FieldKind::Scalar => record.set(field, FieldValue::Scalar(text.to_string())),
            FieldKind::List => record.push(field, text.to_string()),
        }
    }

    /// Hands out the finished record and leaves the builder empty.
    pub fn finish(&mut self) -> Option<Record> {
        self.current.take()
    }
}
