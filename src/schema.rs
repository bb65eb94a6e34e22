//! Static classification of DBLP element names.

/// How a field element stores its text on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// At most one value, the last occurrence wins.
    Scalar,
    /// Every occurrence is appended in document order.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// Opens and closes one bibliographic entry.
    RecordBoundary,
    Field(&'static str, FieldKind),
    Unrecognized,
}

/// Element names that delimit one record.
pub const RECORD_TYPES: [&str; 10] = [
    "article",
    "inproceedings",
    "proceedings",
    "book",
    "incollection",
    "phdthesis",
    "mastersthesis",
    "www",
    "person",
    "data",
];

/// Recognized field elements in output column order.
pub const FIELDS: [(&str, FieldKind); 23] = [
    ("address", FieldKind::Scalar),
    ("author", FieldKind::List),
    ("booktitle", FieldKind::Scalar),
    ("cdrom", FieldKind::Scalar),
    ("chapter", FieldKind::Scalar),
    ("cite", FieldKind::List),
    ("crossref", FieldKind::Scalar),
    ("editor", FieldKind::List),
    ("ee", FieldKind::List),
    ("isbn", FieldKind::Scalar),
    ("journal", FieldKind::Scalar),
    ("month", FieldKind::Scalar),
    ("note", FieldKind::Scalar),
    ("number", FieldKind::Scalar),
    ("pages", FieldKind::Scalar),
    ("publisher", FieldKind::Scalar),
    ("publnr", FieldKind::Scalar),
    ("school", FieldKind::Scalar),
    ("series", FieldKind::Scalar),
    ("title", FieldKind::Scalar),
    ("url", FieldKind::Scalar),
    ("volume", FieldKind::Scalar),
    ("year", FieldKind::Scalar),
];

pub fn is_record_boundary(name: &str) -> bool {
    RECORD_TYPES.contains(&name)
}

/// Looks up a field element, returning its canonical name and kind.
pub fn field(name: &str) -> Option<(&'static str, FieldKind)> {
    FIELDS.iter().copied().find(|(field, _)| *field == name)
}

pub fn classify(name: &str) -> ElementClass {
    if is_record_boundary(name) {
        ElementClass::RecordBoundary
    } else if let Some((field, kind)) = field(name) {
        ElementClass::Field(field, kind)
    } else {
        ElementClass::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("article", ElementClass::RecordBoundary)]
    #[case("www", ElementClass::RecordBoundary)]
    #[case("mastersthesis", ElementClass::RecordBoundary)]
    #[case("author", ElementClass::Field("author", FieldKind::List))]
    #[case("ee", ElementClass::Field("ee", FieldKind::List))]
    #[case("pages", ElementClass::Field("pages", FieldKind::Scalar))]
    #[case("year", ElementClass::Field("year", FieldKind::Scalar))]
    #[case("i", ElementClass::Unrecognized)]
    #[case("dblp", ElementClass::Unrecognized)]
    #[case("Author", ElementClass::Unrecognized)]
    fn test_classify(#[case] name: &str, #[case] expected: ElementClass) {
        assert_eq!(classify(name), expected);
    }

    #[test]
    fn test_names_are_disjoint() {
        for (name, _) in FIELDS {
            assert!(!is_record_boundary(name), "{name} is both field and record");
        }
    }
}
