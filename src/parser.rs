//! Streaming record extraction from DBLP-style XML.
//!
//! [`Parser`] pulls one tokenizer event at a time, translates it into an
//! [`XmlEvent`] and feeds it to a [`RecordMachine`]. The machine owns the
//! open-element path, the per-element text buffers and the record under
//! construction, and hands back a [`Record`] whenever a record-boundary
//! element closes. Nothing is read ahead of what the consumer pulls.

use crate::context::{ContextStack, TextAccumulator};
use crate::error::ParseError;
use crate::record::{Record, RecordBuilder};
use crate::schema::{self, ElementClass};
use quick_xml::Reader;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use std::io::BufRead;
use tracing::{debug, info};

/// Progress is logged after this many opened elements unless configured.
pub const DEFAULT_PROGRESS_EVERY: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Open {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Close(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Idle,
    InDocument,
    InRecord,
    InField,
    Done,
}

/// Event-driven record assembly.
#[derive(Debug, Default)]
pub struct RecordMachine {
    state: ParserState,
    context: ContextStack,
    text: TextAccumulator,
    builder: RecordBuilder,
    record_depth: usize,
    /// Depth of the outermost open field of the current record.
    field_depth: Option<usize>,
    emitted: u64,
}

impl RecordMachine {
    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Applies one event. `position` is only used for error reporting.
    pub fn feed(&mut self, event: XmlEvent, position: u64) -> Result<Option<Record>, ParseError> {
        if self.state == ParserState::Done {
            return Ok(None);
        }
        match event {
            XmlEvent::Open { name, attributes } => {
                self.open(&name, &attributes, position)?;
                Ok(None)
            }
            XmlEvent::Text(text) => {
                self.text.append(&text);
                Ok(None)
            }
            XmlEvent::Close(name) => self.close(&name, position),
        }
    }

    /// Called when the input is exhausted.
    pub fn finish_input(&mut self, position: u64) -> Result<(), ParseError> {
        if !self.context.is_empty() {
            return Err(ParseError::UnexpectedEof {
                position,
                open: self.context.path(),
            });
        }
        self.state = ParserState::Done;
        Ok(())
    }

    /// Stops the machine after a fatal error; the open record is dropped.
    pub fn abort(&mut self) {
        self.builder.finish();
        self.field_depth = None;
        self.state = ParserState::Done;
    }

    fn open(&mut self, name: &str, attributes: &[(String, String)], position: u64) -> Result<(), ParseError> {
        if self.state == ParserState::Idle {
            self.state = ParserState::InDocument;
        }
        self.context.push(name);
        self.text.open();
        match schema::classify(name) {
            ElementClass::RecordBoundary => {
                if let Some(outer) = self.builder.kind() {
                    return Err(ParseError::NestedRecord {
                        position,
                        outer: outer.to_string(),
                        inner: name.to_string(),
                    });
                }
                self.builder.open(name, attributes);
                self.record_depth = self.context.depth();
                self.state = ParserState::InRecord;
            }
            ElementClass::Field(..) if self.builder.is_open() => {
                self.field_depth.get_or_insert(self.context.depth());
                self.state = ParserState::InField;
            }
            _ => (),
        }
        Ok(())
    }

    fn close(&mut self, name: &str, position: u64) -> Result<Option<Record>, ParseError> {
        if self.context.top() != Some(name) {
            return Err(ParseError::UnbalancedClose {
                position,
                open: self.context.path(),
                found: name.to_string(),
            });
        }
        let text = self.text.close();
        let depth = self.context.depth();
        self.context.pop();

        let mut record = None;
        match schema::classify(name) {
            ElementClass::Field(field, kind) => {
                self.builder.commit(field, kind, &text);
                if self.field_depth == Some(depth) {
                    self.field_depth = None;
                    self.state = ParserState::InRecord;
                }
            }
            // Inline markup such as <i> or <sub> anywhere below a field.
            ElementClass::Unrecognized if self.field_depth.is_some_and(|field| depth > field) => {
                self.text.append(&text)
            }
            ElementClass::Unrecognized => (),
            ElementClass::RecordBoundary if depth == self.record_depth => {
                record = self.builder.finish();
                if record.is_some() {
                    self.emitted += 1;
                }
                self.state = ParserState::InDocument;
            }
            ElementClass::RecordBoundary => (),
        }

        if self.context.is_empty() {
            info!(records = self.emitted, "completed parsing XML, all entries processed");
            self.state = ParserState::Done;
        }
        Ok(record)
    }
}

/// Lazy, single-pass sequence of records read from `R`.
///
/// Iteration ends when the document root closes or the input is exhausted.
/// The first error is yielded once and ends the sequence.
pub struct Parser<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    machine: RecordMachine,
    opened: u64,
    progress_every: u64,
}

impl<R: BufRead> Parser<R> {
    pub fn new(source: R) -> Parser<R> {
        Parser {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            machine: RecordMachine::default(),
            opened: 0,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    pub fn with_progress_every(mut self, every: u64) -> Self {
        self.progress_every = every;
        self
    }

    pub fn state(&self) -> ParserState {
        self.machine.state()
    }

    /// Records emitted so far.
    pub fn records(&self) -> u64 {
        self.machine.emitted()
    }

    /// Reads one tokenizer event and returns a record if it completed one.
    fn step(&mut self) -> Result<Option<Record>, ParseError> {
        self.buf.clear();
        let position = self.reader.buffer_position();
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .map_err(|source| ParseError::Tokenize {
                position: self.reader.error_position(),
                source,
            })?;
        if let Event::Eof = event {
            return self.machine.finish_input(position).map(|_| None);
        }

        let mut record = None;
        for token in translate(event, position)? {
            if let XmlEvent::Open { .. } = token {
                self.report_progress();
            }
            if let Some(done) = self.machine.feed(token, position)? {
                record = Some(done);
            }
        }
        Ok(record)
    }

    fn report_progress(&mut self) {
        self.opened += 1;
        if self.progress_every > 0 && self.opened % self.progress_every == 0 {
            info!(
                elements = self.opened,
                records = self.machine.emitted(),
                "processed {} elements so far",
                self.opened
            );
        }
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.machine.state() != ParserState::Done {
            match self.step() {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => (),
                Err(error) => {
                    debug!(%error, "stopping record stream");
                    self.machine.abort();
                    return Some(Err(error));
                }
            }
        }
        None
    }
}

/// Maps a tokenizer event onto zero, one or two machine events. A
/// self-closing element becomes an open followed by a close.
fn translate(event: Event<'_>, position: u64) -> Result<Vec<XmlEvent>, ParseError> {
    let tokens = match event {
        Event::Start(e) => vec![open_event(&e, position)?],
        Event::Empty(e) => vec![open_event(&e, position)?, XmlEvent::Close(element_name(e.name()))],
        Event::End(e) => vec![XmlEvent::Close(element_name(e.name()))],
        Event::Text(e) => {
            let text = e
                .unescape_with(resolve_html5_entity)
                .map_err(|source| ParseError::Tokenize { position, source })?;
            vec![XmlEvent::Text(text.into_owned())]
        }
        Event::CData(e) => vec![XmlEvent::Text(String::from_utf8_lossy(&e).into_owned())],
        _ => Vec::new(),
    };
    Ok(tokens)
}

fn open_event(start: &BytesStart<'_>, position: u64) -> Result<XmlEvent, ParseError> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|source| ParseError::Attribute { position, source })?;
        let value = attribute
            .unescape_value_with(resolve_html5_entity)
            .map_err(|source| ParseError::Tokenize { position, source })?;
        attributes.push((element_name(attribute.key), value.into_owned()));
    }
    Ok(XmlEvent::Open {
        name: element_name(start.name()),
        attributes,
    })
}

fn element_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::{self, BufReader, Read};

    fn parse(xml: &str) -> Vec<Record> {
        Parser::new(xml.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn open(name: &str) -> XmlEvent {
        XmlEvent::Open {
            name: name.to_string(),
            attributes: Vec::new(),
        }
    }

    fn close(name: &str) -> XmlEvent {
        XmlEvent::Close(name.to_string())
    }

    #[test]
    fn test_parse_article() {
        let records = parse(
            r#"<?xml version="1.0" encoding="ISO-8859-1"?>
            <!DOCTYPE dblp SYSTEM "dblp.dtd">
            <dblp>
            <article key="k1" mdate="2020-01-01">
                <title>Foo</title>
                <author>A</author>
                <author>B</author>
                <year>2020</year>
                <pages>1-10</pages>
                <ee>https://doi.org/10.1/x</ee>
            </article>
            </dblp>"#,
        );

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind, "article");
        assert_eq!(record.key.as_deref(), Some("k1"));
        assert_eq!(record.mdate.as_deref(), Some("2020-01-01"));
        assert_eq!(record.publtype, None);
        assert_eq!(record.scalar("title"), Some("Foo"));
        assert_eq!(record.list("author"), ["A", "B"]);
        assert_eq!(record.scalar("year"), Some("2020"));
        assert_eq!(record.scalar("pages"), Some("10"));
        assert_eq!(record.list("ee"), ["https://doi.org/10.1/x"]);
        assert!(record.get("journal").is_absent());
    }

    #[rstest]
    #[case("<dblp></dblp>", 0)]
    #[case("<dblp><article/></dblp>", 1)]
    #[case("<dblp><article></article><book></book></dblp>", 2)]
    #[case("<dblp><www key=\"homepages/x\"><author>X</author><url>u</url></www><phdthesis/></dblp>", 2)]
    #[case(
        "<dblp><proceedings><title>P</title><editor>E</editor><editor>F</editor><isbn>1</isbn>\
         <booktitle>B</booktitle><note>n</note></proceedings><data/><person/></dblp>",
        3
    )]
    fn test_one_record_per_boundary(#[case] xml: &str, #[case] expected: usize) {
        assert_eq!(parse(xml).len(), expected);
    }

    #[test]
    fn test_sibling_text_is_isolated() {
        let records = parse("<dblp><article>\n  <title>A</title>\n  <year>2020</year>\n</article></dblp>");
        assert_eq!(records[0].scalar("title"), Some("A"));
        assert_eq!(records[0].scalar("year"), Some("2020"));
    }

    #[test]
    fn test_list_order() {
        let records = parse("<dblp><article><author>X</author><author>Y</author></article></dblp>");
        assert_eq!(records[0].list("author"), ["X", "Y"]);
    }

    #[test]
    fn test_inline_markup_folds_into_field() {
        let records = parse(
            "<dblp><article><title>On <i>n</i>-Queens and H<sub>2</sub>O.</title></article></dblp>",
        );
        assert_eq!(records[0].scalar("title"), Some("On n-Queens and H2O."));
    }

    #[test]
    fn test_nested_inline_markup_folds_into_field() {
        let records = parse(
            "<dblp><article><title>Making <i>H<sub>2</sub>O</i> cheap</title>\
             <year><b><tt>20</tt>24</b></year></article></dblp>",
        );
        assert_eq!(records[0].scalar("title"), Some("Making H2O cheap"));
        assert_eq!(records[0].scalar("year"), Some("2024"));
    }

    #[test]
    fn test_unrecognized_child_is_inert() {
        let records = parse(
            "<dblp><article><rating>5</rating><title>T</title><stream>s</stream></article></dblp>",
        );
        assert_eq!(records[0].scalar("title"), Some("T"));
        assert!(records[0].get("rating").is_absent());
        assert!(records[0].get("stream").is_absent());
    }

    #[test]
    fn test_entities_are_resolved() {
        let records = parse(
            "<dblp><article key=\"a&amp;b\"><author>J&uuml;rgen M&#252;ller</author>\
             <title>R&eacute;sum&eacute; &amp; <![CDATA[<raw>]]></title></article></dblp>",
        );
        assert_eq!(records[0].key.as_deref(), Some("a&b"));
        assert_eq!(records[0].list("author"), ["Jürgen Müller"]);
        assert_eq!(records[0].scalar("title"), Some("Résumé & <raw>"));
    }

    #[test]
    fn test_empty_field_is_present() {
        let records = parse("<dblp><article><note/><pages>i-ii</pages></article></dblp>");
        assert_eq!(records[0].get("note"), &FieldValue::Scalar(String::new()));
        assert_eq!(records[0].get("pages"), &FieldValue::Scalar(String::new()));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_stops_after_root_closes() {
        let mut parser = Parser::new("<dblp><book/></dblp><broken".as_bytes());
        assert!(parser.next().unwrap().is_ok());
        assert!(parser.next().is_none());
        assert_eq!(parser.state(), ParserState::Done);
    }

    #[test]
    fn test_mismatched_tag_is_fatal() {
        let mut parser = Parser::new("<dblp><article><title>x</year></article></dblp>".as_bytes());
        let error = parser.next().unwrap().unwrap_err();
        assert!(matches!(error, ParseError::Tokenize { .. }), "{error:?}");
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_truncated_input_is_fatal() {
        let mut parser = Parser::new("<dblp><article><title>x</title>".as_bytes());
        let error = parser.next().unwrap().unwrap_err();
        assert!(matches!(
            error,
            ParseError::UnexpectedEof { ref open, .. } if open == "dblp/article"
        ));
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_nested_record_is_fatal() {
        let mut parser = Parser::new("<dblp><article><book></book></article></dblp>".as_bytes());
        let error = parser.next().unwrap().unwrap_err();
        assert!(matches!(error, ParseError::NestedRecord { .. }), "{error:?}");
        assert!(parser.next().is_none());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("read past the consumer"))
        }
    }

    #[test]
    fn test_does_not_read_ahead() {
        let prefix = "<dblp><article><title>first</title></article>".as_bytes();
        let mut parser = Parser::new(BufReader::new(prefix.chain(FailingReader)));

        let first = parser.next().unwrap().unwrap();
        assert_eq!(first.scalar("title"), Some("first"));
        assert!(parser.next().unwrap().is_err());
    }

    #[test]
    fn test_state_transitions() {
        let mut machine = RecordMachine::default();
        assert_eq!(machine.state(), ParserState::Idle);

        machine.feed(open("dblp"), 0).unwrap();
        assert_eq!(machine.state(), ParserState::InDocument);

        machine.feed(open("article"), 0).unwrap();
        assert_eq!(machine.state(), ParserState::InRecord);

        machine.feed(open("title"), 0).unwrap();
        assert_eq!(machine.state(), ParserState::InField);
        machine.feed(XmlEvent::Text("Fo".to_string()), 0).unwrap();
        machine.feed(XmlEvent::Text("o".to_string()), 0).unwrap();
        assert_eq!(machine.feed(close("title"), 0).unwrap(), None);
        assert_eq!(machine.state(), ParserState::InRecord);

        let record = machine.feed(close("article"), 0).unwrap().unwrap();
        assert_eq!(record.scalar("title"), Some("Foo"));
        assert_eq!(machine.state(), ParserState::InDocument);

        machine.feed(close("dblp"), 0).unwrap();
        assert_eq!(machine.state(), ParserState::Done);
        assert_eq!(machine.emitted(), 1);
    }

    #[test]
    fn test_field_outside_record_is_ignored() {
        let mut machine = RecordMachine::default();
        machine.feed(open("dblp"), 0).unwrap();
        machine.feed(open("title"), 0).unwrap();
        assert_eq!(machine.state(), ParserState::InDocument);
        assert_eq!(machine.feed(close("title"), 0).unwrap(), None);
    }

    #[test]
    fn test_unbalanced_close_is_an_error() {
        let mut machine = RecordMachine::default();
        let error = machine.feed(close("title"), 5).unwrap_err();
        assert!(
            matches!(error, ParseError::UnbalancedClose { position: 5, ref found, .. } if found == "title"),
            "{error:?}"
        );

        machine.feed(open("dblp"), 0).unwrap();
        machine.feed(open("article"), 0).unwrap();
        let error = machine.feed(close("dblp"), 9).unwrap_err();
        assert!(
            matches!(error, ParseError::UnbalancedClose { ref open, .. } if open == "dblp/article"),
            "{error:?}"
        );
    }
}
