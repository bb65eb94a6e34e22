use crate::authors::AuthorGraph;
use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::parser::Parser;
use crate::postprocess::PostProcessor;
use crate::tables::TableWriter;
use std::io::BufRead;
use tracing::error;

/// Counts reported at the end of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub parsed: u64,
    pub kept: u64,
    pub authors: usize,
    pub authorships: u64,
}

/// Streams `source` into the three output tables under
/// `config.output_dir`. Either all tables are written or none.
pub fn run<R: BufRead>(source: R, config: &ConvertConfig) -> Result<Summary, ConvertError> {
    let mut tables = TableWriter::create(&config.output_dir, &config.null_marker)?;
    let mut graph = AuthorGraph::default();

    match write_rows(source, config, &mut tables, &mut graph) {
        Ok(summary) => {
            tables.finish(graph.index())?;
            Ok(summary)
        }
        Err(failure) => {
            if let ConvertError::Parse(parse) = &failure {
                error!(position = parse.position(), "{parse}");
            }
            tables.abandon();
            Err(failure)
        }
    }
}

fn write_rows<R: BufRead>(
    source: R,
    config: &ConvertConfig,
    tables: &mut TableWriter,
    graph: &mut AuthorGraph,
) -> Result<Summary, ConvertError> {
    let processor = PostProcessor::new(config.excluded_types.iter().cloned());
    let mut parser = Parser::new(source).with_progress_every(config.progress_every);

    let mut publication_id = 0;
    for record in processor.apply(parser.by_ref()) {
        let record = record?;
        publication_id += 1;
        tables.write_publication(publication_id, &record)?;
        for link in graph.link(publication_id, &record) {
            tables.write_authorship(&link)?;
        }
    }

    Ok(Summary {
        parsed: parser.records(),
        kept: publication_id,
        authors: graph.index().len(),
        authorships: graph.links(),
    })
}
