use anyhow::Context;
use dblp_tables::config::{self, Config, Task};
use dblp_tables::source::{download, open_input};
use dblp_tables::{convert, logger};
use tokio::runtime::Runtime;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let matches = config::cli().get_matches();
    let config = Config::from_matches(&matches).context("no subcommand given")?;
    logger::init(config.verbose);

    let runtime = Runtime::new().context("failed to start the tokio runtime")?;

    match config.task {
        Task::Fetch(fetch) => {
            let written = runtime
                .block_on(download(&fetch.url, &fetch.output))
                .with_context(|| format!("failed to download {}", fetch.url))?;
            info!(bytes = written, path = %fetch.output.display(), "download successful");
        }
        Task::Convert(settings) => {
            // Reading happens on this thread; the runtime only drives decompression.
            let source = open_input(&settings.input, runtime.handle().clone())
                .with_context(|| format!("failed to open {}", settings.input.display()))?;
            let summary = convert::run(source, &settings)
                .with_context(|| format!("failed to convert {}", settings.input.display()))?;
            info!(
                parsed = summary.parsed,
                kept = summary.kept,
                authors = summary.authors,
                authorships = summary.authorships,
                out_dir = %settings.output_dir.display(),
                "tables written"
            );
        }
    }
    Ok(())
}
