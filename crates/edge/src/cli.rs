// crates/edge/src/cli.rs

use crate::Error;
use adapt::{config, expr, ndjson};
use clap::{builder::ValueHint, Parser};
use domain::Value;
use engine::Page;
use futures::{stream, StreamExt};
use std::io::{self, BufWriter, Write};
use std::{path::PathBuf, process::ExitCode};
use tracing::{debug, info};

pub type Result<T> = std::result::Result<T, Error>;

const AFTER_HELP: &str = "\
Operators:
  eq ne gt gte lt lte          compare with a value
  match                        case-insensitive substring, or /regex/
  contains                     case-sensitive substring
  hasitem containsall containsany
                               test the items of an array field
  in nin                       value is (not) one of a list
  exists size                  presence (true/false), length
  geowithin                    [lat, lng] within lat,lng,radiusKm
  not and or                   combine literal values

Examples:
  fq data.jsonl \"name:match:john\" \"age:gt:25\"
  fq data.jsonl \"tags:containsany:admin,moderator\"
  fq --limit 10 data.jsonl \"location:geowithin:40.7,-74.0,10\"";

/// fq: query newline-delimited JSON records
#[derive(Parser, Debug)]
#[command(name = "fq", version, about = "Filter newline-delimited JSON records", after_help = AFTER_HELP)]
pub struct Cli {
    /// NDJSON file, one record per line
    #[arg(value_name = "DATA_FILE", value_hint = ValueHint::FilePath)]
    pub data_file: PathBuf,

    /// Filter expressions `field:operator:value`; every one must match
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Matches to skip before printing
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Maximum matches to print (0 = no limit)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Do not print errors to stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Settings file (TOML)
    #[arg(long, env = "FQ_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

/// What a finished run printed and ran into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub printed: usize,
    pub source_errors: usize,
    pub filter_errors: usize,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.source_errors == 0 && self.filter_errors == 0
    }
}

#[derive(Debug)]
enum Event {
    Record(Value),
    Source(adapt::Error),
    Filter(engine::Error),
}

#[tokio::main(flavor = "multi_thread")]
#[tracing::instrument(skip_all)]
pub async fn start() -> ExitCode {
    let cli = Cli::parse();

    // Unlocked handles: spawned tasks log to stderr while `run` is pending.
    let mut out = BufWriter::new(io::stdout());
    let mut err = io::stderr();

    match run(&cli, &mut out, &mut err).await {
        Ok(report) if report.is_clean() => {
            info!(?report, "done");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            info!(?report, "done with errors");
            ExitCode::FAILURE
        }
        Err(e) => {
            debug!(%e, "run failed");
            if !cli.quiet {
                let _ = writeln!(err, "Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Stream `cli.data_file` through the filters, writing each match to `out`
/// as one JSON line and each source or filter error to `err`.
///
/// Record errors never stop the run; they are counted in the [`Report`].
/// Bad settings, bad filters, or a failing writer end it with `Err`.
#[tracing::instrument(skip_all, fields(file = %cli.data_file.display()))]
pub async fn run<W: Write, E: Write>(cli: &Cli, out: &mut W, err: &mut E) -> Result<Report> {
    let settings = config::load_settings(cli.config.as_deref())?;
    let query = expr::parse_filters(&cli.filters)?;
    let page = Page::new(cli.skip, cli.limit);
    debug!(filters = cli.filters.len(), ?page, "starting");

    let (records, source_errors) = ndjson::open(&cli.data_file, &settings.source);
    let (matched, filter_errors) = engine::filter_stream(records, query, page, &settings.stream);

    let mut events = stream::select(
        matched.map(Event::Record),
        stream::select(
            source_errors.map(Event::Source),
            filter_errors.map(Event::Filter),
        ),
    );

    let mut report = Report::default();
    while let Some(event) = events.next().await {
        match event {
            Event::Record(record) => {
                serde_json::to_writer(&mut *out, &record)?;
                out.write_all(b"\n")?;
                report.printed += 1;
            }
            Event::Source(e) => {
                report.source_errors += 1;
                if !cli.quiet {
                    writeln!(err, "Source error: {e}")?;
                }
            }
            Event::Filter(e) => {
                report.filter_errors += 1;
                if !cli.quiet {
                    writeln!(err, "Filter error: {e}")?;
                }
            }
        }
    }

    out.flush()?;
    Ok(report)
}
