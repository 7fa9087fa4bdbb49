//! lagscan command line
//!
//! Loads a CSV file (or a directory of CSV files), optionally resamples it,
//! sweeps a lag range against a reference column and prints the ranking.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::Level;

use lagscan::analysis::{fill_missing, resample, search_best_lag, InterpolationMethod};
use lagscan::lag::{format_lag, parse_duration, LagSet};
use lagscan::plot::{correlation_curves, render_png, ColumnSelection};
use lagscan::settings::AnalysisSettings;
use lagscan::source::{CsvDirectorySource, CsvFileSource, DataSource, SeriesFilter};
use lagscan::table::{ColumnSelector, TimeSeriesTable};
use lagscan::{CrossCorrelationMatrix, RankingReport};

/// Find the lag at which each series best correlates with a reference.
#[derive(Parser, Debug)]
#[command(name = "lagscan", version)]
struct Args {
    /// CSV file, or directory of CSV files
    path: PathBuf,

    /// Reference column name or position
    #[arg(short, long)]
    reference: Option<String>,

    /// Lag range as START..END, e.g. -10m..10m
    #[arg(long, allow_hyphen_values = true)]
    lags: Option<String>,

    /// Number of evenly spaced lags in the range
    #[arg(long, conflicts_with = "lag_step")]
    lag_count: Option<usize>,

    /// Spacing between lags in the range, e.g. 30s
    #[arg(long)]
    lag_step: Option<String>,

    /// Resample to this interval before searching, e.g. 1m
    #[arg(long)]
    resample: Option<String>,

    /// Interpolation method: linear, pchip or previous
    #[arg(long)]
    method: Option<InterpolationMethod>,

    /// Interpolate remaining missing values before searching
    #[arg(long)]
    fill: bool,

    /// Comma separated series to load (default: all)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// List available series and exit
    #[arg(long)]
    list: bool,

    /// Regular expression filtering listed series
    #[arg(long)]
    pattern: Option<String>,

    /// Write correlation charts into this directory
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Comma separated names or rank positions to chart
    #[arg(long, value_delimiter = ',')]
    plot_columns: Vec<String>,

    /// Draw all curves on one chart
    #[arg(long)]
    combined: bool,

    /// Print the full lag x column matrix
    #[arg(long)]
    matrix: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let settings = AnalysisSettings::load();
    let source: Box<dyn DataSource> = if args.path.is_dir() {
        Box::new(CsvDirectorySource::new(&args.path))
    } else {
        Box::new(CsvFileSource::new(&args.path))
    };

    if args.list {
        let filter = match &args.pattern {
            Some(pattern) => SeriesFilter::matching(pattern)?,
            None => SeriesFilter::default(),
        }
        .with_limit(settings.series_limit);
        for series in source.list_series(&filter)? {
            println!(
                "{:<40} {:>8} samples {:>6} missing",
                series.id, series.samples, series.missing
            );
        }
        return Ok(());
    }

    let reference = args
        .reference
        .as_deref()
        .context("--reference is required unless --list is given")?;
    let lag_text = args
        .lags
        .as_deref()
        .context("--lags is required unless --list is given")?;

    let table = load_table(source.as_ref(), &args.columns)?;
    let method = args.method.unwrap_or(settings.interpolation);

    let table = match &args.resample {
        Some(interval) => resample(&table, parse_duration(interval)?, method)
            .context("resampling failed")?,
        None => table,
    };
    let table = if args.fill {
        fill_missing(&table, method)?
    } else {
        table
    };

    let lags = build_lag_set(lag_text, args.lag_count, args.lag_step.as_deref(), &settings)?;
    let want_matrix = args.matrix || args.plot.is_some();
    let outcome = search_best_lag(&table, &ColumnSelector::parse(reference), &lags, want_matrix)
        .context("lag search failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_report(&outcome.report);
        if args.matrix {
            if let Some(matrix) = &outcome.matrix {
                println!();
                print_matrix(matrix);
            }
        }
    }

    if let (Some(dir), Some(matrix)) = (&args.plot, &outcome.matrix) {
        let selection = parse_plot_selection(&args.plot_columns)?;
        let curves = correlation_curves(matrix, &selection)?;
        let mut options = settings.plot.clone();
        options.separate = !args.combined;
        for path in render_png(&curves, &options, dir)? {
            tracing::info!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn load_table(source: &dyn DataSource, columns: &[String]) -> Result<TimeSeriesTable> {
    if !columns.is_empty() {
        return Ok(source.fetch(columns)?);
    }
    let all = source.list_series(&SeriesFilter::default().with_limit(usize::MAX))?;
    let ids: Vec<String> = all.into_iter().map(|s| s.id).collect();
    if ids.is_empty() {
        bail!("no series found");
    }
    Ok(source.fetch(&ids)?)
}

fn build_lag_set(
    text: &str,
    count: Option<usize>,
    step: Option<&str>,
    settings: &AnalysisSettings,
) -> Result<LagSet> {
    let (start, end) = text
        .split_once("..")
        .with_context(|| format!("lag range '{}' must look like START..END", text))?;
    let (start, end) = (parse_duration(start)?, parse_duration(end)?);

    let lags = match step {
        Some(step) => LagSet::stepped(start, end, parse_duration(step)?)?,
        None => LagSet::linspace(start, end, count.unwrap_or(settings.lag_count))?,
    };
    Ok(lags)
}

fn parse_plot_selection(items: &[String]) -> Result<ColumnSelection> {
    if items.is_empty() {
        return Ok(ColumnSelection::All);
    }
    let ranks: Vec<usize> = items.iter().filter_map(|s| s.trim().parse().ok()).collect();
    if ranks.len() == items.len() {
        return Ok(ColumnSelection::Ranks(ranks));
    }
    if !ranks.is_empty() {
        bail!("--plot-columns takes either names or rank positions, not both");
    }
    Ok(ColumnSelection::Names(
        items.iter().map(|s| s.trim().to_string()).collect(),
    ))
}

fn print_report(report: &RankingReport) {
    println!("{:>4}  {:<32} {:>12}  {:>16}", "rank", "column", "correlation", "lag");
    for (i, record) in report.iter().enumerate() {
        let lag = record.lag.map(format_lag).unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<32} {:>12.6}  {:>16}",
            i, record.column, record.correlation, lag
        );
    }
}

fn print_matrix(matrix: &CrossCorrelationMatrix) {
    print!("{:>16}", "lag");
    for column in &matrix.columns {
        print!(" {:>12}", column);
    }
    println!();
    for (lag, row) in matrix.lags.iter().zip(&matrix.values) {
        print!("{:>16}", format_lag(*lag));
        for value in row {
            print!(" {:>12.6}", value);
        }
        println!();
    }
}
