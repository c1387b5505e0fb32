use std::env;
use std::error::Error;

use fileformat::facade::{dump_path, load_path};
use fileformat::{FileExistsPolicy, LoadOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_usage_and_exit() -> ! {
    eprintln!("Usage:");
    eprintln!("  fileformat_convert <input> <output>");
    eprintln!("  fileformat_convert --append <input> <output>");
    eprintln!();
    eprintln!("Formats are picked by extension: csv, tsv, json, jsonl, ndjson, xml, xlsx.");
    eprintln!("Set RUST_LOG to control log output (default: info).");
    std::process::exit(1);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn convert(input: String, output: String, policy: FileExistsPolicy) -> Result<(), Box<dyn Error>> {
    let table = load_path(&input, None, &LoadOptions::default())?;
    info!(
        input = %input,
        rows = table.row_count(),
        columns = table.column_count(),
        "input loaded"
    );

    dump_path(&table, &output, None, policy)?;
    info!(output = %output, "output written");
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);

    let first = match args.next() {
        Some(arg) => arg,
        None => return Err("missing arguments".into()),
    };

    let (policy, input) = if first == "--append" {
        match args.next() {
            Some(input) => (FileExistsPolicy::Append, input),
            None => return Err("--append requires an input path".into()),
        }
    } else {
        (FileExistsPolicy::Overwrite, first)
    };

    let output = match args.next() {
        Some(o) => o,
        None => return Err("missing output argument".into()),
    };

    if args.next().is_some() {
        return Err("too many arguments".into());
    }

    convert(input, output, policy)
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        eprintln!("fileformat_convert error: {e}");
        print_usage_and_exit();
    }
}
