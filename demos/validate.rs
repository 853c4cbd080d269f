// Reads game records and prints warnings and errors.
// Usage: cargo run --example validate -- [--xml] [--charset LABEL] [FILE]...
// Set RUST_LOG=sgf_reader=debug to see charset restarts.

use std::{path::PathBuf, process};

use clap::Parser;
use sgf_reader::{Config, SgfReader, Warnings, XmlReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Validates SGF and Jago XML game records", long_about = None)]
struct Args {
    /// Read all files as XML, regardless of their extension
    #[arg(long)]
    xml: bool,

    /// Charset of SGF files without a CA property
    #[arg(long)]
    charset: Option<String>,

    /// Ignore CA properties
    #[arg(long)]
    ignore_charset: bool,

    /// Print a dot for each percent read
    #[arg(long)]
    progress: bool,

    files: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config {
        honor_charset: !args.ignore_charset,
        ..Config::default()
    };
    if let Some(ref label) = args.charset {
        match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(encoding) => config.default_charset = encoding,
            None => {
                eprintln!("unknown charset: {label}");
                process::exit(2);
            }
        }
    }

    let mut success = true;
    for path in &args.files {
        let is_xml = args.xml || path.extension().is_some_and(|ext| ext == "xml");
        let mut show = |percent: u32| {
            if percent > 0 {
                eprint!(".");
            }
        };
        let progress: Option<&mut dyn sgf_reader::ProgressShow> =
            if args.progress { Some(&mut show) } else { None };

        let result = if is_xml {
            XmlReader::open_with(path, config.clone(), progress)
                .map(|reader| (reader.tree().len(), reader.warnings().clone()))
        } else {
            SgfReader::open_with(path, config.clone(), progress)
                .map(|reader| (reader.tree().len(), reader.warnings().clone()))
        };
        if args.progress {
            eprintln!();
        }

        match result {
            Ok((nodes, warnings)) => report(path, nodes, &warnings),
            Err(err) => {
                println!("{}: error: {}", path.display(), err);
                success = false;
            }
        }
    }

    if !success {
        process::exit(1);
    }
}

fn report(path: &std::path::Path, nodes: usize, warnings: &Warnings) {
    if warnings.is_empty() {
        println!("{}: {} nodes, ok", path.display(), nodes);
    } else {
        println!("{}: {} nodes, {} warnings", path.display(), nodes, warnings.len());
        for warning in warnings {
            println!("  {warning}");
        }
    }
}
