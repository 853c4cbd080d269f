// Counts nodes, moves, variations and markup in game records.
// Usage: cargo run --release --example stats -- [FILE]...

use std::path::PathBuf;

use clap::Parser;
use sgf_reader::{GameTree, Result, SgfReader, XmlReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Prints statistics about game records", long_about = None)]
struct Args {
    files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
struct Stats {
    nodes: usize,
    moves: usize,
    passes: usize,
    variations: usize,
    setup: usize,
    marks: usize,
    labels: usize,
    comments: usize,
    main_variation: usize,
}

impl Stats {
    fn new(tree: &GameTree) -> Stats {
        let mut stats = Stats {
            main_variation: tree.main_variation().count(),
            ..Stats::default()
        };
        for (_, node) in tree.iter() {
            stats.nodes += 1;
            match node.mv {
                Some(mv) if mv.is_pass() => stats.passes += 1,
                Some(_) => stats.moves += 1,
                None => (),
            }
            stats.variations += node.children().len().saturating_sub(1);
            stats.setup += node.setup.black.len() + node.setup.white.len() + node.setup.empty.len();
            stats.marks += node.marks.len();
            stats.labels += node.labels.len();
            stats.comments += usize::from(node.comment.is_some());
        }
        stats
    }
}

fn read(path: &PathBuf) -> Result<GameTree> {
    if path.extension().is_some_and(|ext| ext == "xml") {
        XmlReader::open(path).map(XmlReader::into_tree)
    } else {
        SgfReader::open(path).map(SgfReader::into_tree)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    for path in Args::parse().files {
        match read(&path) {
            Ok(tree) => {
                info!(board_size = tree.board_size(), "read {}", path.display());
                println!("{}: {:?}", path.display(), Stats::new(&tree));
            }
            Err(err) => eprintln!("{}: {}", path.display(), err),
        }
    }
}
