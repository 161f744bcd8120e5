mod config;
mod corpus;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use elidx_core::persist::{load_index_store, load_meta, save_index, save_meta, serialized_size, IndexPaths, MetaFile, FORMAT_VERSION};
use elidx_core::{BitString, CodecKind, IndexError, InvertedIndex, Language, StandardNormalizer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, compress and query an Elias-coded inverted index", long_about = None)]
struct Cli {
    /// Also write debug-level logs to this file (truncated on start)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Normalizer language (russian, english)
        #[arg(long, default_value = "russian")]
        language: Language,
    },
    /// Run Boolean AND queries against a saved index
    Search {
        #[arg(long)]
        index: String,
        /// Print the text of the first matching document
        #[arg(long, default_value_t = false)]
        show_doc: bool,
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Re-encode every postings list of a saved index (one way)
    Compress {
        #[arg(long)]
        index: String,
        /// gamma or delta
        #[arg(long)]
        codec: CodecKind,
        /// Where to write the compressed index; defaults to --index
        #[arg(long)]
        output: Option<String>,
    },
    /// Print the codeword of each number
    Encode {
        #[arg(long)]
        codec: CodecKind,
        #[arg(required = true)]
        numbers: Vec<u32>,
    },
    /// Decode a concatenation of codewords given as 0/1 text
    Decode {
        #[arg(long)]
        codec: CodecKind,
        bits: String,
    },
    /// Build, persist and query the corpus from a config file, uncompressed then gamma then delta
    Run {
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Build { input, output, language } => build(Path::new(&input), Path::new(&output), language),
        Commands::Search { index, show_doc, queries } => search(Path::new(&index), &queries, show_doc),
        Commands::Compress { index, codec, output } => {
            let output = output.unwrap_or_else(|| index.clone());
            compress(Path::new(&index), Path::new(&output), codec)
        }
        Commands::Encode { codec, numbers } => {
            for n in numbers {
                println!("{n}\t{}", codec.encode(n)?);
            }
            Ok(())
        }
        Commands::Decode { codec, bits } => {
            let bits: BitString = bits.parse()?;
            let values = codec.decode_all(&bits)?;
            println!("{}", values.iter().map(u32::to_string).collect::<Vec<_>>().join(" "));
            Ok(())
        }
        Commands::Run { config } => run(&config),
    }
}

/// Console at `RUST_LOG` (default info); optional file at debug.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let console = fmt::layer()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    let file = match log_file {
        Some(path) => {
            let f = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(f)).with_filter(EnvFilter::new("debug")))
        }
        None => None,
    };
    tracing_subscriber::registry().with(console).with(file).init();
    Ok(())
}

type Index = InvertedIndex<StandardNormalizer>;

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

fn build_index(input: &Path, language: Language) -> Result<Index> {
    let docs = corpus::load_corpus(input)?;
    let mut index = InvertedIndex::new(StandardNormalizer::new(language));
    let mut rejected = 0usize;
    for (id, text) in docs {
        match index.insert_document(id, &text) {
            Ok(()) => {}
            Err(IndexError::InvalidArgument(reason)) => {
                tracing::warn!(doc_id = id, %reason, "skipping document");
                rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), rejected, "ingested documents");
    Ok(index)
}

fn write_index(paths: &IndexPaths, index: &Index) -> Result<()> {
    save_index(paths, index.store())?;
    let meta = MetaFile {
        num_docs: index.num_docs(),
        num_terms: index.num_terms(),
        compression: index.compression_state(),
        language: index.normalizer().language(),
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(())
}

fn open_index(paths: &IndexPaths) -> Result<Index> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        anyhow::bail!("index format version {} is not supported (expected {FORMAT_VERSION})", meta.version);
    }
    let store = load_index_store(paths)?;
    let index = InvertedIndex::from_store(store, StandardNormalizer::new(meta.language))
        .with_context(|| format!("validating {}", paths.index().display()))?;
    Ok(index)
}

fn build(input: &Path, output: &Path, language: Language) -> Result<()> {
    let index = build_index(input, language)?;
    write_index(&IndexPaths::new(output), &index)?;
    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

fn search(dir: &Path, queries: &[String], show_doc: bool) -> Result<()> {
    let index = open_index(&IndexPaths::new(dir))?;
    run_queries(&index, queries, show_doc)
}

fn compress(dir: &Path, output: &Path, codec: CodecKind) -> Result<()> {
    let mut index = open_index(&IndexPaths::new(dir))?;
    let before = index.footprint();
    let (res, took) = timed(|| index.compress_index(codec));
    res?;
    let after = index.footprint();
    tracing::info!(
        %codec,
        took_s = took.as_secs_f64(),
        before_kib = before.total_kib(),
        after_kib = after.total_kib(),
        "compressed"
    );
    write_index(&IndexPaths::new(output), &index)
}

/// Logs hits and timing for each query. A query naming an unknown term is
/// reported and does not stop the remaining queries.
fn run_queries(index: &Index, queries: &[String], show_doc: bool) -> Result<()> {
    let state = index.compression_state();
    for query in queries {
        let (res, took) = timed(|| index.search(query));
        let hits = match res {
            Ok(hits) => hits,
            Err(IndexError::TermNotFound(term)) => {
                tracing::warn!(query = %query, %term, "no such term in index");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(query = %query, compression = ?state, took_s = took.as_secs_f64(), total = hits.len(), docs = ?hits, "search");
        if show_doc {
            if let Some(&doc_id) = hits.iter().next() {
                if let Some(text) = index.get_document(doc_id) {
                    tracing::info!(doc_id, "{text}");
                }
            }
        }
    }
    Ok(())
}

fn run(config_path: &Path) -> Result<()> {
    let cfg = AppConfig::load(config_path)?;
    tracing::info!(data_dir = %cfg.data_dir, queries = cfg.mentions.len(), "starting");

    let data_dir = Path::new(&cfg.data_dir);
    if !data_dir.exists() {
        tracing::warn!(path = %data_dir.display(), "creating data directory; it will most likely be empty");
        std::fs::create_dir_all(data_dir)?;
    }

    let index = build_index(data_dir, cfg.language)?;
    let paths = IndexPaths::new(cfg.index_dir());
    write_index(&paths, &index)?;
    drop(index);

    let index = open_index(&paths)?;
    let raw = index.footprint();
    tracing::info!(kib = raw.total_kib(), serialized = serialized_size(index.store())?, "uncompressed index size");
    run_queries(&index, &cfg.mentions, true)?;

    for codec in [CodecKind::Gamma, CodecKind::Delta] {
        let mut index = open_index(&paths)?;
        let (res, took) = timed(|| index.compress_index(codec));
        res?;
        let packed = index.footprint();
        tracing::info!(
            %codec,
            took_s = took.as_secs_f64(),
            kib = packed.total_kib(),
            ratio = packed.total_bytes() as f64 / raw.total_bytes().max(1) as f64,
            serialized = serialized_size(index.store())?,
            "compressed index size"
        );
        run_queries(&index, &cfg.mentions, false)?;
    }
    Ok(())
}
