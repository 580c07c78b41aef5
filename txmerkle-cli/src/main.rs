use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use txmerkle_core::{
    DoubleBlake3, DoubleSha256, Hash256, LeafHash, MerkleResult, MerkleSources, MerkleTree,
    Transaction,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HasherKind { Sha256d, Blake3d }

#[derive(Parser)]
#[command(name="txmerkle", version, about="Bitcoin-style merkle roots with CVE-2012-2459 detection")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)] cmd: Cmd,
}

#[derive(Args)]
struct InputArgs {
    /// Text file with one hex leaf hash per line ('#' comments allowed)
    #[arg(long)] hashes: Option<PathBuf>,
    /// Directory whose regular files are hashed as items, in path order
    #[arg(long)] items: Option<PathBuf>,
    /// JSON array of {"txid": "<hex>"} objects
    #[arg(long)] txs: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t=HasherKind::Sha256d)] hasher: HasherKind,
    /// Read and print hex in reversed (Bitcoin display) byte order
    #[arg(long, default_value_t=false)] display_order: bool,
}

#[derive(Subcommand)]
enum Cmd {
    /// Compute the merkle root and report tail duplicates
    Root {
        #[command(flatten)] input: InputArgs,
        #[arg(long, default_value_t=false)] json: bool,
        /// Exit with an error when tail duplicates are detected
        #[arg(long, default_value_t=false)] strict: bool,
    },
    /// Check leaves against an expected root; tail duplicates count as failure
    Check {
        #[arg(long)] expected: String,
        #[command(flatten)] input: InputArgs,
    },
}

#[derive(Deserialize)]
struct TxRecord { txid: String }

struct TxEntry { txid: LeafHash }

impl Transaction for TxEntry {
    fn transaction_hash(&self) -> LeafHash { self.txid }
}

#[derive(Serialize)]
struct RootReport { root: String, tail_duplicates: bool, leaves: usize }

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Cmd::Root { input, json, strict } => root(&input, json, strict)?,
        Cmd::Check { expected, input } => check(&expected, &input)?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose { 0 => "warn", 1 => "debug", _ => "trace" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn parse_hash(s: &str, display_order: bool) -> Result<LeafHash> {
    let h = if display_order { LeafHash::from_display_hex(s) } else { LeafHash::from_hex(s) };
    Ok(h?)
}

fn fmt_hash(h: &LeafHash, display_order: bool) -> String {
    if display_order { h.to_display_hex() } else { h.to_hex() }
}

fn read_hash_list(path: &Path, display_order: bool) -> Result<Vec<LeafHash>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut out = vec![];
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        out.push(parse_hash(line, display_order).with_context(|| format!("{}:{}", path.display(), n + 1))?);
    }
    debug!("loaded {} hashes from {}", out.len(), path.display());
    Ok(out)
}

fn read_txs(path: &Path, display_order: bool) -> Result<Vec<TxEntry>> {
    let f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let records: Vec<TxRecord> = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse transactions {}", path.display()))?;
    let mut out = Vec::with_capacity(records.len());
    for (i, r) in records.iter().enumerate() {
        let txid = parse_hash(&r.txid, display_order).with_context(|| format!("transaction #{}", i))?;
        out.push(TxEntry { txid });
    }
    debug!("loaded {} transactions from {}", out.len(), path.display());
    Ok(out)
}

fn read_items(dir: &Path) -> Result<Vec<Vec<u8>>> {
    let md = fs::metadata(dir).with_context(|| format!("stat {}", dir.display()))?;
    if !md.is_dir() { bail!("{} is not a directory", dir.display()); }
    let mut files: Vec<PathBuf> = vec![];
    for e in WalkDir::new(dir).min_depth(1) {
        let e = e?;
        if e.file_type().is_file() { files.push(e.path().to_path_buf()); }
    }
    files.sort();
    let mut items = Vec::with_capacity(files.len());
    for p in &files {
        items.push(fs::read(p).with_context(|| format!("read {}", p.display()))?);
    }
    debug!("loaded {} items from {}", items.len(), dir.display());
    Ok(items)
}

fn compute(input: &InputArgs) -> Result<(MerkleResult, usize)> {
    let hashes = input.hashes.as_deref().map(|p| read_hash_list(p, input.display_order)).transpose()?;
    let txs = input.txs.as_deref().map(|p| read_txs(p, input.display_order)).transpose()?;
    let items = input.items.as_deref().map(read_items).transpose()?;

    let sources = MerkleSources {
        hashes,
        transactions: txs.as_ref().map(|v| v.iter().map(|t| t as &dyn Transaction).collect()),
        items: items.as_ref().map(|v| v.iter().map(|i| i.as_slice()).collect()),
    };
    match input.hasher {
        HasherKind::Sha256d => build(sources, DoubleSha256),
        HasherKind::Blake3d => build(sources, DoubleBlake3),
    }
}

fn build<H: Hash256>(sources: MerkleSources<'_>, hasher: H) -> Result<(MerkleResult, usize)> {
    let tree = MerkleTree::from_sources_with_hasher(sources, hasher).context("build merkle tree")?;
    let result = tree.result();
    info!(leaves = tree.leaf_count(), tail_duplicates = result.tail_duplicates, "merkle root computed");
    Ok((result, tree.leaf_count()))
}

fn root(input: &InputArgs, json: bool, strict: bool) -> Result<()> {
    let (result, leaves) = compute(input)?;
    let root_hex = fmt_hash(&result.root, input.display_order);
    if json {
        let report = RootReport { root: root_hex, tail_duplicates: result.tail_duplicates, leaves };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("root={}", root_hex);
        println!("tail_duplicates={}", result.tail_duplicates);
    }
    if strict && result.tail_duplicates {
        bail!("tail duplicates detected (CVE-2012-2459)");
    }
    Ok(())
}

fn check(expected: &str, input: &InputArgs) -> Result<()> {
    let expected = parse_hash(expected, input.display_order).context("parse --expected")?;
    let (result, _) = compute(input)?;
    match result.check_against(&expected) {
        Ok(()) => { println!("OK"); Ok(()) }
        Err(e) => { println!("BAD"); Err(e.into()) }
    }
}
