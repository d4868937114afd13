use anyhow::{Context, Result};
use blobtree_core::{BlobTree, BlobTreeNode, Hash, PATH_SEPARATOR, WalkOptions};
use clap::{Args, Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod output;

use output::{
    BlobInfo, CopyOutput, EntryKind, FindOutput, FlattenOutput, HashOutput, LsOutput,
    OutputWriter, SizeOutput, TreeEntry,
};

/// Blobtree - mirror directories as trees of blobs
#[derive(Parser)]
#[command(name = "blobtree")]
#[command(about = "Inspect and copy directory trees as blob trees", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    walk: WalkArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Directory import options.
#[derive(Args, Debug, Clone, Copy)]
struct WalkArgs {
    /// Import dot-files (default)
    #[arg(long, global = true, overrides_with = "no_hidden")]
    hidden: bool,

    /// Skip dot-files
    #[arg(long, global = true, overrides_with = "hidden")]
    no_hidden: bool,

    /// Skip entries matched by .gitignore
    #[arg(long, global = true)]
    gitignore: bool,

    /// Follow symlinks instead of skipping them
    #[arg(long, global = true)]
    follow_links: bool,
}

impl WalkArgs {
    fn options(&self) -> WalkOptions {
        WalkOptions::default()
            .include_hidden(self.hidden || !self.no_hidden)
            .respect_gitignore(self.gitignore)
            .follow_links(self.follow_links)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tree, one entry per line
    Ls {
        /// Directory to read
        dir: PathBuf,

        /// Show byte sizes
        #[arg(short, long)]
        long: bool,
    },

    /// List every blob, deepest first
    Flatten {
        /// Directory to read
        dir: PathBuf,
    },

    /// Print the total content size
    Size {
        /// Directory to read
        dir: PathBuf,
    },

    /// Resolve a backslash-separated path to a node or blob
    Find {
        /// Directory to read
        dir: PathBuf,

        /// Path such as `docs\README.md`
        path: String,

        /// Compare names case-insensitively
        #[arg(short, long)]
        ignore_case: bool,
    },

    /// Print the content digest of the tree
    Hash {
        /// Directory to read
        dir: PathBuf,

        /// Fail unless the digest equals this hex value
        #[arg(long, value_name = "HEX")]
        expect: Option<Hash>,
    },

    /// Read a directory and write it back elsewhere
    Copy {
        /// Source directory
        src: PathBuf,

        /// Destination directory
        dest: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let output = OutputWriter::new(cli.json);
    let opts = cli.walk.options();

    let result = match cli.command {
        Commands::Ls { dir, long } => cmd_ls(&output, &dir, &opts, long),
        Commands::Flatten { dir } => cmd_flatten(&output, &dir, &opts),
        Commands::Size { dir } => cmd_size(&output, &dir, &opts),
        Commands::Find {
            dir,
            path,
            ignore_case,
        } => cmd_find(&output, &dir, &opts, &path, ignore_case),
        Commands::Hash { dir, expect } => cmd_hash(&output, &dir, &opts, expect),
        Commands::Copy { src, dest } => cmd_copy(&output, &src, &dest, &opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.write_error(&err, 1);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    debug!(verbosity, "logging initialised");
}

fn load(dir: &Path, opts: &WalkOptions) -> Result<BlobTree> {
    BlobTree::from_directory_with(dir, opts)
        .with_context(|| format!("Failed to read directory {}", dir.display()))
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, name)
    }
}

/// Collect nodes and blobs below `node` in listing order: each child node is
/// followed by its contents, then the node's own blobs.
fn collect_entries(node: &BlobTreeNode, prefix: &str, level: usize, out: &mut Vec<TreeEntry>) {
    for child in &node.nodes {
        let path = join_path(prefix, &child.name);
        out.push(TreeEntry {
            kind: EntryKind::Node,
            path: path.clone(),
            level,
            size: child.compute_size(),
        });
        collect_entries(child, &path, level + 1, out);
    }
    for blob in &node.blobs {
        out.push(TreeEntry {
            kind: EntryKind::Blob,
            path: join_path(prefix, &blob.name),
            level,
            size: blob.len(),
        });
    }
}

fn cmd_ls(output: &OutputWriter, dir: &Path, opts: &WalkOptions, long: bool) -> Result<()> {
    let tree = load(dir, opts)?;

    let mut entries = Vec::new();
    collect_entries(tree.root(), "", 1, &mut entries);

    let data = LsOutput {
        success: true,
        result_code: 0,
        root: dir.display().to_string(),
        entries,
    };

    output.write(&data, || {
        let mut text = String::new();
        for entry in &data.entries {
            let name = entry
                .path
                .rsplit(PATH_SEPARATOR)
                .next()
                .unwrap_or(&entry.path);
            let suffix = match entry.kind {
                EntryKind::Node => "\\",
                EntryKind::Blob => "",
            };
            let indent = "  ".repeat(entry.level - 1);
            if long {
                let _ = writeln!(text, "{:>10} {}{}{}", entry.size, indent, name, suffix);
            } else {
                let _ = writeln!(text, "{}{}{}", indent, name, suffix);
            }
        }
        text
    })
}

fn cmd_flatten(output: &OutputWriter, dir: &Path, opts: &WalkOptions) -> Result<()> {
    let tree = load(dir, opts)?;

    let blobs: Vec<BlobInfo> = tree
        .flatten()
        .iter()
        .map(|blob| BlobInfo {
            name: blob.name.clone(),
            size: blob.len(),
            hash: blob.hash(),
        })
        .collect();

    let data = FlattenOutput {
        success: true,
        result_code: 0,
        blobs,
    };

    output.write(&data, || {
        let mut text = String::new();
        for blob in &data.blobs {
            let _ = writeln!(text, "{} {:>10} {}", blob.hash, blob.size, blob.name);
        }
        text
    })
}

fn cmd_size(output: &OutputWriter, dir: &Path, opts: &WalkOptions) -> Result<()> {
    let tree = load(dir, opts)?;

    let data = SizeOutput {
        success: true,
        result_code: 0,
        bytes: tree.compute_size(),
        blobs: tree.flatten().len(),
    };

    output.write(&data, || {
        format!("{} bytes in {} blobs\n", data.bytes, data.blobs)
    })
}

fn cmd_find(
    output: &OutputWriter,
    dir: &Path,
    opts: &WalkOptions,
    path: &str,
    ignore_case: bool,
) -> Result<()> {
    let tree = load(dir, opts)?;

    let data = if let Some(node) = tree
        .find_node(path, ignore_case)
        .with_context(|| format!("Invalid path: {}", path))?
    {
        FindOutput {
            success: true,
            result_code: 0,
            path: path.to_string(),
            kind: EntryKind::Node,
            size: node.compute_size(),
            hash: node.digest(),
        }
    } else if let Some(blob) = tree
        .find_blob(path, ignore_case)
        .with_context(|| format!("Invalid path: {}", path))?
    {
        FindOutput {
            success: true,
            result_code: 0,
            path: path.to_string(),
            kind: EntryKind::Blob,
            size: blob.len(),
            hash: blob.hash(),
        }
    } else {
        anyhow::bail!("Not found: {}", path);
    };

    output.write(&data, || {
        let kind = match data.kind {
            EntryKind::Node => "node",
            EntryKind::Blob => "blob",
        };
        format!("{} {} {} bytes {}\n", kind, data.hash, data.size, data.path)
    })
}

fn check_digest(actual: Hash, expected: Option<Hash>) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => {
            anyhow::bail!("Digest mismatch: expected {}, got {}", expected, actual)
        }
        _ => Ok(()),
    }
}

fn cmd_hash(
    output: &OutputWriter,
    dir: &Path,
    opts: &WalkOptions,
    expect: Option<Hash>,
) -> Result<()> {
    let tree = load(dir, opts)?;
    let hash = tree.digest();
    check_digest(hash, expect)?;

    let data = HashOutput {
        success: true,
        result_code: 0,
        hash,
        expected: expect,
    };

    output.write(&data, || match data.expected {
        Some(_) => format!("{} OK\n", data.hash),
        None => format!("{}\n", data.hash),
    })
}

fn cmd_copy(output: &OutputWriter, src: &Path, dest: &Path, opts: &WalkOptions) -> Result<()> {
    let tree = load(src, opts)?;

    tree.save_to_directory(dest)
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    let data = CopyOutput {
        success: true,
        result_code: 0,
        source: src.display().to_string(),
        destination: dest.display().to_string(),
        blobs: tree.flatten().len(),
        bytes: tree.compute_size(),
    };

    output.write(&data, || {
        format!(
            "Copied {} blobs ({} bytes) from {} to {}\n",
            data.blobs, data.bytes, data.source, data.destination
        )
    })
}
