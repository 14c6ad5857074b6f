#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use omni_vault::{Metadata, Vault, VaultSettings};

#[derive(Parser, Debug)]
#[command(
    name = "vault",
    about = "Vault CLI for note management and link-graph analysis",
    arg_required_else_help = true
)]
struct Cli {
    /// Vault root directory (must contain the sentinel directory, `.obsidian` by default).
    #[arg(
        long,
        short = 'r',
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    root: PathBuf,

    /// Explicit settings file, merged over `<root>/.omni-vault.yaml` and `OMNI_VAULT_CONFIG`.
    #[arg(long = "conf", short = 'c', value_name = "FILE", global = true)]
    config_file: Option<PathBuf>,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Json, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List note identifiers.
    List,
    /// Read one note (metadata, body, links, tags).
    Read {
        name: String,
        #[arg(long)]
        folder: Option<String>,
    },
    /// Create a new note; fails if it exists.
    Create {
        name: String,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Header metadata as a YAML (or JSON) mapping.
        #[arg(long = "meta", value_name = "YAML")]
        metadata: Option<String>,
    },
    /// Append (default) or prepend content and merge metadata.
    Update {
        name: String,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, default_value_t = false)]
        prepend: bool,
        /// Metadata keys to merge, as a YAML (or JSON) mapping.
        #[arg(long = "meta", value_name = "YAML")]
        metadata: Option<String>,
    },
    /// Build the index and print it.
    Index {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Notes linking to a note.
    Backlinks { name: String },
    /// Notes with no links in or out.
    Orphans,
    /// Links to notes that do not exist.
    Broken,
    /// Connection suggestions.
    Suggest {
        #[command(subcommand)]
        by: SuggestBy,
    },
    /// Dashboard summary.
    Summary,
    /// Chunks of one note as handed to a semantic index.
    Chunk {
        name: String,
        #[arg(long)]
        folder: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SuggestBy {
    /// Unlinked notes with shared tags.
    Tags,
    /// Unlinked notes with overlapping keywords.
    Keywords {
        #[arg(long = "min-overlap")]
        min_overlap: Option<usize>,
    },
    /// Notes two hops apart.
    Graph,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn emit<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    let rendered = match output {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
    }
    .context("failed to serialize CLI output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn full_name(name: &str, folder: Option<&str>) -> String {
    match folder.map(|f| f.trim().trim_matches('/')) {
        Some(folder) if !folder.is_empty() => format!("{folder}/{name}"),
        _ => name.to_string(),
    }
}

fn parse_metadata(raw: Option<&str>) -> Result<Option<Metadata>> {
    raw.map(|text| {
        Metadata::from_yaml_str(text)
            .map_err(anyhow::Error::msg)
            .context("--meta must be a YAML mapping")
    })
    .transpose()
}

fn execute(cli: &Cli, vault: &Vault) -> Result<()> {
    match &cli.command {
        Command::List => emit(&vault.list_notes(), cli.output),
        Command::Read { name, folder } => {
            let note = vault.read_note(&full_name(name, folder.as_deref()))?;
            emit(&note, cli.output)
        }
        Command::Create {
            name,
            folder,
            content,
            metadata,
        } => {
            let metadata = parse_metadata(metadata.as_deref())?;
            let note = vault.create_note(
                &full_name(name, folder.as_deref()),
                metadata.as_ref(),
                content.as_deref(),
            )?;
            emit(&note, cli.output)
        }
        Command::Update {
            name,
            folder,
            content,
            prepend,
            metadata,
        } => {
            let metadata = parse_metadata(metadata.as_deref())?;
            let note = vault.update_note(
                &full_name(name, folder.as_deref()),
                content.as_deref(),
                !prepend,
                metadata.as_ref(),
            )?;
            emit(&note, cli.output)
        }
        Command::Index { force } => emit(vault.build_index(*force).as_ref(), cli.output),
        Command::Backlinks { name } => emit(
            &json!({ "note": name, "backlinks": vault.get_backlinks(name) }),
            cli.output,
        ),
        Command::Orphans => emit(&vault.find_orphaned_notes(), cli.output),
        Command::Broken => emit(&vault.find_broken_links(), cli.output),
        Command::Suggest { by } => {
            let suggestions = match by {
                SuggestBy::Tags => vault.suggest_connections_by_tags(),
                SuggestBy::Keywords { min_overlap } => {
                    vault.suggest_connections_by_keywords(*min_overlap)
                }
                SuggestBy::Graph => vault.suggest_connections_by_graph(),
            };
            emit(&suggestions, cli.output)
        }
        Command::Summary => emit(&vault.summary(), cli.output),
        Command::Chunk { name, folder } => {
            let chunks = vault.chunk_note(&full_name(name, folder.as_deref()))?;
            emit(&chunks, cli.output)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; library `log` records are bridged into the subscriber.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("omni_vault=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let settings = VaultSettings::load(&cli.root, cli.config_file.as_deref())
        .with_context(|| format!("failed to load settings for {}", cli.root.display()))?;
    let vault = Vault::open_with_settings(&cli.root, settings)
        .with_context(|| format!("failed to open vault at {}", cli.root.display()))?;
    execute(&cli, &vault)
}
