//! Command-line host for a Zen Note store.
//!
//! # Responsibility
//! - Stand in for the UI layer: load the workspace, apply one command,
//!   render the resulting tree.
//! - Resolve store path and logging settings from flags or environment.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use zennote_core::db::open_db;
use zennote_core::{
    default_log_level, init_logging, KvStore, NodeId, NodeKind, SqliteKvStore, WorkspaceService,
};

#[derive(Parser, Debug)]
#[command(name = "zennote")]
#[command(about = "Inspect and edit a Zen Note store")]
#[command(version)]
struct Cli {
    /// SQLite file holding the note store
    #[arg(long, env = "ZENNOTE_DB", default_value = "zennote.sqlite3")]
    db: PathBuf,
    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, env = "ZENNOTE_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, env = "ZENNOTE_LOG_LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sidebar tree
    Tree {
        /// Emit the traversal as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one note's content
    Show { title: String },
    /// Create and save a note (default title when omitted)
    New {
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Replace a note's content and save it, creating the note if needed
    Save { title: String, content: String },
    /// Rename a note
    Rename { old: String, new: String },
    /// Delete a note (the welcome note is only hidden)
    Delete { title: String },
    /// Bring back a deleted welcome note
    RestoreWelcome,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Tree { .. } => "tree",
            Self::Show { .. } => "show",
            Self::New { .. } => "new",
            Self::Save { .. } => "save",
            Self::Rename { .. } => "rename",
            Self::Delete { .. } => "delete",
            Self::RestoreWelcome => "restore_welcome",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy()).map_err(|err| anyhow!(err))?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open note store `{}`", cli.db.display()))?;
    let store = SqliteKvStore::try_new(&conn)?;
    let mut workspace = WorkspaceService::open(store)?;

    let name = cli.command.name();
    run(&mut workspace, cli.command)?;
    info!("event=cli_command module=cli status=ok command={name}");
    Ok(())
}

fn run<S: KvStore>(workspace: &mut WorkspaceService<S>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Tree { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&workspace.tree().walk())?);
            } else {
                print_tree(workspace);
            }
        }
        Command::Show { title } => {
            let id = find_note(workspace, &title)?;
            if let Some(note) = workspace.tree().get(id) {
                println!("{}", note.content);
            }
        }
        Command::New { title, content } => {
            let id = workspace.create_note(None, title.as_deref())?;
            workspace.set_content(id, content.unwrap_or_default())?;
            workspace.save_note(id)?;
            print_tree(workspace);
        }
        Command::Save { title, content } => {
            let existing = workspace.tree().find_note(&title).map(|note| note.id);
            let id = match existing {
                Some(id) => id,
                None => workspace.create_note(None, Some(&title))?,
            };
            workspace.set_content(id, content)?;
            workspace.save_note(id)?;
            println!("Saved!");
        }
        Command::Rename { old, new } => {
            let id = find_note(workspace, &old)?;
            workspace.rename(id, &new)?;
            print_tree(workspace);
        }
        Command::Delete { title } => {
            let id = find_note(workspace, &title)?;
            workspace.delete_item(id)?;
            print_tree(workspace);
        }
        Command::RestoreWelcome => {
            workspace.restore_welcome()?;
            print_tree(workspace);
        }
    }
    Ok(())
}

fn find_note<S: KvStore>(workspace: &WorkspaceService<S>, title: &str) -> anyhow::Result<NodeId> {
    match workspace.tree().find_note(title) {
        Some(note) => Ok(note.id),
        None => bail!("no note titled `{title}`"),
    }
}

fn print_tree<S: KvStore>(workspace: &WorkspaceService<S>) {
    let tree = workspace.tree();
    let active = tree.active_id();
    for entry in tree.visible_entries() {
        let node = entry.node;
        let marker = match (node.kind, node.expanded) {
            (NodeKind::Folder, true) => "v",
            (NodeKind::Folder, false) => ">",
            (NodeKind::Note, _) => "-",
        };
        let selected = if Some(node.id) == active { " *" } else { "" };
        println!(
            "{}{marker} {}{selected}",
            "  ".repeat(entry.depth),
            node.title
        );
    }
    if workspace.can_restore_welcome() {
        println!("(welcome note hidden; run `zennote restore-welcome`)");
    }
}
