// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use bucketfs::{ContentKind, Format};
use clap::{Parser, Subcommand};

use cmd::commands::{self, PutSource};
use cmd::common::{get_store_path_with_override, load_config, open_manager};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bucketfs")]
struct Cli {
    /// Store root directory; each sub-directory is a container (default: $BUCKETFS_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory, a container, or the root
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Show the model of a path as JSON
    Stat { path: String },
    /// Print the content of a file or notebook
    Cat {
        path: String,
        /// text or base64; inferred when absent
        #[arg(long)]
        format: Option<Format>,
    },
    /// Write a file or notebook
    Put {
        path: String,
        /// Literal content to store
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        /// Host file whose bytes are stored
        #[arg(long)]
        file: Option<PathBuf>,
        /// text, base64 or json (notebooks)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Create a directory, or a container at the top level
    Mkdir { path: String },
    /// Remove a file, a directory tree or a container
    Rm {
        path: String,
        /// Leave the checkpoints of a removed file in place
        #[arg(long)]
        keep_checkpoints: bool,
    },
    /// Move a file or directory
    Mv { from: String, to: String },
    /// Copy a file or notebook
    Cp { from: String, to: String },
    /// Create an untitled file, notebook or directory
    Touch {
        dir: String,
        #[arg(long, default_value = "file")]
        kind: ContentKind,
        /// File extension, including the dot
        #[arg(long, default_value = "")]
        ext: String,
    },
    /// Manage checkpoints of a file
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommands,
    },
}

#[derive(Subcommand)]
enum CheckpointCommands {
    Create { path: String },
    List { path: String },
    Restore { path: String, id: String },
    Delete { path: String, id: String },
}

async fn run(cli: Cli) -> Result<String> {
    let root = get_store_path_with_override(cli.store)?;
    let config = load_config(cli.config.as_deref())?;
    let cm = open_manager(&root, config)?;

    match cli.command {
        Commands::Ls { path } => commands::list_command(&cm, &path).await,
        Commands::Stat { path } => commands::stat_command(&cm, &path).await,
        Commands::Cat { path, format } => commands::cat_command(&cm, &path, format).await,
        Commands::Put {
            path,
            content,
            file,
            format,
        } => {
            let source = match (&content, &file) {
                (Some(text), _) => PutSource::Content(text),
                (None, Some(file)) => PutSource::File(file),
                (None, None) => return Err(anyhow!("put needs --content or --file")),
            };
            commands::put_command(&cm, &path, source, format).await
        }
        Commands::Mkdir { path } => commands::mkdir_command(&cm, &path).await,
        Commands::Rm {
            path,
            keep_checkpoints,
        } => commands::remove_command(&cm, &path, keep_checkpoints).await,
        Commands::Mv { from, to } => commands::rename_command(&cm, &from, &to).await,
        Commands::Cp { from, to } => commands::copy_command(&cm, &from, &to).await,
        Commands::Touch { dir, kind, ext } => commands::touch_command(&cm, &dir, kind, &ext).await,
        Commands::Checkpoint { command } => match command {
            CheckpointCommands::Create { path } => {
                commands::checkpoint_create_command(&cm, &path).await
            }
            CheckpointCommands::List { path } => commands::checkpoint_list_command(&cm, &path).await,
            CheckpointCommands::Restore { path, id } => {
                commands::checkpoint_restore_command(&cm, &path, &id).await
            }
            CheckpointCommands::Delete { path, id } => {
                commands::checkpoint_delete_command(&cm, &path, &id).await
            }
        },
    }
}

#[tokio::main]
#[allow(clippy::print_stdout)]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let output = run(cli).await?;
    print!("{output}");
    Ok(())
}
