//! Rolo CLI
//!
//! Command-line interface for Rolo - a personal address book.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rolo_core::{Config, ContactStore, ExportFormat, SortDirection};

mod commands;
mod editor;
mod logging;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "rolo")]
#[command(about = "Rolo - Local-first personal address book")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Manage contacts
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Manage fields on a contact
    Field {
        #[command(subcommand)]
        command: FieldCommands,
    },
    /// Export a contact to Markdown or PDF
    Export {
        /// Contact ID (full UUID or prefix)
        contact: String,
        /// Output format (markdown, md, pdf)
        #[arg(short, long, default_value = "markdown")]
        format: ExportFormat,
        /// Directory to write to (defaults to export_dir)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Open the exported file afterwards
        #[arg(long)]
        open: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ContactCommands {
    /// Create a new contact
    #[command(alias = "create")]
    Add {
        /// Display name
        name: String,
    },
    /// List contacts
    #[command(alias = "ls")]
    List {
        /// Only names containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
    },
    /// Show contact details (including fields)
    Show {
        /// Contact ID (full UUID or prefix)
        id: String,
        /// Field order by creation time (asc, desc)
        #[arg(long)]
        sort: Option<SortDirection>,
    },
    /// Rename a contact
    Rename {
        /// Contact ID (full UUID or prefix)
        id: String,
        /// New display name
        name: String,
    },
    /// Delete a contact
    #[command(alias = "rm")]
    Delete {
        /// Contact ID (full UUID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Toggle favorite
    #[command(alias = "fav")]
    Favorite {
        /// Contact ID (full UUID or prefix)
        id: String,
    },
    /// Set who this person is (opens editor if text not provided)
    Who {
        /// Contact ID (full UUID or prefix)
        id: String,
        /// Description text
        text: Option<String>,
    },
}

#[derive(Subcommand)]
enum FieldCommands {
    /// Add a field to a contact
    Add {
        /// Contact ID (full UUID or prefix)
        contact: String,
        /// Field label (e.g. Email)
        label: String,
        /// Field value
        value: String,
    },
    /// List fields on a contact
    #[command(alias = "ls")]
    List {
        /// Contact ID (full UUID or prefix)
        contact: String,
        /// Only fields whose label or value contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Order by creation time (asc, desc)
        #[arg(long)]
        sort: Option<SortDirection>,
    },
    /// Change a field's label or value
    Set {
        /// Contact ID (full UUID or prefix)
        contact: String,
        /// Field ID (full UUID or prefix)
        field: String,
        /// New label
        #[arg(short, long)]
        label: Option<String>,
        /// New value
        #[arg(short, long)]
        value: Option<String>,
    },
    /// Delete a field
    #[command(alias = "rm")]
    Delete {
        /// Contact ID (full UUID or prefix)
        contact: String,
        /// Field ID (full UUID or prefix)
        field: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, export_dir, field_sort, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the store
    if let Some(Commands::Config { command }) = &cli.command {
        logging::init_cli_logging();
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // Handle TUI (default when no command given)
    let Some(command) = cli.command else {
        return tui::run(&config);
    };
    if matches!(command, Commands::Tui) {
        return tui::run(&config);
    }

    logging::init_cli_logging();

    let mut store = ContactStore::open_with_config(&config)?;
    if let Some(warning) = store.take_load_warning() {
        output.warn(&warning);
    }

    match command {
        Commands::Tui | Commands::Config { .. } => Ok(()), // Handled above
        Commands::Contact { command } => {
            handle_contact_command(command, &mut store, &config, &output)
        }
        Commands::Field { command } => handle_field_command(command, &mut store, &config, &output),
        Commands::Export {
            contact,
            format,
            out,
            open,
        } => commands::export::export(&store, &config, contact, format, out, open, &output),
    }
}

fn handle_contact_command(
    command: ContactCommands,
    store: &mut ContactStore,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        ContactCommands::Add { name } => commands::contact::add(store, name, output),
        ContactCommands::List { search, favorites } => {
            commands::contact::list(store, search, favorites, output)
        }
        ContactCommands::Show { id, sort } => {
            commands::contact::show(store, id, sort.unwrap_or(config.field_sort), output)
        }
        ContactCommands::Rename { id, name } => commands::contact::rename(store, id, name, output),
        ContactCommands::Delete { id, yes } => commands::contact::delete(store, id, yes, output),
        ContactCommands::Favorite { id } => commands::contact::favorite(store, id, output),
        ContactCommands::Who { id, text } => commands::contact::who(store, id, text, output),
    }
}

fn handle_field_command(
    command: FieldCommands,
    store: &mut ContactStore,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        FieldCommands::Add {
            contact,
            label,
            value,
        } => commands::field::add(store, contact, label, value, output),
        FieldCommands::List {
            contact,
            search,
            sort,
        } => commands::field::list(
            store,
            contact,
            search,
            sort.unwrap_or(config.field_sort),
            output,
        ),
        FieldCommands::Set {
            contact,
            field,
            label,
            value,
        } => commands::field::set(store, contact, field, label, value, output),
        FieldCommands::Delete { contact, field } => {
            commands::field::delete(store, contact, field, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}
