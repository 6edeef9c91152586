//! Command-line interface parsing and handling
//!
//! This module parses arguments, resolves them against the config file and
//! runs either the interactive sidebar or one of the one-shot subcommands.

pub mod tree;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::core::config::data::{path_display, Config};
use crate::core::config::io::{
    default_config_path, default_data_dir, load_expansion, save_expansion,
};
use crate::core::config::orchestrator::ConfigOrchestrator;
use crate::core::expansion::ExpansionStore;
use crate::core::fs_store::FsChatStore;
use crate::core::sidebar::accordion::PanelKey;
use crate::ui::sidebar_loop::{run_sidebar, SidebarOptions};
use crate::utils::logging::init_file_logging;

const EXPANSION_FILE: &str = "expansion.toml";

fn parse_panel(value: &str) -> Result<PanelKey, String> {
    PanelKey::parse(value).ok_or_else(|| format!("unknown panel '{value}' (chats, models, roles)"))
}

#[derive(Parser)]
#[command(name = "chabeau-sidebar", version)]
#[command(about = "A terminal sidebar for browsing and organizing saved chats")]
#[command(
    long_about = "Chabeau Sidebar shows saved chats as a foldable folder tree next to \
Models and Roles panels. Only one panel is open at a time.\n\n\
Controls:\n\
  1/2/3             Open or close the Chats, Models and Roles panels\n\
  Up/Down           Move the selection\n\
  Enter/Space       Fold or unfold a folder, open a chat\n\
  Mouse drag        Move a chat or folder onto another folder or the top level\n\
  g                 Refresh the open panel\n\
  n / r / d         New folder, rename folder, delete folder\n\
  Esc               Cancel a drag or prompt\n\
  q                 Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Store directory holding the chat and role folders
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Panel to open on start (chats, models, roles)
    #[arg(long, global = true, value_parser = parse_panel)]
    pub panel: Option<PanelKey>,

    /// Write diagnostics to this file (filter with RUST_LOG)
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive sidebar (default)
    Run,
    /// Print the chat tree and exit
    Tree,
    /// Print where the config file lives
    ConfigPath,
    /// Set a configuration value, or show all values when none is given
    Set {
        /// Configuration key (root, chat-folder, role-folder, models,
        /// default-panel, persist-expansion)
        key: Option<String>,
        /// Value; models takes a comma-separated list
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Reset a configuration value to its default
    Unset {
        key: String,
    },
}

/// Everything the sidebar needs, after CLI flags were applied over the
/// config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub chat_root: PathBuf,
    pub role_root: PathBuf,
    pub models: Vec<String>,
    pub initial_panel: PanelKey,
    pub expansion_path: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(config: &Config, args: &Args, data_dir: &Path) -> Self {
        let root = args
            .root
            .clone()
            .unwrap_or_else(|| config.root_or(data_dir));
        Self {
            chat_root: root.join(config.chat_folder()),
            role_root: root.join(config.role_folder()),
            models: config.models.clone(),
            initial_panel: args.panel.unwrap_or_else(|| config.default_panel()),
            expansion_path: config
                .persist_expansion()
                .then(|| data_dir.join(EXPANSION_FILE)),
        }
    }

    fn store(&self) -> FsChatStore {
        FsChatStore::new(
            self.chat_root.clone(),
            self.role_root.clone(),
            self.models.clone(),
        )
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Some(path) = &args.log {
        init_file_logging(path)?;
    }
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let orchestrator = ConfigOrchestrator::new(config_path);

    match args.command {
        Some(Commands::ConfigPath) => {
            println!("{}", path_display(orchestrator.path()));
            Ok(())
        }
        Some(Commands::Set { ref key, ref value }) => {
            let Some(key) = key else {
                orchestrator.load_with_cache()?.print_all();
                return Ok(());
            };
            let value = value.join(" ");
            orchestrator.mutate(|config| {
                config.set_value(key, &value)?;
                Ok(())
            })?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Some(Commands::Unset { ref key }) => {
            orchestrator.mutate(|config| {
                config.set_value(key, "")?;
                Ok(())
            })?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Some(Commands::Tree) => {
            let config = orchestrator.load_with_cache()?;
            let settings = Settings::resolve(&config, &args, &default_data_dir()?);
            for line in tree::tree_lines(&settings.store().read_hierarchy()?)? {
                println!("{line}");
            }
            Ok(())
        }
        Some(Commands::Run) | None => {
            let config = orchestrator.load_with_cache()?;
            let settings = Settings::resolve(&config, &args, &default_data_dir()?);
            run(settings).await
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn Error>> {
    let store = settings.store();
    store.ensure_root()?;

    let expansion = match &settings.expansion_path {
        Some(path) => load_expansion(path).unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring unreadable expansion state");
            ExpansionStore::new()
        }),
        None => ExpansionStore::new(),
    };

    let expansion = run_sidebar(SidebarOptions {
        store: Arc::new(store),
        expansion,
        initial_panel: settings.initial_panel,
    })
    .await?;

    if let Some(path) = &settings.expansion_path {
        save_expansion(&expansion, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "chabeau-sidebar",
            "--root",
            "/tmp/notes",
            "--panel",
            "roles",
            "tree",
        ]);
        let config = Config {
            root: Some(PathBuf::from("/srv/elsewhere")),
            chat_folder: Some("talks".into()),
            default_panel: Some(PanelKey::Models),
            ..Config::default()
        };

        let settings = Settings::resolve(&config, &args, Path::new("/data"));

        assert!(matches!(args.command, Some(Commands::Tree)));
        assert_eq!(settings.chat_root, PathBuf::from("/tmp/notes/talks"));
        assert_eq!(settings.role_root, PathBuf::from("/tmp/notes/roles"));
        assert_eq!(settings.initial_panel, PanelKey::Roles);
        assert_eq!(
            settings.expansion_path,
            Some(PathBuf::from("/data/expansion.toml"))
        );
    }

    #[test]
    fn defaults_fall_back_to_data_dir() {
        let args = Args::parse_from(["chabeau-sidebar"]);
        let config = Config {
            persist_expansion: Some(false),
            ..Config::default()
        };

        let settings = Settings::resolve(&config, &args, Path::new("/data"));

        assert!(args.command.is_none());
        assert_eq!(settings.chat_root, PathBuf::from("/data/chats"));
        assert_eq!(settings.initial_panel, PanelKey::Chats);
        assert_eq!(settings.expansion_path, None);
    }

    #[test]
    fn unknown_panel_flag_is_rejected() {
        assert!(Args::try_parse_from(["chabeau-sidebar", "--panel", "files"]).is_err());
    }

    #[test]
    fn set_collects_multiword_values() {
        let args = Args::parse_from(["chabeau-sidebar", "set", "models", "gpt-4o,", "claude"]);
        match args.command {
            Some(Commands::Set { key, value }) => {
                assert_eq!(key.as_deref(), Some("models"));
                assert_eq!(value.join(" "), "gpt-4o, claude");
            }
            _ => panic!("expected set"),
        }
    }
}
