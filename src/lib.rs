//! Chabeau Sidebar is a terminal chat-history sidebar: a foldable folder tree
//! of saved chats with drag-and-drop reorganization, inside an accordion of
//! mutually exclusive panels.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the sidebar controllers (expansion state, refresh
//!   generations, drag legality, the accordion), the store contract and a
//!   directory-backed store, plus configuration.
//! - [`ui`] turns hierarchy snapshots into rows, draws them and runs the
//!   interactive event loop.
//! - [`cli`] parses arguments and dispatches into the sidebar or the
//!   one-shot subcommands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
