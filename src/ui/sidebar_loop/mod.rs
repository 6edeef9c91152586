//! Full-screen terminal host for the sidebar.
//!
//! Sets up the terminal, feeds key and mouse events into the sidebar
//! controllers, spawns their async work and redraws when anything changed.

mod event_loop;
mod input;
mod lifecycle;
mod prompt;
mod state;

pub use event_loop::{run_sidebar, SidebarOptions, UiEvent};
pub use prompt::{Prompt, PromptKind, PromptOutcome};
pub use state::{HostCommand, HostState, PointerState, PressedRow};
