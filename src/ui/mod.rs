//! Terminal UI layer.
//!
//! - [`hierarchy`] turns a hierarchy snapshot into rows of a [`tree_pane::TreePane`].
//! - [`layout`] and [`renderer`] place and draw panels, rows and the status line.
//! - [`sidebar_loop`] runs the interactive host: terminal lifecycle, input and
//!   the frame loop.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns the sidebar controllers and the store contract.

pub mod hierarchy;
pub mod layout;
pub mod renderer;
pub mod sidebar_loop;
pub mod tree_pane;
