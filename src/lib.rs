//! ACT Companion is a terminal chat companion that streams replies from a
//! hosted language model, steered by a small set of user-selectable behavior
//! tags.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: configuration, operating-mode resolution,
//!   prompt composition, the model session, incremental stream assembly, the
//!   conversation store, and the optional document transcript logger.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the wire payloads exchanged with the model, document and
//!   identity APIs.
//! - [`auth`] stores and removes the model API credential in the system keyring.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
