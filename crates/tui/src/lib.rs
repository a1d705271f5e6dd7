//! # Keynav Terminal Demo
//!
//! A terminal host for the keynav engine. It loads an HTML-like document into
//! memory, attaches list navigators, hotkey registries and focus traps to it,
//! and renders the document as an outline so the keyboard behavior can be
//! tried interactively.
//!
//! ## Key Features
//!
//! - Arrow, Home, End, Enter, Space and Delete navigation inside lists
//! - Global hotkeys, and dialog hotkeys that take over while a dialog is open
//! - Focus trapped inside open dialogs, native Tab order everywhere else
//! - Focus and active-item markers with hotkey hints next to each element
//!
//! Dialogs open when an element with `data-knw-dialog-open="<selector>"` is
//! activated and close when an element with `data-knw-dialog-close` inside
//! them is.

mod app;
mod input;
mod ui;

use anyhow::{Context, Result};
use keynav_engine::MemoryDocument;
use keynav_util::KeynavConfig;

pub use app::{App, DIALOG_CLOSE, DIALOG_OPEN, HotkeyHint};
pub use input::to_keyboard_event;

/// Document shown when no other document is given.
pub const DEMO_DOCUMENT: &str = include_str!("../assets/demo_document.yaml");

pub fn demo_document() -> Result<MemoryDocument> {
    MemoryDocument::from_yaml_str(DEMO_DOCUMENT).context("built-in demo document is malformed")
}

/// Runs the demo host until the user quits.
///
/// # Errors
///
/// Fails when components cannot be attached to `document` (bad selectors in
/// `config`, for example) or when the terminal cannot be set up.
pub fn run(document: MemoryDocument, config: KeynavConfig) -> Result<()> {
    let app = App::new(document, config)?;
    ui::runtime::run_app(app)
}
