#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown
)]

pub mod cli;
pub mod client;

pub use ilw_core::{
    app, events, fetch, input, links, model, params, poller, prefs, store, traits, tui, widgets,
};
