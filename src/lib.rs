//! DraftGod - Twitter access layer and reply drafting
//!
//! The access layer ([`cache`], [`client`], [`retry`], [`webhook`]) keeps
//! provider traffic inside Twitter's rate limits. [`service`] builds the
//! draft workflows on top of it; [`cli`] drives everything from a terminal.

pub mod cache;
pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod drafts;
pub mod error;
pub mod generation;
pub mod output;
pub mod retry;
pub mod service;
pub mod webhook;
