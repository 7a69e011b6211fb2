//! Blocking client for the message resource of a chat service's REST API:
//! send, update, fetch and list the messages of a channel.

pub mod client;
pub mod config;
pub mod error;
pub mod log;
pub mod message;
pub mod page;

pub use client::{HttpClient, Transport};
pub use error::{Error, Result, TransportError};
pub use message::{
    create_message, get_message, list_messages, list_messages_with, update_message, ListOptions,
    Message, Order,
};
pub use page::{MessagePage, PageMeta, Pages};

pub fn work_dir() -> anyhow::Result<std::path::PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

use anyhow::Context;
