// src/message.rs
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::client::{message_path, messages_path, Transport};
use crate::error::{Error, Result};
use crate::page::MessagePage;

/// A message posted to a channel.
///
/// Records are snapshots of the server state; the only way to change one is
/// [`update_message`], which returns a fresh record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identifier.
    pub sid: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub account_sid: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_sid: String,
    /// Channel the message belongs to.
    #[serde(rename = "to", default, deserialize_with = "null_as_empty")]
    pub channel_sid: String,
    pub body: String,
    /// Caller-defined blob, usually JSON. Never interpreted here.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_created: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_updated: String,
    #[serde(default)]
    pub was_edited: bool,
    /// Sender identity. `None` for messages sent by the system.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

impl Message {
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.date_created)
    }

    pub fn updated_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.date_updated)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps arrive as ISO 8601 from current API versions and as RFC 2822
/// from older ones.
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
}

pub(crate) fn decode<T: DeserializeOwned>(what: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| Error::Decode { what, source })
}

// --- List options ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("unknown order '{other}' (expected asc or desc)")),
        }
    }
}

/// Query parameters for the first page of a listing. Later pages follow the
/// server's links, which already carry these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub order: Option<Order>,
    pub page_size: Option<u32>,
}

impl ListOptions {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(order) = self.order {
            query.push(("Order", order.as_str().to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("PageSize", size.to_string()));
        }
        query
    }
}

// --- Operations ---

/// Send a message to a channel. `from` is only sent when non-empty; the
/// server picks the sender otherwise.
pub fn create_message<T: Transport + ?Sized>(
    client: &T,
    service_sid: &str,
    channel_sid: &str,
    from: Option<&str>,
    body: &str,
    attributes: &str,
) -> Result<Message> {
    let mut form = vec![("Body", body)];
    if let Some(from) = from.filter(|f| !f.is_empty()) {
        form.push(("From", from));
    }
    form.push(("Attributes", attributes));

    let res = client.post(&form, &messages_path(service_sid, channel_sid))?;
    decode("message", &res)
}

/// Replace the body and attributes of an existing message. Both are always
/// sent; pass the current value to keep one unchanged.
pub fn update_message<T: Transport + ?Sized>(
    client: &T,
    service_sid: &str,
    channel_sid: &str,
    message_sid: &str,
    body: &str,
    attributes: &str,
) -> Result<Message> {
    let form = [("Body", body), ("Attributes", attributes)];
    let res = client.post(&form, &message_path(service_sid, channel_sid, message_sid))?;
    decode("message", &res)
}

/// Fetch a single message. A missing message surfaces as the transport's
/// error (HTTP 404 for [`HttpClient`](crate::client::HttpClient)).
pub fn get_message<T: Transport + ?Sized>(
    client: &T,
    service_sid: &str,
    channel_sid: &str,
    message_sid: &str,
) -> Result<Message> {
    let res = client.get(&[], &message_path(service_sid, channel_sid, message_sid))?;
    decode("message", &res)
}

/// Fetch the first page of a channel's messages.
pub fn list_messages<'c, T: Transport + ?Sized>(
    client: &'c T,
    service_sid: &str,
    channel_sid: &str,
) -> Result<MessagePage<'c, T>> {
    list_messages_with(client, service_sid, channel_sid, &ListOptions::default())
}

pub fn list_messages_with<'c, T: Transport + ?Sized>(
    client: &'c T,
    service_sid: &str,
    channel_sid: &str,
    options: &ListOptions,
) -> Result<MessagePage<'c, T>> {
    let owned = options.to_query();
    let query: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let res = client.get(&query, &messages_path(service_sid, channel_sid))?;
    MessagePage::decode(client, &res)
}
