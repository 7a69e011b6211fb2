//! Cursor-following pagination over a channel's messages.
//!
//! A [`MessagePage`] is an immutable snapshot of one page plus the links the
//! server handed out with it. Moving to another page fetches a new snapshot
//! through the same transport reference; the page that was left is untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::Transport;
use crate::error::{Error, Result};
use crate::message::{decode, Message};

/// Pagination metadata attached to each page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub first_page_url: Option<String>,
    #[serde(default)]
    pub previous_page_url: Option<String>,
    #[serde(default)]
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

impl PageMeta {
    pub fn next_link(&self) -> Option<&str> {
        link(&self.next_page_url)
    }

    pub fn previous_link(&self) -> Option<&str> {
        link(&self.previous_page_url)
    }

    pub fn first_link(&self) -> Option<&str> {
        link(&self.first_page_url)
    }
}

/// An empty string is as good as no link.
fn link(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.is_empty())
}

#[derive(Deserialize)]
struct PageBody {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    meta: PageMeta,
}

/// One page of a message listing.
pub struct MessagePage<'c, T: ?Sized> {
    client: &'c T,
    messages: Vec<Message>,
    meta: PageMeta,
}

impl<'c, T: Transport + ?Sized> MessagePage<'c, T> {
    pub(crate) fn decode(client: &'c T, body: &[u8]) -> Result<Self> {
        let PageBody { messages, meta } = decode("message page", body)?;
        Ok(Self {
            client,
            messages,
            meta,
        })
    }

    fn fetch(client: &'c T, url: &str) -> Result<Self> {
        let body = client.get(&[], url)?;
        Self::decode(client, &body)
    }

    /// Messages on this page, in server order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn meta(&self) -> &PageMeta {
        &self.meta
    }

    /// The transport this page (and every page derived from it) fetches with.
    pub fn client(&self) -> &'c T {
        self.client
    }

    pub fn has_next(&self) -> bool {
        self.meta.next_link().is_some()
    }

    /// Fetch the page after this one.
    pub fn next(&self) -> Result<Self> {
        let url = self.meta.next_link().ok_or(Error::NoNextPage)?;
        Self::fetch(self.client, url)
    }

    pub fn has_previous(&self) -> bool {
        self.meta.previous_link().is_some()
    }

    /// Fetch the page before this one.
    pub fn previous(&self) -> Result<Self> {
        let url = self.meta.previous_link().ok_or(Error::NoPreviousPage)?;
        Self::fetch(self.client, url)
    }

    /// Fetch the first page of the listing.
    pub fn first(&self) -> Result<Self> {
        let url = self.meta.first_link().ok_or(Error::NoFirstPage)?;
        Self::fetch(self.client, url)
    }

    /// Collect this page and every following page into one sequence.
    ///
    /// Fails with the first error encountered; nothing fetched so far is
    /// returned in that case. There is no page limit: a server that never
    /// stops handing out next links keeps this running. Use [`pages`](Self::pages)
    /// with [`Iterator::take`] to bound the walk.
    pub fn into_all(self) -> Result<Vec<Message>> {
        let mut page = self;
        let mut all = std::mem::take(&mut page.messages);
        while page.has_next() {
            page = page.next()?;
            all.append(&mut page.messages);
        }
        Ok(all)
    }

    /// Iterate over this page and the pages after it, fetching lazily.
    ///
    /// The iterator ends after yielding an error or a page without a next link.
    pub fn pages(self) -> Pages<'c, T> {
        Pages {
            upcoming: Some(self),
            after: None,
        }
    }
}

impl<T: ?Sized> Clone for MessagePage<'_, T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
            messages: self.messages.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for MessagePage<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagePage")
            .field("messages", &self.messages)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`MessagePage::pages`].
pub struct Pages<'c, T: ?Sized> {
    upcoming: Option<MessagePage<'c, T>>,
    after: Option<(&'c T, PageMeta)>,
}

impl<'c, T: Transport + ?Sized> Iterator for Pages<'c, T> {
    type Item = Result<MessagePage<'c, T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = match self.upcoming.take() {
            Some(page) => page,
            None => {
                let (client, meta) = self.after.take()?;
                match MessagePage::fetch(client, meta.next_link()?) {
                    Ok(page) => page,
                    Err(e) => return Some(Err(e)),
                }
            }
        };
        self.after = Some((page.client, page.meta.clone()));
        Some(Ok(page))
    }
}
