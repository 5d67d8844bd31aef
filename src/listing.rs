//! Listing Engine
//!
//! Enumerates the direct children of one bucket, sub-buckets and keys
//! together, in ascending name-byte order, optionally one page at a time.
//!
//! A [`PageToken`] holds only the last name returned. Resuming with it in a
//! later transaction continues strictly after that name, so pages are each
//! consistent but may reflect commits made between calls.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bucket::{self, BucketHandle};
use crate::error::{ArborError, Result};
use crate::tree::{Child, Tree};

/// Whether a listed name is a sub-bucket or a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Bucket,
    Key,
}

/// One child of a listed bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub name: Vec<u8>,
    pub kind: EntryKind,
}

/// Opaque resume position for a paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken(Vec<u8>);

impl PageToken {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse the textual (hex) form produced by `Display`
    pub fn from_hex(text: &str) -> Result<Self> {
        hex::decode(text)
            .map(Self)
            .map_err(|e| ArborError::InvalidKey(format!("malformed page token: {}", e)))
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Which page to list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Resume after this position; `None` starts at the smallest name
    pub page_token: Option<PageToken>,
    /// Maximum items to return; `None` (or 0) returns everything
    pub page_size: Option<usize>,
}

impl PageRequest {
    /// Everything, in one page
    pub fn all() -> Self {
        Self::default()
    }

    pub fn first(page_size: usize) -> Self {
        Self {
            page_token: None,
            page_size: Some(page_size),
        }
    }

    /// The page following one that returned `token`
    pub fn after(token: PageToken, page_size: usize) -> Self {
        Self {
            page_token: Some(token),
            page_size: Some(page_size),
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<ListItem>,
    /// Present only when more children follow this page
    pub next_page_token: Option<PageToken>,
}

/// List the children of `handle`'s bucket
pub fn list(tree: &Tree, handle: &BucketHandle, request: &PageRequest) -> Result<Page> {
    let node = bucket::node(tree, handle)?;
    let limit = request.page_size.filter(|&n| n > 0).unwrap_or(usize::MAX);

    let children: Box<dyn Iterator<Item = (&Vec<u8>, &Child)> + '_> = match &request.page_token {
        Some(token) => Box::new(node.after(token.as_bytes())),
        None => Box::new(node.iter()),
    };
    let mut children = children.peekable();

    let mut items = Vec::new();
    while items.len() < limit {
        let Some((name, child)) = children.next() else {
            break;
        };
        items.push(ListItem {
            name: name.clone(),
            kind: match child {
                Child::Bucket(_) => EntryKind::Bucket,
                Child::Value(_) => EntryKind::Key,
            },
        });
    }

    let next_page_token = match children.peek() {
        Some(_) => items.last().map(|item| PageToken(item.name.clone())),
        None => None,
    };

    Ok(Page {
        items,
        next_page_token,
    })
}
