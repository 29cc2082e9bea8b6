//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::identifiable::Identifiable;

/// A forum post as read from a thread file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    /// Replied-to post, None for discussion starters
    #[serde(default, alias = "parentid")]
    pub parent: Option<u64>,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Post {
    pub fn new(id: u64, parent: Option<u64>, subject: impl Into<String>) -> Self {
        Self {
            id,
            parent,
            subject: subject.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Clear `parent` when it holds the "no parent" sentinel.
    pub fn normalize_parent(&mut self, root_parent_id: u64) {
        if self.parent == Some(root_parent_id) {
            self.parent = None;
        }
    }
}

impl Identifiable for Post {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn parent_id(&self) -> Option<&u64> {
        self.parent.as_ref()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.subject)?;
        if let Some(author) = &self.author {
            write!(f, " ({})", author)?;
        }
        Ok(())
    }
}

/// On-disk layout of a thread file.
///
/// JSON may be a bare array of posts; TOML always needs the `posts` table array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ThreadDocument {
    Bare(Vec<Post>),
    Wrapped { posts: Vec<Post> },
}

impl ThreadDocument {
    pub fn into_posts(self) -> Vec<Post> {
        match self {
            ThreadDocument::Bare(posts) | ThreadDocument::Wrapped { posts } => posts,
        }
    }
}
