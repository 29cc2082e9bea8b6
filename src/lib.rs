//! Reply threading: turn flat, parent-linked post lists into ordered reply
//! forests and back.
//!
//! ```
//! use replytree::{build_forest, flatten, Post};
//!
//! let posts = vec![
//!     Post::new(1, None, "Exam dates"),
//!     Post::new(3, Some(1), "Re: Exam dates"),
//!     Post::new(2, Some(1), "Re: Exam dates"),
//! ];
//! let forest = build_forest(posts).unwrap();
//! let ids: Vec<u64> = flatten(forest).into_iter().map(|p| p.id).collect();
//! assert_eq!(ids, vec![1, 3, 2]);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    build_forest, flatten, DomainError, DomainResult, Forest, Identifiable, Node, Post,
};
