//! Thread service
//!
//! Loads flat post files, threads them into reply forests and reports on them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::{InputFormat, Settings};
use crate::domain::{build_forest, expand_env_vars, Forest, Post, ThreadDocument};
use crate::infrastructure::traits::FileSystem;

/// Shape summary of one thread file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadStats {
    /// Number of posts
    pub posts: usize,
    /// Number of root posts
    pub threads: usize,
    /// Roots whose parent id was set but not found in the file
    pub promoted: usize,
    /// Longest reply chain
    pub depth: usize,
    /// Posts without replies
    pub leaves: usize,
}

impl ThreadStats {
    pub fn of(forest: &Forest<Post>) -> Self {
        Self {
            posts: forest.len(),
            threads: forest.roots().len(),
            promoted: forest
                .roots()
                .iter()
                .filter(|root| root.item.parent.is_some())
                .count(),
            depth: forest.depth(),
            leaves: forest.leaves().len(),
        }
    }
}

impl fmt::Display for ThreadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "posts: {}, threads: {}, promoted: {}, depth: {}, leaves: {}",
            self.posts, self.threads, self.promoted, self.depth, self.leaves
        )
    }
}

/// Service for threading post files.
pub struct ThreadService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl ThreadService {
    /// Create a new thread service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in a user-supplied path.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        PathBuf::from(expand_env_vars(&path.to_string_lossy()))
    }

    fn detect_format(&self, path: &Path) -> ApplicationResult<InputFormat> {
        match path.extension() {
            None => Ok(self.settings.default_format),
            Some(ext) => ext
                .to_str()
                .and_then(InputFormat::from_extension)
                .ok_or_else(|| ApplicationError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Read posts from a JSON or TOML thread file.
    ///
    /// Parent ids equal to `root_parent_id` are cleared, so those posts
    /// start threads.
    #[instrument(level = "debug", skip(self))]
    pub fn load_posts(&self, path: &Path) -> ApplicationResult<Vec<Post>> {
        let path = self.resolve_path(path);
        let format = self.detect_format(&path)?;

        if !self.fs.exists(&path) {
            return Err(ApplicationError::FileNotFound(path));
        }
        if !self.fs.is_file(&path) {
            return Err(ApplicationError::Parse {
                path,
                message: "not a file".to_string(),
            });
        }

        let content = self
            .fs
            .read_to_string(&path)
            .with_path_context("read thread file", &path)?;

        let document = match format {
            InputFormat::Json => {
                serde_json::from_str::<ThreadDocument>(&content).map_err(|e| e.to_string())
            }
            InputFormat::Toml => {
                toml::from_str::<ThreadDocument>(&content).map_err(|e| e.to_string())
            }
        }
        .map_err(|message| ApplicationError::Parse {
            path: path.clone(),
            message,
        })?;

        let mut posts = document.into_posts();
        for post in &mut posts {
            post.normalize_parent(self.settings.root_parent_id);
        }
        debug!("load_posts: {} posts from {}", posts.len(), path.display());
        Ok(posts)
    }

    /// Load a thread file and thread its posts.
    pub fn build(&self, path: &Path) -> ApplicationResult<Forest<Post>> {
        let posts = self.load_posts(path)?;
        Ok(build_forest(posts)?)
    }

    /// One rendered tree per discussion.
    pub fn render(&self, forest: &Forest<Post>) -> Vec<String> {
        forest.render()
    }

    /// Pre-order listing, indented by depth.
    pub fn flat_lines(&self, forest: &Forest<Post>) -> Vec<String> {
        forest
            .iter_with_depth()
            .map(|(depth, post)| format!("{}{}", " ".repeat(depth * self.settings.indent), post))
            .collect()
    }

    pub fn leaves(&self, forest: &Forest<Post>) -> Vec<String> {
        forest.leaves().iter().map(|post| post.to_string()).collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn stats(&self, path: &Path) -> ApplicationResult<ThreadStats> {
        let forest = self.build(path)?;
        Ok(ThreadStats::of(&forest))
    }

    /// Statistics for several files, built in parallel. Results keep input order.
    pub fn stats_many(&self, paths: &[PathBuf]) -> Vec<(PathBuf, ApplicationResult<ThreadStats>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.stats(path)))
            .collect()
    }
}
