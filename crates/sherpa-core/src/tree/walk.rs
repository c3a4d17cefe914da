//! Directory walking: flat text rendering and structured trees

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ignore_rules::IgnoreResolver;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const INDENT: &str = "│   ";
const LAST_INDENT: &str = "    ";

/// Tree walk options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Levels of children to list below the starting directory; `None` is unbounded
    pub max_depth: Option<usize>,
}

impl TreeOptions {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }

    fn lists_children_at(&self, level: usize) -> bool {
        self.max_depth.map_or(true, |max| level < max)
    }
}

/// A node of a structured directory tree
///
/// `path` is relative to the base directory the tree was built against, with
/// `"."` for the base itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File {
        name: String,
        path: String,
    },
    Directory {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::File { name, .. } | TreeNode::Directory { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeNode::File { path, .. } | TreeNode::Directory { path, .. } => path,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::File { .. } => &[],
            TreeNode::Directory { children, .. } => children,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Directory { .. })
    }

    /// Names in pre-order, excluding this node
    pub fn descendant_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for child in self.children() {
            names.push(child.name());
            names.extend(child.descendant_names());
        }
        names
    }
}

/// A listed directory entry
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Visible entries of `dir`, sorted by name
///
/// Symlinks and other non-regular entries are dropped.
fn visible_entries(resolver: &mut IgnoreResolver, dir: &Path) -> io::Result<Vec<Entry>> {
    let rules = resolver.rules_for(dir);

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if !file_type.is_dir() && !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if !rules.keeps(&path, file_type.is_dir()) {
            continue;
        }

        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            is_dir: file_type.is_dir(),
        });
    }

    entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    Ok(entries)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Resolve symlinks in the starting path so ignore scopes line up
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Render `path` as indented text, one entry per line
///
/// The first line is the basename of `path`. A directory that cannot be read
/// shows up as an `[Error reading directory: ...]` line instead of its
/// children.
pub fn render_flat(path: &Path, options: TreeOptions) -> String {
    let path = resolve(path);
    let mut lines = vec![base_name(&path)];
    let mut resolver = IgnoreResolver::new();
    render_dir(&mut resolver, &path, "", 0, options, &mut lines);
    lines.join("\n")
}

fn render_dir(
    resolver: &mut IgnoreResolver,
    dir: &Path,
    prefix: &str,
    level: usize,
    options: TreeOptions,
    lines: &mut Vec<String>,
) {
    if !options.lists_children_at(level) {
        return;
    }

    let entries = match visible_entries(resolver, dir) {
        Ok(entries) => entries,
        Err(e) => {
            lines.push(format!("{}[Error reading directory: {}]", prefix, e));
            return;
        }
    };

    let count = entries.len();
    for (i, entry) in entries.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let branch = if is_last { LAST_BRANCH } else { BRANCH };
        lines.push(format!("{}{}{}", prefix, branch, entry.name));

        if entry.is_dir {
            let indent = if is_last { LAST_INDENT } else { INDENT };
            let child_prefix = format!("{}{}", prefix, indent);
            render_dir(resolver, &entry.path, &child_prefix, level + 1, options, lines);
        }
    }
}

/// Build a structured tree for `path`, with node paths relative to `base_dir`
///
/// Honors `max_depth` the same way `render_flat` does: directories below the
/// limit appear with no children.
pub fn build_tree(path: &Path, base_dir: &Path, options: TreeOptions) -> io::Result<TreeNode> {
    let path = resolve(path);
    let base_dir = resolve(base_dir);
    let mut resolver = IgnoreResolver::new();
    build_node(&mut resolver, &path, &base_dir, 0, options)
}

fn relative_path(base_dir: &Path, path: &Path) -> String {
    match path.strip_prefix(base_dir) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

fn build_node(
    resolver: &mut IgnoreResolver,
    path: &Path,
    base_dir: &Path,
    level: usize,
    options: TreeOptions,
) -> io::Result<TreeNode> {
    let name = base_name(path);
    let rel = relative_path(base_dir, path);

    if !fs::metadata(path)?.is_dir() {
        return Ok(TreeNode::File { name, path: rel });
    }

    let mut children = Vec::new();
    if options.lists_children_at(level) {
        for entry in visible_entries(resolver, path)? {
            if entry.is_dir {
                children.push(build_node(resolver, &entry.path, base_dir, level + 1, options)?);
            } else {
                children.push(TreeNode::File {
                    name: entry.name,
                    path: relative_path(base_dir, &entry.path),
                });
            }
        }
    }

    Ok(TreeNode::Directory {
        name,
        path: rel,
        children,
    })
}
