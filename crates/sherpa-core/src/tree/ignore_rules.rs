//! Cascading `.gitignore` resolution
//!
//! Rules are gathered from every directory between the scope root (nearest
//! ancestor holding a `.git` directory, else the filesystem root) and the
//! directory being listed. Each file's patterns are rewritten so they are
//! rooted at the directory that declared them, then merged into one matcher
//! in root-first order so later lines win.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Entries never listed, whatever the ignore files say
pub const ALWAYS_EXCLUDED: &[&str] = &[".git", ".hg", ".svn"];

/// Nearest ancestor of `dir` (inclusive) that contains a `.git` directory
pub fn find_git_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|candidate| candidate.join(".git").is_dir())
        .map(Path::to_path_buf)
}

/// The root every rule for `dir` is resolved against
pub fn scope_root(dir: &Path) -> PathBuf {
    find_git_root(dir).unwrap_or_else(|| {
        dir.ancestors()
            .last()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.to_path_buf())
    })
}

/// Root an ignore pattern at `rel_dir` (relative to the scope root)
///
/// Negation is preserved. A pattern with no slash other than a trailing one
/// matches at any depth, so it becomes `rel_dir/**/pattern`; anything else is
/// anchored and becomes `rel_dir/pattern`.
pub fn rewrite_pattern(rel_dir: &str, line: &str) -> String {
    if rel_dir.is_empty() {
        return line.to_string();
    }

    let (negation, pattern) = match line.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", line),
    };

    let floating = !pattern.trim_end_matches('/').contains('/');
    if floating {
        format!("{}{}/**/{}", negation, rel_dir, pattern)
    } else {
        format!("{}{}/{}", negation, rel_dir, pattern.trim_start_matches('/'))
    }
}

/// Parse `.gitignore` contents: trimmed, blank and `#` lines dropped
pub fn parse_ignore_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Matcher for the entries of one directory
pub struct DirectoryRules {
    scope_root: PathBuf,
    matcher: Gitignore,
}

impl DirectoryRules {
    /// Whether `entry` (a direct child of the listed directory) should be shown
    pub fn keeps(&self, entry: &Path, is_dir: bool) -> bool {
        if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
            if ALWAYS_EXCLUDED.contains(&name) {
                return false;
            }
        }
        match entry.strip_prefix(&self.scope_root) {
            Ok(rel) => !self
                .matcher
                .matched_path_or_any_parents(rel, is_dir)
                .is_ignore(),
            Err(_) => true,
        }
    }
}

/// Resolves `DirectoryRules`, caching each `.gitignore` it reads
///
/// One resolver is meant to live for a single walk.
#[derive(Default)]
pub struct IgnoreResolver {
    files: HashMap<PathBuf, Vec<String>>,
}

impl IgnoreResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the effective rules for listing `dir`
    pub fn rules_for(&mut self, dir: &Path) -> DirectoryRules {
        let root = scope_root(dir);
        let chain = chain_from(&root, dir);

        let mut builder = GitignoreBuilder::new(&root);
        let mut accumulated = build_or_empty(&GitignoreBuilder::new(&root));

        for chain_dir in chain {
            let rel_dir = relative_str(&root, &chain_dir);

            if !rel_dir.is_empty()
                && accumulated
                    .matched_path_or_any_parents(Path::new(&rel_dir), true)
                    .is_ignore()
            {
                continue;
            }

            let lines = self.ignore_file(&chain_dir);
            if lines.is_empty() {
                continue;
            }
            for line in &lines {
                // Unparseable globs are skipped, the same as git does
                let _ = builder.add_line(None, &rewrite_pattern(&rel_dir, line));
            }
            accumulated = build_or_empty(&builder);
        }

        DirectoryRules {
            scope_root: root,
            matcher: accumulated,
        }
    }

    fn ignore_file(&mut self, dir: &Path) -> Vec<String> {
        self.files
            .entry(dir.to_path_buf())
            .or_insert_with(|| {
                fs::read_to_string(dir.join(".gitignore"))
                    .map(|content| parse_ignore_file(&content))
                    .unwrap_or_default()
            })
            .clone()
    }
}

/// Directories from `root` down to `dir`, root first
fn chain_from(root: &Path, dir: &Path) -> Vec<PathBuf> {
    let mut chain: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|ancestor| ancestor.starts_with(root))
        .map(Path::to_path_buf)
        .collect();
    chain.reverse();
    chain
}

fn relative_str(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

fn build_or_empty(builder: &GitignoreBuilder) -> Gitignore {
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rewrite_at_scope_root_is_identity() {
        assert_eq!(rewrite_pattern("", "*.log"), "*.log");
        assert_eq!(rewrite_pattern("", "!keep.log"), "!keep.log");
    }

    #[test]
    fn test_rewrite_floating_pattern() {
        assert_eq!(rewrite_pattern("sub", "*.tmp"), "sub/**/*.tmp");
        assert_eq!(rewrite_pattern("a/b", "node_modules/"), "a/b/**/node_modules/");
        assert_eq!(rewrite_pattern("sub", "!keep.tmp"), "!sub/**/keep.tmp");
    }

    #[test]
    fn test_rewrite_anchored_pattern() {
        assert_eq!(rewrite_pattern("sub", "/build"), "sub/build");
        assert_eq!(rewrite_pattern("sub", "docs/*.md"), "sub/docs/*.md");
        assert_eq!(rewrite_pattern("sub", "!/dist"), "!sub/dist");
    }

    #[test]
    fn test_parse_ignore_file() {
        let lines = parse_ignore_file("# comment\n\n  *.log  \n!important.log\n");
        assert_eq!(lines, vec!["*.log", "!important.log"]);
    }

    #[test]
    fn test_find_git_root() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();

        assert_eq!(find_git_root(&dir.path().join("a/b")).as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_git_file_is_not_a_root() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let inner = dir.path().join("inner");
        fs::create_dir(&inner).unwrap();
        fs::write(inner.join(".git"), "gitdir: elsewhere").unwrap();

        assert_eq!(find_git_root(&inner).as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_nested_rules_stay_inside_their_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("sub/deep")).unwrap();
        fs::write(root.join("sub/.gitignore"), "*.tmp\n").unwrap();

        let mut resolver = IgnoreResolver::new();

        let top = resolver.rules_for(root);
        assert!(top.keeps(&root.join("a.tmp"), false));

        let sub = resolver.rules_for(&root.join("sub"));
        assert!(!sub.keeps(&root.join("sub/a.tmp"), false));

        let deep = resolver.rules_for(&root.join("sub/deep"));
        assert!(!deep.keeps(&root.join("sub/deep/b.tmp"), false));
        assert!(deep.keeps(&root.join("sub/deep/b.rs"), false));
    }

    #[test]
    fn test_later_negation_wins() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".gitignore"), "*.log\n!important.log\n").unwrap();

        let rules = IgnoreResolver::new().rules_for(root);
        assert!(!rules.keeps(&root.join("debug.log"), false));
        assert!(rules.keeps(&root.join("important.log"), false));
    }

    #[test]
    fn test_child_negation_overrides_parent() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir(root.join("logs")).unwrap();
        fs::write(root.join(".gitignore"), "*.log\n").unwrap();
        fs::write(root.join("logs/.gitignore"), "!keep.log\n").unwrap();

        let rules = IgnoreResolver::new().rules_for(&root.join("logs"));
        assert!(rules.keeps(&root.join("logs/keep.log"), false));
        assert!(!rules.keeps(&root.join("logs/other.log"), false));
    }

    #[test]
    fn test_directory_only_pattern() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();

        let rules = IgnoreResolver::new().rules_for(root);
        assert!(!rules.keeps(&root.join("build"), true));
        assert!(rules.keeps(&root.join("build"), false));
    }

    #[test]
    fn test_ignored_directory_hides_its_descendants() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("build/sub")).unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();
        fs::write(root.join("build/sub/.gitignore"), "!b.txt\n").unwrap();

        let build = IgnoreResolver::new().rules_for(&root.join("build"));
        assert!(!build.keeps(&root.join("build/a.txt"), false));
        assert!(!build.keeps(&root.join("build/sub"), true));

        let sub = IgnoreResolver::new().rules_for(&root.join("build/sub"));
        assert!(!sub.keeps(&root.join("build/sub/b.txt"), false));
    }

    #[test]
    fn test_always_excluded() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();

        let rules = IgnoreResolver::new().rules_for(root);
        for name in ALWAYS_EXCLUDED {
            assert!(!rules.keeps(&root.join(name), true));
        }
    }

    #[test]
    fn test_chain_from() {
        let chain = chain_from(Path::new("/r"), Path::new("/r/a/b"));
        assert_eq!(
            chain,
            vec![PathBuf::from("/r"), PathBuf::from("/r/a"), PathBuf::from("/r/a/b")]
        );
    }
}
