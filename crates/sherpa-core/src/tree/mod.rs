//! Directory trees with cascading `.gitignore` rules
//!
//! Used by the `tree` tool and to seed a new conversation with a picture of
//! the repository.

mod ignore_rules;
mod walk;

pub use ignore_rules::{find_git_root, rewrite_pattern, scope_root, ALWAYS_EXCLUDED};
pub use walk::{build_tree, render_flat, TreeNode, TreeOptions};
