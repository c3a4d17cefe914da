//! Filesystem tool provider
//!
//! A read-only MCP server confined to one directory. Every requested path
//! goes through `validate_path` before it is touched.

mod paths;
mod server;

pub use paths::{canonical_root, expand_home, validate_path, FsError, FsResult};
pub use server::{frame_file, FilesystemServer, ReadFilesRequest, TreeRequest, ALLOWED_DIRECTORY_HEADER};
