//! MCP tool server over one allowed directory
//!
//! Exposes `read_files`, `tree` and `list_allowed_directories`. Hosted
//! in-process by `McpClient`, but it is a plain `ServerHandler` and can be
//! served over any rmcp transport.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;

use crate::logging::Logger;
use crate::tree::{render_flat, TreeOptions};

use super::paths::{canonical_root, validate_path, FsResult};

/// Header line of the `list_allowed_directories` result
pub const ALLOWED_DIRECTORY_HEADER: &str = "Allowed directory:\n";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadFilesRequest {
    #[schemars(description = "Paths of the files to read, absolute or relative to the allowed directory")]
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreeRequest {
    #[schemars(description = "Directory to visualize, absolute or relative to the allowed directory")]
    pub path: String,
    #[schemars(description = "Maximum depth of the tree; omit or null for no limit")]
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Number every line `L{n}: ` (1-based) and frame it with the requested path
pub fn frame_file(requested: &str, content: &str) -> String {
    let numbered = content
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("L{}: {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<{}>\n{}\n</{}>", requested, numbered, requested)
}

#[derive(Clone)]
pub struct FilesystemServer {
    root: Arc<PathBuf>,
    logger: Arc<dyn Logger>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FilesystemServer {
    /// Create a server for `allowed_directory`
    ///
    /// Fails if the directory does not exist or is not a directory.
    pub fn new(allowed_directory: &Path, logger: Arc<dyn Logger>) -> FsResult<Self> {
        let root = canonical_root(allowed_directory)?;
        logger.info(&format!("[FilesystemServer] Allowed directory: {}", root.display()));

        Ok(Self {
            root: Arc::new(root),
            logger,
            tool_router: Self::tool_router(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_one(&self, requested: String) -> String {
        let path = match validate_path(&requested, &self.root) {
            Ok(path) => path,
            Err(e) => return format!("{}: Error - {}", requested, e),
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => frame_file(&requested, &content),
            Err(e) => format!("{}: Error - {}", requested, e),
        }
    }

    #[tool(description = "Read the contents of one or more files. Each file's content is returned \
        with its path as a reference and every line numbered. A failed read for one file does not \
        stop the others. Only works within the allowed directory.")]
    async fn read_files(
        &self,
        Parameters(request): Parameters<ReadFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.logger.debug(&format!("[FilesystemServer] read_files: {} paths", request.paths.len()));

        let results = join_all(request.paths.into_iter().map(|p| self.read_one(p))).await;
        Ok(CallToolResult::success(vec![Content::text(results.join("\n\n"))]))
    }

    #[tool(description = "Generate a tree-style visualization of a directory structure, honoring \
        .gitignore rules. Use this to understand what files are available. Optionally specify \
        maxDepth to limit the depth of the tree. Only works within the allowed directory.")]
    async fn tree(
        &self,
        Parameters(request): Parameters<TreeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.logger.debug(&format!(
            "[FilesystemServer] tree: path={}, maxDepth={:?}",
            request.path, request.max_depth
        ));

        let path = match validate_path(&request.path, &self.root) {
            Ok(path) => path,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(format!("Error: {e}"))])),
        };

        let options = TreeOptions {
            max_depth: request.max_depth,
        };
        match tokio::task::spawn_blocking(move || render_flat(&path, options)).await {
            Ok(rendered) => Ok(CallToolResult::success(vec![Content::text(rendered)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!("Error: {e}"))])),
        }
    }

    #[tool(description = "Returns the directory this server is allowed to access. Use this to \
        understand which directory is available before trying to access files.")]
    async fn list_allowed_directories(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(format!(
            "{}{}",
            ALLOWED_DIRECTORY_HEADER,
            self.root.display()
        ))]))
    }
}

#[tool_handler]
impl ServerHandler for FilesystemServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only access to one directory. Use 'tree' to see its layout, 'read_files' to \
                 read files, and 'list_allowed_directories' to find the root."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use rmcp::model::RawContent;
    use std::fs;
    use tempfile::tempdir;

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn server() -> (tempfile::TempDir, FilesystemServer) {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {\n}\n").unwrap();
        fs::write(dir.path().join("README.md"), "# Demo").unwrap();
        let server = FilesystemServer::new(dir.path(), NoOpLogger::shared()).unwrap();
        (dir, server)
    }

    #[test]
    fn test_frame_file() {
        assert_eq!(frame_file("a.rs", "x\ny"), "<a.rs>\nL1: x\nL2: y\n</a.rs>");
        assert_eq!(frame_file("e.txt", ""), "<e.txt>\nL1: \n</e.txt>");
    }

    #[test]
    fn test_rejects_non_directory_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        assert!(FilesystemServer::new(&file, NoOpLogger::shared()).is_err());
        assert!(FilesystemServer::new(&dir.path().join("missing"), NoOpLogger::shared()).is_err());
    }

    #[tokio::test]
    async fn test_read_files_mixes_results_in_order() {
        let (_dir, server) = server();
        let result = server
            .read_files(Parameters(ReadFilesRequest {
                paths: vec!["README.md".to_string(), "/etc/passwd".to_string()],
            }))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        let text = text_of(&result);
        let parts: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "<README.md>\nL1: # Demo\n</README.md>");
        assert!(parts[1].starts_with("/etc/passwd: Error - Access denied"));
    }

    #[tokio::test]
    async fn test_read_files_missing_file_is_inline_error() {
        let (_dir, server) = server();
        let result = server
            .read_files(Parameters(ReadFilesRequest {
                paths: vec!["src/nope.rs".to_string()],
            }))
            .await
            .unwrap();

        assert!(text_of(&result).starts_with("src/nope.rs: Error - "));
    }

    #[tokio::test]
    async fn test_tree_renders_from_relative_path() {
        let (_dir, server) = server();
        let result = server
            .tree(Parameters(TreeRequest {
                path: ".".to_string(),
                max_depth: Some(1),
            }))
            .await
            .unwrap();

        let text = text_of(&result);
        assert!(text.contains("├── README.md"));
        assert!(text.contains("└── src"));
        assert!(!text.contains("main.rs"));
        assert!(!text.contains(".git\n"));
    }

    #[tokio::test]
    async fn test_tree_outside_root_is_tool_error() {
        let (_dir, server) = server();
        let result = server
            .tree(Parameters(TreeRequest {
                path: "/".to_string(),
                max_depth: None,
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error: Access denied"));
    }

    #[tokio::test]
    async fn test_list_allowed_directories() {
        let (dir, server) = server();
        let result = server.list_allowed_directories().await.unwrap();
        let expected = format!(
            "Allowed directory:\n{}",
            dir.path().canonicalize().unwrap().display()
        );
        assert_eq!(text_of(&result), expected);
    }

    #[test]
    fn test_tree_request_accepts_camel_case() {
        let request: TreeRequest =
            serde_json::from_value(serde_json::json!({"path": ".", "maxDepth": 3})).unwrap();
        assert_eq!(request.max_depth, Some(3));

        let request: TreeRequest =
            serde_json::from_value(serde_json::json!({"path": ".", "maxDepth": null})).unwrap();
        assert_eq!(request.max_depth, None);
    }
}
