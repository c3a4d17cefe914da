//! Tool management module
//!
//! Aggregates the catalogs of every connected provider into one registry and
//! executes the model's tool calls against it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ToolRegistry                               │
//! │                                             │
//! │  - Lists tools from each client (tools/list)│
//! │  - Routes a tool name to its client         │
//! │  - Provides tools to the model              │
//! │  - Runs a batch of calls concurrently       │
//! └─────────────────────────────────────────────┘
//!           │                       │
//!           │ in-process duplex     │ stdio
//!           ▼                       ▼
//! ┌───────────────────┐   ┌───────────────────┐
//! │ FilesystemServer  │   │ mcp_servers.json  │
//! │ read_files, tree  │   │ child processes   │
//! └───────────────────┘   └───────────────────┘
//! ```

mod registry;

pub use registry::{ToolError, ToolInfo, ToolRegistry};
