//! tarp-core: Core library for the tarp sharding tool
//!
//! This crate provides uniform access to byte streams named by descriptor
//! strings:
//! - `-` for the process's stdin/stdout
//! - `text:<literal>` for inline content
//! - `pipe:<command>` for a shell command connected through a pipe
//! - `file:<path>` or a bare path for the filesystem
//!
//! It also contains the configuration layer and the sharding sink used by the
//! `tarp` CLI.

pub mod bulk;
pub mod config;
pub mod descriptor;
pub mod diag;
pub mod error;
pub mod opener;
pub mod process;
pub mod reader;
pub mod shard;
pub mod traits;
pub mod writer;

pub use bulk::{read_all, write_all, PartialRead};
pub use config::{Config, ConfigManager, SplitDefaults};
pub use descriptor::{resolve, Descriptor, Scheme};
pub use diag::{DiagnosticSink, MemorySink, SharedSink, TracingSink};
pub use error::{Error, Result};
pub use opener::Opener;
pub use process::{CommandReader, CommandSpec, CommandWriter, ReadState, Shell, WriteState};
pub use reader::Reader;
pub use shard::{ShardInfo, ShardOptions, ShardPattern, ShardWriter};
pub use traits::Close;
pub use writer::Writer;
