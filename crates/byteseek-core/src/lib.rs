pub mod config;
pub mod logging;

pub mod analyzer;
pub mod control;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod probe;
pub mod progress;
pub mod reader;
pub mod retry;
pub mod source;
pub mod window;

pub use error::{ByteSourceError, Result};
pub use source::{ByteSource, RemoteByteSource};
