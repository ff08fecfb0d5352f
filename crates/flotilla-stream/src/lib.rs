mod error;
pub use error::StreamError;

mod channel;
pub use channel::{ClientSink, ClientSource};

mod config;
pub use config::SessionConfig;

mod metrics;
pub use metrics::{SESSION_KIND_LOGS, SESSION_KIND_SHELL, error_outcome};

mod target;
pub use target::select_target;

pub mod logs;
pub mod shell;
