pub mod dto;
pub mod handler;
pub mod ws;

pub use handler::{get_logs, list_resolutions, search, upload_logs};
pub use ws::issues_ws;
