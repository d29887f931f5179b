pub mod app;
pub mod catalog;
pub mod cli;
pub mod download;
pub mod extractor;
pub mod util;

pub use app::config::Config;
pub use download::{DownloadSession, SessionOptions};
