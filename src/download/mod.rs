pub mod channel;
pub mod error;
pub mod events;
pub mod history;
pub mod progress;
pub mod request;
pub mod session;
pub mod worker;

pub use channel::{ProgressChannel, ProgressSender};
pub use error::SessionError;
pub use events::{Envelope, Phase, ProgressEvent};
pub use history::{DuplicatePolicy, HistoryEntry, HistoryError, HistoryStore};
pub use request::DownloadRequest;
pub use session::{DownloadSession, SessionOptions, SessionState};
