use crate::download::SessionError;

// Exit codes for CLI automation
pub const SUCCESS: i32 = 0;
pub const ERROR: i32 = 1;
pub const NOT_FOUND: i32 = 2;
pub const INVALID_INPUT: i32 = 3;
pub const BUSY: i32 = 4;

/// Exit code for a rejected or failed session request
pub fn exit_code(error: &SessionError) -> i32 {
    match error {
        SessionError::InvalidSelection(_) => NOT_FOUND,
        SessionError::EmptyUrl | SessionError::Directory { .. } => INVALID_INPUT,
        SessionError::Busy => BUSY,
        SessionError::DiscoveryFailed(_)
        | SessionError::DownloadFailed(_)
        | SessionError::PersistenceFailed(_) => ERROR,
    }
}
