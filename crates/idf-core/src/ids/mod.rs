//! ID type wrappers for type safety.

pub mod attempt_id;
pub mod session_token;
pub mod subject_id;

pub use attempt_id::AttemptId;
pub use session_token::{SessionToken, TokenError};
pub use subject_id::{SubjectId, SubjectIdError};
