//! Result type alias for mentor operations.

use super::mentor_error::MentorError;

/// Type alias for Results using MentorError.
///
/// # Example
///
/// ```ignore
/// use mood_mentor::error::MentorResult;
///
/// fn resolve() -> MentorResult<ChatConfig> {
///     Ok(provider.resolve()?)
/// }
/// ```
pub type MentorResult<T> = Result<T, MentorError>;
