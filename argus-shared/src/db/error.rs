/// Repository errors
///
/// Each variant is a distinct kind so callers classify by matching rather
/// than by inspecting message text.

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Caller passed something unusable (empty filter, unknown column, id <= 0)
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("{table}: unique constraint violated{}", .constraint.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default())]
    Conflict {
        table: &'static str,
        constraint: Option<String>,
    },

    #[error("no fields to update")]
    NoFieldsToUpdate,

    #[error("{context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: sqlx::Error,
    },
}

impl RepoError {
    /// Wraps a driver error with operation context, promoting unique
    /// violations to [`RepoError::Conflict`] and dangling references to
    /// [`RepoError::InvalidArgument`]
    pub fn from_sqlx(table: &'static str, op: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return RepoError::Conflict {
                        table,
                        constraint: db_err.constraint().map(str::to_string),
                    };
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return RepoError::InvalidArgument(match db_err.constraint() {
                        Some(constraint) => {
                            format!("{}: referenced record does not exist ({})", table, constraint)
                        }
                        None => format!("{}: referenced record does not exist", table),
                    });
                }
                _ => {}
            }
        }

        RepoError::Persistence {
            context: format!("{} {}", table, op),
            source: err,
        }
    }
}
