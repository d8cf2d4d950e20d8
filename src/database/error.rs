use thiserror::Error as ThisError;
use warp::reject::Rejection;

use crate::schema::{MembershipKind, Uuid};

pub const PG_UNIQUE_VIOLATION: &str = "23505";
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Malformed input, rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ValidationError {
    #[error("recipe must have at least one tag")]
    EmptyTags,
    #[error("tag {0} is listed more than once")]
    DuplicateTag(Uuid),
    #[error("no tag exists with id {0}")]
    UnknownTag(Uuid),
    #[error("recipe must have at least one ingredient")]
    EmptyIngredients,
    #[error("ingredient {0} is listed more than once")]
    DuplicateIngredient(Uuid),
    #[error("no ingredient exists with id {0}")]
    UnknownIngredient(Uuid),
    #[error("ingredient amount must be between 1 and 10000, got {0}")]
    AmountOutOfRange(i32),
    #[error("cooking time must be between 1 and 1500 minutes, got {0}")]
    CookingTimeOutOfRange(i32),
    #[error("recipe name must contain at least one letter")]
    InvalidRecipeName,
    #[error("tag name must be between 1 and 200 characters")]
    InvalidTagName,
    #[error("tag color must be a hex value like #1a2B3c")]
    InvalidTagColor,
    #[error("tag slug contains forbidden characters")]
    InvalidTagSlug,
    #[error("username contains forbidden characters")]
    InvalidUsername,
    #[error("you cannot subscribe to yourself")]
    SelfSubscription,
    #[error("{0}")]
    Malformed(String),
}

/// A uniqueness rule said no. Either a pre-flight check caught the
/// duplicate, or the database constraint did after a concurrent write
/// slipped past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ConflictError {
    #[error("you are already subscribed to this author")]
    DuplicateSubscription,
    #[error("recipe is already in {}", .0.display_name())]
    DuplicateMembership(MembershipKind),
    #[error("an ingredient with this name and measurement unit already exists")]
    IngredientExists,
    #[error("a tag with this name or slug already exists")]
    TagExists,
    #[error("ingredient is still used by existing recipes")]
    IngredientInUse,
    #[error("a concurrent request already created this row")]
    UniqueViolation,
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("no {0} exists with the specified id")]
    NotFound(&'static str),
    #[error("{0}")]
    Permission(&'static str),
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl Error {
    pub fn status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Permission(_) => 403,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::Query(_) => 500,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(e) = &value {
            match e.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    return Error::Conflict(ConflictError::UniqueViolation)
                }
                Some(PG_FOREIGN_KEY_VIOLATION) => return Error::NotFound("referenced row"),
                _ => {}
            }
        }

        Error::Query(QueryError::from(value))
    }
}

impl warp::reject::Reject for Error {}

// `From<Error> for Rejection` is provided automatically by warp's blanket
// `impl<T: Reject> From<T> for Rejection`, which also uses `reject::custom`.

#[derive(Debug, ThisError)]
#[error("{info}")]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(String::from("Row not found")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(String::from("Unknown error")),
        }
    }
}

/// Type conversion failure while reading form data.
#[derive(Debug, ThisError)]
#[error("({info})")]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        Error::Validation(ValidationError::Malformed(value.info))
    }
}

impl From<TypeError> for Rejection {
    fn from(value: TypeError) -> Self {
        Error::from(value).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(Error::from(ValidationError::EmptyTags).status(), 400);
        assert_eq!(Error::Permission("nope").status(), 403);
        assert_eq!(Error::NotFound("recipe").status(), 404);
        assert_eq!(Error::from(ConflictError::DuplicateSubscription).status(), 409);
        assert_eq!(
            Error::Query(QueryError::new(String::from("boom"))).status(),
            500
        );
    }

    #[test]
    fn membership_conflicts_name_the_set() {
        let error = ConflictError::DuplicateMembership(MembershipKind::ShoppingCart);
        assert_eq!(format!("{error}"), "recipe is already in the shopping cart");
    }

    #[test]
    fn type_errors_become_validation_errors() {
        let error = Error::from(TypeError::new("Invalid key"));
        assert_eq!(error.status(), 400);
    }
}
