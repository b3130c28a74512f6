use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-attributed validation failures, collected before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errs = Self::new();
        errs.add(field, message);
        errs
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

/// A uniqueness violation on one of the constrained columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub entity: String,
    pub field: String,
    pub value: Option<String>,
}

impl Conflict {
    pub fn new(entity: &str, field: &str, value: Option<String>) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
            value,
        }
    }

    pub fn is_on(&self, entity: &str, field: &str) -> bool {
        self.entity == entity && self.field == field
    }

    fn from_constraint(constraint: &str) -> Option<Self> {
        let (entity, field) = match constraint {
            "elections_title_key" => ("election", "title"),
            "positions_name_key" => ("position", "name"),
            "candidates_id_number_key" => ("candidate", "id_number"),
            "courses_name_key" => ("course", "name"),
            "voters_id_number_key" => ("voter", "id_number"),
            _ => return None,
        };
        Some(Self::new(entity, field, None))
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}.{} '{}' already exists", self.entity, self.field, v),
            None => write!(f, "{}.{} already exists", self.entity, self.field),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    #[error("conflict: {0}")]
    Conflict(Conflict),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Store(sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            Error::Conflict(c) => Some(c),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                if let Some(conflict) = db_err.constraint().and_then(Conflict::from_constraint) {
                    return Error::Conflict(conflict);
                }
            }
        }
        if let sqlx::Error::RowNotFound = e {
            return Error::NotFound("row not found".into());
        }
        Error::Store(e)
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ErrorBody<'a> {
    Validation { errors: &'a [FieldError] },
    Conflict { conflict: &'a Conflict },
    NotFound { message: &'a str },
    Internal { message: &'static str },
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Store(_) | Error::Migrate(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Error::Validation(errs) => ErrorBody::Validation { errors: errs.errors() },
            Error::Conflict(c) => ErrorBody::Conflict { conflict: c },
            Error::NotFound(msg) => ErrorBody::NotFound { message: msg },
            Error::Store(_) | Error::Migrate(_) | Error::Config(_) => {
                log::error!("{}", self);
                ErrorBody::Internal { message: "internal server error" }
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
