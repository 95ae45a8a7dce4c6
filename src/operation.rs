// Operation resolution: reconciles the operation keyword and document id
// given on the command line with the operation key found in a JSON
// document file, producing a single `DocumentOperation` or an error before
// anything is sent over the network.

use crate::document_id::{DocumentId, ParseError};
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Put,
    Update,
    Remove,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] =
        [OperationKind::Put, OperationKind::Update, OperationKind::Remove];

    /// The operation keyword, which is also its key in a JSON document file.
    pub fn keyword(self) -> &'static str {
        match self {
            OperationKind::Put => "put",
            OperationKind::Update => "update",
            OperationKind::Remove => "remove",
        }
    }

    pub fn method(self) -> Method {
        match self {
            OperationKind::Put => Method::POST,
            OperationKind::Update => Method::PUT,
            OperationKind::Remove => Method::DELETE,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A fully resolved unit of work for the document API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOperation {
    pub kind: OperationKind,
    pub id: DocumentId,
    /// Verbatim file content for put and update, `None` for remove.
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("No document operation given neither as argument or as a 'put', 'update' or 'remove' key in the json file")]
    NoOperation,
    #[error("No document id given neither as argument or as a '{0}' key in the json file")]
    NoDocumentId(OperationKind),
    #[error("Wanted document operation is {wanted} but the JSON file specifies {found}")]
    ConflictingOperation {
        wanted: OperationKind,
        found: OperationKind,
    },
    #[error("The JSON file specifies more than one document operation: {0}, {1}")]
    AmbiguousOperation(OperationKind, OperationKind),
    #[error("Expected a JSON document file, optionally preceded by a document id")]
    MissingFile,
    #[error("Too many arguments: expected at most a document id and a JSON document file")]
    TooManyArguments,
    #[error("Could not read document file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not parse JSON document in {path}: {reason}")]
    InvalidJson { path: PathBuf, reason: String },
    #[error(transparent)]
    InvalidId(#[from] ParseError),
}

/// Resolve positional arguments (`[file]`, `[id, file]`, or `[id]` for a
/// remove) and an optional explicit operation into a `DocumentOperation`.
///
/// The file is loaded through `read`, so callers decide where bytes come
/// from; nothing else has side effects.
pub fn resolve<R>(
    args: &[String],
    explicit_kind: Option<OperationKind>,
    read: R,
) -> Result<DocumentOperation, ResolutionError>
where
    R: FnOnce(&Path) -> io::Result<Vec<u8>>,
{
    let (arg_id, file) = match args {
        [] => return Err(ResolutionError::MissingFile),
        [only] if explicit_kind == Some(OperationKind::Remove) && only.starts_with("id:") => {
            let id = DocumentId::parse(only)?;
            return Ok(DocumentOperation {
                kind: OperationKind::Remove,
                id,
                body: None,
            });
        }
        [file] => (None, Path::new(file)),
        [id, file] => (Some(id.as_str()), Path::new(file)),
        _ => return Err(ResolutionError::TooManyArguments),
    };

    let content = read(file).map_err(|source| ResolutionError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let document: Map<String, Value> =
        serde_json::from_slice(&content).map_err(|e| ResolutionError::InvalidJson {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })?;

    let json_kind = operation_in(&document)?;

    if let (Some(wanted), Some(found)) = (explicit_kind, json_kind) {
        if wanted != found {
            return Err(ResolutionError::ConflictingOperation { wanted, found });
        }
    }
    let kind = explicit_kind.or(json_kind);

    let raw_id = match arg_id {
        Some(id) => id.to_string(),
        None => {
            let key_kind = kind.unwrap_or(OperationKind::Put);
            match document.get(key_kind.keyword()) {
                Some(Value::String(id)) => id.clone(),
                Some(other) => {
                    return Err(ParseError::InvalidFormat(other.to_string()).into());
                }
                None => return Err(ResolutionError::NoDocumentId(key_kind)),
            }
        }
    };
    let kind = kind.ok_or(ResolutionError::NoOperation)?;
    let id = DocumentId::parse(&raw_id)?;

    let body = match kind {
        OperationKind::Remove => None,
        OperationKind::Put | OperationKind::Update => Some(content),
    };
    tracing::debug!(operation = %kind, id = %id, "resolved document operation");
    Ok(DocumentOperation { kind, id, body })
}

/// The single operation key present in the document, if any.
fn operation_in(document: &Map<String, Value>) -> Result<Option<OperationKind>, ResolutionError> {
    let mut present = OperationKind::ALL
        .into_iter()
        .filter(|kind| document.contains_key(kind.keyword()));
    match (present.next(), present.next()) {
        (Some(first), Some(second)) => Err(ResolutionError::AmbiguousOperation(first, second)),
        (first, _) => Ok(first),
    }
}
