use crate::feature::{FeatureCollection, FeatureCollectionError};

/// Failure to obtain a feature collection from its locator.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The fetch completed with a non-success status.
    Status { locator: String, status: u16 },
    /// The fetch did not complete (network, CORS, body read).
    Transport { locator: String, message: String },
    /// The body arrived but is not a usable FeatureCollection.
    Parse {
        locator: String,
        source: FeatureCollectionError,
    },
}

impl LoadError {
    pub fn locator(&self) -> &str {
        match self {
            LoadError::Status { locator, .. }
            | LoadError::Transport { locator, .. }
            | LoadError::Parse { locator, .. } => locator,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LoadError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Status { locator, status } => {
                write!(f, "Errore caricamento {locator}: {status}")
            }
            LoadError::Transport { locator, message } => {
                write!(f, "Errore caricamento {locator}: {message}")
            }
            LoadError::Parse { locator, source } => {
                write!(f, "Errore caricamento {locator}: {source}")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Turns a completed HTTP exchange into a collection.
///
/// The body is only parsed when the status is a success.
pub fn collection_from_response(
    locator: &str,
    status: u16,
    body: &str,
) -> Result<FeatureCollection, LoadError> {
    if !is_success_status(status) {
        return Err(LoadError::Status {
            locator: locator.to_string(),
            status,
        });
    }
    let collection =
        FeatureCollection::from_geojson_str(body).map_err(|source| LoadError::Parse {
            locator: locator.to_string(),
            source,
        })?;
    tracing::info!(
        locator,
        features = collection.len(),
        "feature collection loaded"
    );
    Ok(collection)
}
