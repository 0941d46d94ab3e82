use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Credential file rejected [{path}]: {message}")]
    CredentialFile { path: String, message: String },

    #[error("Login failed [{target}]: {message}")]
    Authentication { target: String, message: String },

    #[error("No JWT token found in login response [{target}] (keys present: {keys:?})")]
    TokenNotFound { target: String, keys: Vec<String> },

    #[error("GetCapabilities failed [{target}]: {message}")]
    CapabilitiesFetch { target: String, message: String },

    #[error("Document not parseable [{source_name}]: {message}")]
    DocumentParse { source_name: String, message: String },

    #[error("Nothing to do: no credential files and no cached capabilities documents")]
    NothingToDo,

    #[error("Invalid configuration value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
