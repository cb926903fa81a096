// One error type for the whole program.
// Every variant states *where* things went wrong.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Pushing the buffer to the window failed
    #[error("Image load error ({path}): {reason}")]
    ImageLoad { path: PathBuf, reason: String }, // Reading/decoding the picture failed
    #[error("Config read error ({path}): {source}")]
    ConfigRead { path: PathBuf, source: std::io::Error },
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),
    #[error("Buffer size mismatch: {0}")]
    SizeMismatch(String), // Two buffers that must line up don't
}
