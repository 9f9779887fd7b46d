#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("could not connect to relay server: {0}")]
    Connect(#[from] rust_socketio::error::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
