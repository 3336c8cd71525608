use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("API error: {0}")]
    Api(#[from] mina_api::ApiError),

    #[error("Playlist error: {0}")]
    Playlist(String),

    #[error("Playback cancelled")]
    Cancelled,

    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("Invalid broadcast target: {0}")]
    InvalidTarget(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;
