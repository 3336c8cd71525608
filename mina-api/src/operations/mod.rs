//! Gateway bus operations organized by subsystem

pub mod media_player;
pub mod mi_brain;

pub use media_player::{
    GetPlayStatusOperation, PlayMusicOperation, PlayMusicRequest, PlayUrlOperation,
    PlayerStatus, SetLoopOperation, SetVolumeOperation, TransportOperation,
};
pub use mi_brain::{ConversationAnswer, ConversationMessage, NlpResultGetOperation, TextToSpeechOperation};
