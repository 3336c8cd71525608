//! Media player operations
//!
//! Operations for controlling playback on a speaker: transport, volume, loop
//! mode and the two play-by-URL encodings.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::define_ubus_operation;
use crate::error::ApiError;
use crate::operation::{UbusOperation, UbusResponse};
use crate::service::Service;

define_ubus_operation! {
    operation: SetVolumeOperation,
    method: "player_set_volume",
    service: MediaPlayer,
    request: {
        volume: u8,
    },
    fixed: {
        media: "app_ios",
    },
}

define_ubus_operation! {
    operation: TransportOperation,
    method: "player_play_operation",
    service: MediaPlayer,
    request: {
        action: String,
    },
    fixed: {
        media: "app_ios",
    },
}

define_ubus_operation! {
    operation: SetLoopOperation,
    method: "player_set_loop",
    service: MediaPlayer,
    request: {
        r#type: u8,
    },
    fixed: {
        media: "common",
    },
}

define_ubus_operation! {
    operation: PlayUrlOperation,
    method: "player_play_url",
    service: MediaPlayer,
    request: {
        url: String,
        r#type: u8,
    },
    fixed: {
        media: "app_ios",
    },
}

/// Audio id the vendor app uses for ad-hoc streams
pub const DEFAULT_AUDIO_ID: &str = "1582971365183456177";

/// Content-provider item id paired with [`DEFAULT_AUDIO_ID`]
pub const DEFAULT_CP_ID: &str = "355454500";

/// Track type that turns the indicator light on in the music payload
const HIGHLIGHT_TRACK_TYPE: u8 = 1;

/// Structured play-by-URL for models that reject `player_play_url`
pub struct PlayMusicOperation;

/// Request for the structured music payload
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PlayMusicRequest {
    pub url: String,
    pub track_type: u8,
    pub audio_id: String,
    pub cp_id: String,
}

impl PlayMusicRequest {
    pub fn new(url: impl Into<String>, track_type: u8) -> Self {
        Self {
            url: url.into(),
            track_type,
            audio_id: DEFAULT_AUDIO_ID.to_string(),
            cp_id: DEFAULT_CP_ID.to_string(),
        }
    }

    fn music(&self) -> Value {
        let audio_type = if self.track_type == HIGHLIGHT_TRACK_TYPE {
            "MUSIC"
        } else {
            ""
        };

        json!({
            "payload": {
                "audio_type": audio_type,
                "audio_items": [
                    {
                        "item_id": {
                            "audio_id": self.audio_id,
                            "cp": {
                                "album_id": "-1",
                                "episode_index": 0,
                                "id": self.cp_id,
                                "name": "xiaowei",
                            },
                        },
                        "stream": {"url": self.url},
                    }
                ],
                "list_params": {
                    "listId": "-1",
                    "loadmore_offset": 0,
                    "origin": "xiaowei",
                    "type": "MUSIC",
                },
            },
            "play_behavior": "REPLACE_ALL",
        })
    }
}

impl UbusOperation for PlayMusicOperation {
    type Request = PlayMusicRequest;
    type Response = UbusResponse;

    const SERVICE: Service = Service::MediaPlayer;
    const METHOD: &'static str = "player_play_music";

    fn build_message(request: &Self::Request) -> Result<Value, ApiError> {
        // The music object travels as a JSON string inside the message
        Ok(json!({
            "startaudioid": request.audio_id,
            "music": serde_json::to_string(&request.music())?,
        }))
    }

    fn parse_response(response: UbusResponse) -> Result<Self::Response, ApiError> {
        Ok(response)
    }
}

/// Player state as reported by `player_get_play_status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub volume: Option<u8>,
    #[serde(default)]
    pub loop_type: Option<i64>,
    #[serde(default)]
    pub media_type: Option<i64>,
    #[serde(default)]
    pub play_song_detail: Option<Value>,
}

impl PlayerStatus {
    pub fn is_playing(&self) -> bool {
        self.status == Some(1)
    }
}

define_ubus_operation! {
    operation: RawPlayStatusOperation,
    method: "player_get_play_status",
    service: MediaPlayer,
    request: {},
    fixed: {
        media: "app_ios",
    },
}

/// Query the player state and decode it
pub struct GetPlayStatusOperation;

impl UbusOperation for GetPlayStatusOperation {
    type Request = RawPlayStatusOperationRequest;
    type Response = PlayerStatus;

    const SERVICE: Service = Service::MediaPlayer;
    const METHOD: &'static str = RawPlayStatusOperation::METHOD;

    fn parse_response(response: UbusResponse) -> Result<Self::Response, ApiError> {
        response.info()
    }
}
