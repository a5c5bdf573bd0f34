use serde::{ Serialize, Deserialize };

use super::chat::Message;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "clear")]
    Clear,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "message")] Message {
        message: Message,
        html: String,
    },
    #[serde(rename = "done")] Done {
        message_id: String,
        timestamp: i64,
    },
    #[serde(rename = "cleared")]
    Cleared,
    #[serde(rename = "error")] Error {
        message: String,
    },
}
