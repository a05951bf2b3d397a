pub mod telegram;

use reqwest::Url;

/// A text message received from the platform
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Chat the reply goes back to
    pub chat_id: i64,
    /// Sender, absent for channel posts
    pub user_id: Option<u64>,
    /// Display name of the sender
    pub user_name: String,
    /// The message text, exactly as received
    pub text: String,
}

/// One "send text message to chat" call
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub button: Option<WebAppButton>,
}

/// A button that opens a web application inside the chat client
#[derive(Debug, Clone, PartialEq)]
pub struct WebAppButton {
    pub text: String,
    pub url: Url,
}
