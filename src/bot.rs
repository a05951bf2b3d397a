use anyhow::{bail, Context, Result};
use reqwest::Url;
use teloxide::utils::command::BotCommands;

use crate::config::{MessagesConfig, WebAppConfig};
use crate::platform::{IncomingMessage, OutgoingMessage, WebAppButton};

/// Commands published in the bot menu
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "open the web app")]
    Start,
}

/// Which handler an incoming text message belongs to.
///
/// Every message gets exactly one route, so a command can never reach the
/// echo handler and plain text can never reach `/start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Start,
    /// A command other than `/start`, or one addressed to another bot
    OtherCommand,
    Text,
}

/// Classify a message text. `bot_username` is used to match `/start@name`.
pub fn route(text: &str, bot_username: &str) -> Route {
    if !is_command(text) {
        return Route::Text;
    }

    // The command entity ends at the first character outside [A-Za-z0-9_@]
    let end = text[1..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '@'))
        .map_or(text.len(), |i| i + 1);
    let head = text[..end].to_ascii_lowercase();

    match Command::parse(&head, &bot_username.to_ascii_lowercase()) {
        Ok(Command::Start) => Route::Start,
        Err(_) => Route::OtherCommand,
    }
}

/// Telegram only marks `/` + [A-Za-z0-9_] at offset 0 as a bot command
fn is_command(text: &str) -> bool {
    text.strip_prefix('/')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builds the replies for both handlers. Holds no per-chat state.
#[derive(Debug, Clone)]
pub struct Responder {
    greeting: String,
    echo_label: String,
    button: WebAppButton,
}

impl Responder {
    pub fn new(webapp: &WebAppConfig, messages: &MessagesConfig) -> Result<Self> {
        let url = Url::parse(&webapp.url)
            .with_context(|| format!("Invalid web app URL: {}", webapp.url))?;
        if url.scheme() != "https" {
            bail!("Web app URL must use https: {}", url);
        }

        Ok(Self {
            greeting: messages.greeting.clone(),
            echo_label: messages.echo_label.clone(),
            button: WebAppButton {
                text: webapp.button_text.clone(),
                url,
            },
        })
    }

    pub fn webapp_url(&self) -> &Url {
        &self.button.url
    }

    /// Greeting plus the single web app button
    pub fn start_command(&self, incoming: &IncomingMessage) -> OutgoingMessage {
        OutgoingMessage {
            chat_id: incoming.chat_id,
            text: self.greeting.clone(),
            button: Some(self.button.clone()),
        }
    }

    /// Label followed by the received text, untouched
    pub fn echo_message(&self, incoming: &IncomingMessage) -> OutgoingMessage {
        OutgoingMessage {
            chat_id: incoming.chat_id,
            text: format!("{}{}", self.echo_label, incoming.text),
            button: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "webapp_test_bot";

    fn responder() -> Responder {
        Responder::new(&WebAppConfig::default(), &MessagesConfig::default()).unwrap()
    }

    fn incoming(chat_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id,
            user_id: Some(42),
            user_name: "Tester".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_route_start() {
        assert_eq!(route("/start", BOT), Route::Start);
        assert_eq!(route("/start payload", BOT), Route::Start);
        assert_eq!(route(&format!("/start@{}", BOT), BOT), Route::Start);
        assert_eq!(route("/start\npayload", BOT), Route::Start);
    }

    #[test]
    fn test_route_start_ignores_case() {
        assert_eq!(route("/START", BOT), Route::Start);
        assert_eq!(route("/Start@WebApp_Test_Bot", BOT), Route::Start);
    }

    #[test]
    fn test_route_start_ends_at_punctuation() {
        assert_eq!(route("/start.", BOT), Route::Start);
        assert_eq!(route("/start,hi", BOT), Route::Start);
        assert_eq!(route("/start!", BOT), Route::Start);
    }

    #[test]
    fn test_route_start_for_other_bot_is_not_answered() {
        assert_eq!(route("/start@someone_else_bot", BOT), Route::OtherCommand);
    }

    #[test]
    fn test_route_other_commands() {
        assert_eq!(route("/help", BOT), Route::OtherCommand);
        assert_eq!(route("/startgame", BOT), Route::OtherCommand);
        assert_eq!(route("/_x", BOT), Route::OtherCommand);
    }

    #[test]
    fn test_route_plain_text() {
        assert_eq!(route("hello", BOT), Route::Text);
        assert_eq!(route("", BOT), Route::Text);
        assert_eq!(route("/", BOT), Route::Text);
        assert_eq!(route("/ start", BOT), Route::Text);
        assert_eq!(route("say /start", BOT), Route::Text);
    }

    #[test]
    fn test_start_reply_has_greeting_and_one_button() {
        let reply = responder().start_command(&incoming(123, "/start"));

        assert_eq!(reply.chat_id, 123);
        assert_eq!(reply.text, "Привет! Нажми на кнопку, чтобы открыть игру:");
        let button = reply.button.as_ref().unwrap();
        assert_eq!(button.text, "Открыть игру");
        assert_eq!(
            button.url.as_str(),
            "https://database-test-production.up.railway.app/"
        );
    }

    #[test]
    fn test_echo_reply() {
        let reply = responder().echo_message(&incoming(456, "hello"));

        assert_eq!(reply.chat_id, 456);
        assert_eq!(reply.text, "Вы сказали: hello");
        assert!(reply.button.is_none());
    }

    #[test]
    fn test_echo_keeps_text_verbatim() {
        let text = "  <b>*markdown*</b> & émoji 🎮\nsecond line  ";
        let reply = responder().echo_message(&incoming(1, text));
        assert_eq!(reply.text, format!("Вы сказали: {}", text));
    }

    #[test]
    fn test_custom_config() {
        let webapp = WebAppConfig {
            url: "https://example.com/app?x=1".to_string(),
            button_text: "Play".to_string(),
        };
        let messages = MessagesConfig {
            greeting: "Hi".to_string(),
            echo_label: "You said: ".to_string(),
        };
        let responder = Responder::new(&webapp, &messages).unwrap();

        assert_eq!(responder.webapp_url().as_str(), "https://example.com/app?x=1");
        assert_eq!(responder.echo_message(&incoming(1, "x")).text, "You said: x");
        assert_eq!(responder.start_command(&incoming(1, "/start")).text, "Hi");
    }

    #[test]
    fn test_rejects_non_https_url() {
        let webapp = WebAppConfig {
            url: "http://example.com/".to_string(),
            ..WebAppConfig::default()
        };
        assert!(Responder::new(&webapp, &MessagesConfig::default()).is_err());
    }

    #[test]
    fn test_rejects_malformed_url() {
        let webapp = WebAppConfig {
            url: "not a url".to_string(),
            ..WebAppConfig::default()
        };
        let err = Responder::new(&webapp, &MessagesConfig::default()).unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_command_menu_lists_start() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command.trim_start_matches('/'), "start");
    }
}
