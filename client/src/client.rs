use dtekv_common::models::{CreateRequest, CreateResponse};
use reqwest::Client;
use url::Url;

use crate::Result;

/// HTTP side of the board server: creating sessions and locating their sockets.
pub struct BoardClient {
    client: Client,
    base_url: Url,
}

impl BoardClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::new();

        Ok(Self { client, base_url })
    }

    /// Deals a new game on the server and returns its session ID.
    pub async fn create_session(&self, request: &CreateRequest) -> Result<String> {
        let create_url = self.base_url.join("/create")?;

        let response = self.client.post(create_url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(format!("Failed to create board session: {}", response.status()).into());
        }

        let create_response: CreateResponse = response.json().await?;
        Ok(create_response.id)
    }

    pub fn websocket_url(&self, session_id: &str) -> Result<String> {
        let mut ws_url = self.base_url.clone();
        ws_url
            .set_scheme(match self.base_url.scheme() {
                "https" => "wss",
                _ => "ws",
            })
            .map_err(|_| "Failed to set WebSocket scheme")?;
        ws_url.set_path("/ws");
        ws_url.query_pairs_mut().clear().append_pair("id", session_id);

        Ok(ws_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_follows_the_http_scheme() {
        let client = BoardClient::new("http://localhost:8000/ignored?x=1").unwrap();
        assert_eq!(client.websocket_url("abc12").unwrap(), "ws://localhost:8000/ws?id=abc12");

        let client = BoardClient::new("https://board.example.com").unwrap();
        assert_eq!(client.websocket_url("Z_9-q").unwrap(), "wss://board.example.com/ws?id=Z_9-q");
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(BoardClient::new("not a url").is_err());
    }
}
