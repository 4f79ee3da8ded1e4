//! ICE server configuration handed to browser peers.
//!
//! The relay never takes part in NAT traversal itself; it only tells
//! clients which STUN/TURN servers to use.

use crate::state::{AppState, Config};
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IceServersResponse {
    pub ice_servers: Vec<IceServer>,
}

pub async fn get_ice_servers(State(state): State<AppState>) -> Json<IceServersResponse> {
    Json(IceServersResponse {
        ice_servers: ice_servers(&state.config),
    })
}

pub fn ice_servers(config: &Config) -> Vec<IceServer> {
    let stun = config.stun_servers.iter().map(|stun_url| IceServer {
        urls: vec![stun_url.clone()],
        username: None,
        credential: None,
    });

    let turn = config.turn_servers.iter().map(|turn| IceServer {
        urls: vec![turn.url.clone()],
        username: Some(turn.username.clone()),
        credential: Some(turn.credential.clone()),
    });

    stun.chain(turn).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TurnServer;

    #[test]
    fn test_stun_then_turn() {
        let config = Config {
            stun_servers: vec!["stun:stun.example:3478".to_string()],
            turn_servers: vec![TurnServer {
                url: "turn:turn.example:3478".to_string(),
                username: "user".to_string(),
                credential: "pass".to_string(),
            }],
            ..Config::default()
        };

        let servers = ice_servers(&config);
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].urls, vec!["stun:stun.example:3478"]);
        assert_eq!(servers[0].username, None);
        assert_eq!(servers[1].credential.as_deref(), Some("pass"));

        let json = serde_json::to_value(&servers[0]).unwrap();
        assert!(json.get("username").is_none());
    }
}
