use serde::{Deserialize, Serialize};

use crate::models::{Cell, Difficulty, Outcome, Pos};

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    /// Latest level of every switch and key on the virtual board.
    #[serde(rename = "input")]
    Input { switches: u32, keys: u32 },
    #[serde(rename = "restart")]
    Restart {
        #[serde(default)]
        difficulty: Option<Difficulty>,
        #[serde(default)]
        seed: Option<u32>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub difficulty: Difficulty,
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    pub mines_remaining: usize,
    pub cursor: Pos,
    pub outcome: Outcome,
    pub field: Vec<Vec<Cell>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "frame")]
    Frame(Frame),
    /// The finished game was dismissed and a new one is about to start.
    #[serde(rename = "menu")]
    Menu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_messages_parse_from_json() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"action":"input","switches":16,"keys":4294967294}"#)
                .unwrap();
        match message {
            ClientMessage::Input { switches, keys } => {
                assert_eq!(switches, 16);
                assert_eq!(keys, u32::MAX - 1);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn restart_fields_are_optional() {
        let message: ClientMessage = serde_json::from_str(r#"{"action":"restart"}"#).unwrap();
        assert!(matches!(
            message,
            ClientMessage::Restart {
                difficulty: None,
                seed: None
            }
        ));
    }

    #[test]
    fn frames_are_flattened_into_the_tagged_message() {
        let frame = Frame {
            difficulty: Difficulty::Easy,
            rows: 1,
            cols: 1,
            mines: 0,
            mines_remaining: 0,
            cursor: Pos::new(0, 0),
            outcome: Outcome::Won,
            field: vec![vec![Cell::Revealed { adjacent: 0 }]],
        };
        let json = serde_json::to_value(ServerMessage::Frame(frame)).unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["outcome"], "won");
        assert_eq!(json["field"][0][0]["state"], "revealed");
    }
}
