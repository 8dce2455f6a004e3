//! Game records as the remote service serves them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Games with these rules are mirrored; every other variant is dropped at
/// ingestion and never reaches the cache.
pub const STANDARD_RULES: &str = "chess";

/// One finished game. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub url: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end_time: DateTime<Utc>,
    pub rated: bool,
    pub time_class: String,
    pub rules: String,
    pub white: Player,
    pub black: Player,
    #[serde(default)]
    pub pgn: String,
}

impl Game {
    pub fn is_standard(&self) -> bool {
        self.rules == STANDARD_RULES
    }

    /// The side `username` played, if they took part at all.
    pub fn side_of<'a>(&'a self, username: &str) -> Option<&'a Player> {
        if self.white.username == username {
            Some(&self.white)
        } else if self.black.username == username {
            Some(&self.black)
        } else {
            None
        }
    }
}

/// One side of a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub username: String,
    #[serde(default)]
    pub rating: i32,
    /// Raw result word from the service; see [`Player::normalized`].
    #[serde(default)]
    pub result: String,
    #[serde(rename = "@id", default)]
    pub profile_url: String,
}

/// The service's result vocabulary collapsed to four outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerResult {
    Win,
    Lose,
    Draw,
    Abandoned,
}

impl PlayerResult {
    pub fn initial(self) -> char {
        match self {
            PlayerResult::Win => 'W',
            PlayerResult::Lose => 'L',
            PlayerResult::Draw => 'D',
            PlayerResult::Abandoned => 'A',
        }
    }
}

impl Player {
    pub fn normalized(&self) -> PlayerResult {
        match self.result.as_str() {
            "win" => PlayerResult::Win,
            "abandoned" => PlayerResult::Abandoned,
            "agreed" | "repetition" | "stalemate" | "insufficient" | "50move"
            | "timevsinsufficient" => PlayerResult::Draw,
            _ => PlayerResult::Lose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deserializes_service_payload() {
        let json = r#"{
            "url": "https://www.chess.com/game/live/42",
            "pgn": "1. e4 e5",
            "end_time": 1704103200,
            "rated": true,
            "time_class": "blitz",
            "rules": "chess",
            "white": {"username": "alice", "rating": 1500, "result": "win",
                      "@id": "https://api.chess.com/pub/player/alice"},
            "black": {"username": "bob", "rating": 1480, "result": "checkmated",
                      "@id": "https://api.chess.com/pub/player/bob"}
        }"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.end_time, Utc.timestamp_opt(1704103200, 0).unwrap());
        assert!(game.is_standard());
        assert_eq!(game.white.normalized(), PlayerResult::Win);
        assert_eq!(game.black.normalized(), PlayerResult::Lose);
        assert_eq!(game.side_of("bob").unwrap().rating, 1480);
        assert!(game.side_of("carol").is_none());
    }

    #[test]
    fn draw_vocabulary_normalizes() {
        for word in [
            "agreed",
            "repetition",
            "stalemate",
            "insufficient",
            "50move",
            "timevsinsufficient",
        ] {
            let p = Player {
                username: "x".into(),
                rating: 0,
                result: word.into(),
                profile_url: String::new(),
            };
            assert_eq!(p.normalized(), PlayerResult::Draw);
        }
    }

    #[test]
    fn round_trips_through_json() {
        let game = Game {
            url: "https://www.chess.com/game/live/7".into(),
            end_time: Utc.timestamp_opt(1700000000, 0).unwrap(),
            rated: false,
            time_class: "rapid".into(),
            rules: "chess".into(),
            white: Player {
                username: "a".into(),
                rating: 900,
                result: "win".into(),
                profile_url: String::new(),
            },
            black: Player {
                username: "b".into(),
                rating: 905,
                result: "resigned".into(),
                profile_url: String::new(),
            },
            pgn: "1. d4 d5".into(),
        };
        let json = serde_json::to_string(&game).unwrap();
        let back: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(back.url, game.url);
        assert_eq!(back.end_time, game.end_time);
        assert_eq!(back.pgn, game.pgn);
    }
}
