/// Events emitted during a simulation tick.
/// The host logs them; tests assert on them.

use crate::domain::entity::CoinId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CoinCollected { coin: CoinId, points: u32, score: u32 },
    PlayerKilled,
    PlayerRespawned,
    LevelCompleted { level: u32, score: u32 },
    LevelLoaded { level: u32 },
    GameOver { final_score: u32 },
}
