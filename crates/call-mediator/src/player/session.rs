//! Player state machine states (§4.3).

/// State of the file-player sub-machine, nested inside a connected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    WaitPlayResp,
    WaitPlayStart,
    Playing,
    PlayingAlreadyStopped,
    CanceledInP,
}

/// Tracks the player's state and the `req_id` of whichever play/stop
/// request is currently in flight (`0` when none is).
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub state: PlayerState,
    pub req_id: u32,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self {
            state: PlayerState::Idle,
            req_id: 0,
        }
    }
}
