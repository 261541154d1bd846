use serde::{Deserialize, Serialize};

use crate::game::grid::Spectrum;
use crate::types::{PlayerId, PlayerStatus};

/// Per-participant state owned by a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    username: String,
    status: PlayerStatus,
    // Index of the next pool entry to deal
    piece_index: usize,
    spectrum: Spectrum,
}

/// Public projection of a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub username: String,
    pub status: PlayerStatus,
    pub spectrum: Spectrum,
}

impl Player {
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Player {
            id,
            username: username.into(),
            status: PlayerStatus::Waiting,
            piece_index: 0,
            spectrum: Spectrum::empty(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn piece_index(&self) -> usize {
        self.piece_index
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    pub fn set_status(&mut self, status: PlayerStatus) {
        self.status = status;
    }

    pub fn increment_piece_index(&mut self) {
        self.piece_index += 1;
    }

    /// Last write wins
    pub fn set_spectrum(&mut self, spectrum: Spectrum) {
        self.spectrum = spectrum;
    }

    pub fn reset(&mut self) {
        self.piece_index = 0;
        self.status = PlayerStatus::Waiting;
        self.spectrum = Spectrum::empty();
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id.clone(),
            username: self.username.clone(),
            status: self.status,
            spectrum: self.spectrum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_returns_to_fresh_state() {
        let mut player = Player::new(PlayerId::from_name("p1").unwrap(), "alice");
        player.set_status(PlayerStatus::Ko);
        player.increment_piece_index();
        player.increment_piece_index();
        player.set_spectrum(Spectrum::new(vec![3; 10]).unwrap());
        assert_eq!(player.piece_index(), 2);

        player.reset();
        assert_eq!(player.piece_index(), 0);
        assert_eq!(player.status(), PlayerStatus::Waiting);
        assert_eq!(player.spectrum(), &Spectrum::empty());
        assert_eq!(player.username(), "alice");
    }

    #[test]
    fn test_spectrum_last_write_wins() {
        let mut player = Player::new(PlayerId::generate(), "bob");
        player.set_spectrum(Spectrum::new(vec![5; 10]).unwrap());
        player.set_spectrum(Spectrum::new(vec![7; 10]).unwrap());
        assert_eq!(player.info().spectrum[0], 7);
    }
}
