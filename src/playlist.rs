use std::path::{Path, PathBuf};

use tracing::debug;

/// Ordered images shown one after another. Each pass through the list is a
/// round; the round number is what gets stamped on the display.
#[derive(Debug, Clone)]
pub struct Playlist {
    images: Vec<PathBuf>,
    position: usize,
    round: u32,
}

impl Playlist {
    pub fn new(images: Vec<PathBuf>) -> Self {
        Playlist {
            images,
            position: 0,
            round: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    /// Image at the current position, if the list has any
    pub fn current(&self) -> Option<&Path> {
        self.images.get(self.position).map(PathBuf::as_path)
    }

    /// Step to the next image, starting a new round when the list wraps
    pub fn advance(&mut self) -> Option<&Path> {
        if self.images.is_empty() {
            return None;
        }
        self.position = (self.position + 1) % self.images.len();
        if self.position == 0 {
            self.round = self.round.saturating_add(1);
            debug!("Starting round {}", self.round);
        }
        self.current()
    }
}
