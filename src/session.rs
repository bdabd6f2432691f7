//! Play session: loads persisted data at start, saves the leaderboard at the end
//!
//! The simulation never touches storage itself; this wrapper owns the port
//! and the data read from it.

use crate::consts::TICK_MS;
use crate::highscores::HighScores;
use crate::persistence::{PlayerProfile, Storage};
use crate::settings::Settings;
use crate::sim::progression::{self, UpgradeId};
use crate::sim::{GameState, TickInput, tick};

pub struct Session<S: Storage> {
    storage: S,
    settings: Settings,
    profile: PlayerProfile,
    leaderboard: HighScores,
    state: GameState,
    /// Set once the final score has been written: the rank it placed at, if any
    recorded: Option<Option<usize>>,
}

impl<S: Storage> Session<S> {
    /// Start a run with the settings stored in `storage`
    pub fn start(storage: S, seed: u64) -> Self {
        let settings = Settings::load(&storage);
        Self::start_with(storage, seed, settings)
    }

    /// Start a run with explicit settings (e.g. command-line overrides)
    pub fn start_with(storage: S, seed: u64, settings: Settings) -> Self {
        let profile = PlayerProfile::load(&storage);
        let leaderboard = HighScores::load(&storage);
        let mut state = GameState::new(seed, &settings);
        let applied = progression::apply_cards(&mut state, profile.owned_equipped_cards());
        log::info!(
            "Session started (seed {seed}, {}, {applied} cards applied)",
            settings.difficulty.as_str()
        );
        Self {
            storage,
            settings,
            profile,
            leaderboard,
            state,
            recorded: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn leaderboard(&self) -> &HighScores {
        &self.leaderboard
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.is_paused = paused;
    }

    /// Run one tick; returns false once the run is over
    pub fn advance(&mut self, input: &TickInput) -> bool {
        if self.state.is_game_over {
            return false;
        }
        let now = self.state.time_ms + TICK_MS;
        tick(&mut self.state, input, now);
        if self.state.is_game_over {
            self.finish();
            return false;
        }
        true
    }

    pub fn choose_upgrade(&mut self, index: usize) -> Option<UpgradeId> {
        progression::choose_upgrade(&mut self.state, index)
    }

    /// Record the final score once; returns the leaderboard rank if it placed
    pub fn finish(&mut self) -> Option<usize> {
        if let Some(rank) = self.recorded {
            return rank;
        }
        let rank = self.leaderboard.add_score(
            &self.settings.player_name,
            self.state.score,
            self.state.wave.wave,
        );
        if let Err(err) = self.leaderboard.save(&mut self.storage) {
            log::error!("Failed to save leaderboard: {err}");
        }
        match rank {
            Some(rank) => log::info!("Score {} placed #{rank}", self.state.score),
            None => log::info!("Score {} did not place", self.state.score),
        }
        self.recorded = Some(rank);
        rank
    }
}
