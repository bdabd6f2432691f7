//! Player profile: card packs, card inventory and equipped cards

use serde::{Deserialize, Serialize};

use super::{PersistenceError, Storage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStack {
    pub card_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub card_packs: u32,
    pub card_inventory: Vec<CardStack>,
    pub equipped_card_ids: Vec<String>,
}

impl Default for PlayerProfile {
    /// A fresh profile: one unopened pack, nothing equipped
    fn default() -> Self {
        Self {
            card_packs: 1,
            card_inventory: Vec::new(),
            equipped_card_ids: Vec::new(),
        }
    }
}

impl PlayerProfile {
    const STORAGE_KEY: &'static str = "profile";

    /// Load the profile; missing or malformed data yields the default profile
    pub fn load(storage: &dyn Storage) -> Self {
        let Some(json) = storage.read(Self::STORAGE_KEY) else {
            log::info!("No profile found, starting fresh");
            return Self::default();
        };
        match serde_json::from_str::<PlayerProfile>(&json) {
            Ok(profile) => {
                log::info!(
                    "Loaded profile ({} cards equipped)",
                    profile.equipped_card_ids.len()
                );
                profile
            }
            Err(err) => {
                log::warn!("Malformed profile ({err}), reinitializing");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        storage.write(Self::STORAGE_KEY, &json)
    }

    /// Equipped ids that are actually owned
    pub fn owned_equipped_cards(&self) -> impl Iterator<Item = &str> {
        self.equipped_card_ids.iter().map(String::as_str).filter(|id| {
            self.card_inventory
                .iter()
                .any(|stack| stack.card_id == *id && stack.count > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_missing_profile_is_default() {
        let storage = MemoryStorage::default();
        assert_eq!(PlayerProfile::load(&storage), PlayerProfile::default());
    }

    #[test]
    fn test_malformed_profile_is_default() {
        let mut storage = MemoryStorage::default();
        storage.write("profile", "{not json").unwrap();
        assert_eq!(PlayerProfile::load(&storage), PlayerProfile::default());
    }

    #[test]
    fn test_only_owned_cards_are_equipped() {
        let profile = PlayerProfile {
            card_packs: 0,
            card_inventory: vec![CardStack {
                card_id: "iron_skin".to_string(),
                count: 1,
            }],
            equipped_card_ids: vec!["iron_skin".to_string(), "ghost_card".to_string()],
        };
        let equipped: Vec<_> = profile.owned_equipped_cards().collect();
        assert_eq!(equipped, vec!["iron_skin"]);
    }
}
