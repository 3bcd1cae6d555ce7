//! harmonia-services: Playback thread, sound engines and persistence

pub mod json_store;
pub mod player;
pub mod sound;

pub use json_store::{JsonProgressionStore, StoreError};
pub use player::{Player, PlayerError, PlayerStatus};
pub use sound::{ChannelSoundEngine, SoundEvent, TracingSoundEngine};
