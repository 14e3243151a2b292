//! Domain models for player statistics

pub mod equipment;
pub mod player;
pub mod rank;

pub use equipment::{Equipment, EquipmentCategory, ItemId};
pub use player::{NO_GROUP, ParsedEquipment, ParsedItem, ParsedProfile, PlayerRecord};
pub use rank::Rank;
