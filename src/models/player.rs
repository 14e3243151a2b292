use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::equipment::{Equipment, EquipmentCategory};

/// Group value used when the profile page does not name one
pub const NO_GROUP: &str = "No Group";

/// Normalized player statistics, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display form as shown by the site; lookups are case-insensitive
    pub username: String,
    pub clan: Option<String>,
    pub is_online: bool,
    pub rank: String,
    pub experience: u64,
    /// Experience needed for the next rank; absent for Legend ranks
    pub max_experience: Option<u64>,
    pub premium: bool,
    pub kills: u64,
    pub deaths: u64,
    pub kd_ratio: f64,
    pub gold_boxes: u64,
    pub group: String,
    pub equipment: Equipment,
    pub fetched_at: DateTime<Utc>,
}

impl PlayerRecord {
    /// Cache key for this record (lowercased username)
    pub fn key(&self) -> String {
        self.username.to_lowercase()
    }

    /// "Name [Clan]" as shown in chat titles
    pub fn display_title(&self) -> String {
        match &self.clan {
            Some(clan) => format!("{} [{}]", self.username, clan),
            None => self.username.clone(),
        }
    }

    pub fn has_group(&self) -> bool {
        self.group != NO_GROUP
    }
}

/// One equipment entry as read from the page, before canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub name: String,
    pub equipped: bool,
}

/// Equipment lists as they appear on the page, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEquipment {
    pub turrets: Vec<ParsedItem>,
    pub hulls: Vec<ParsedItem>,
    pub protections: Vec<ParsedItem>,
    /// Items listed in a dedicated "equipped" block, per category
    pub equipped_turrets: Vec<String>,
    pub equipped_hulls: Vec<String>,
    pub equipped_protections: Vec<String>,
}

impl ParsedEquipment {
    pub fn owned_mut(&mut self, category: EquipmentCategory) -> &mut Vec<ParsedItem> {
        match category {
            EquipmentCategory::Turret => &mut self.turrets,
            EquipmentCategory::Hull => &mut self.hulls,
            EquipmentCategory::Protection => &mut self.protections,
        }
    }

    pub fn equipped_block_mut(&mut self, category: EquipmentCategory) -> &mut Vec<String> {
        match category {
            EquipmentCategory::Turret => &mut self.equipped_turrets,
            EquipmentCategory::Hull => &mut self.equipped_hulls,
            EquipmentCategory::Protection => &mut self.equipped_protections,
        }
    }

    pub fn owned(&self, category: EquipmentCategory) -> &[ParsedItem] {
        match category {
            EquipmentCategory::Turret => &self.turrets,
            EquipmentCategory::Hull => &self.hulls,
            EquipmentCategory::Protection => &self.protections,
        }
    }

    pub fn equipped_block(&self, category: EquipmentCategory) -> &[String] {
        match category {
            EquipmentCategory::Turret => &self.equipped_turrets,
            EquipmentCategory::Hull => &self.equipped_hulls,
            EquipmentCategory::Protection => &self.equipped_protections,
        }
    }
}

/// Raw fields extracted from a profile page
///
/// Everything except the username is optional on the page; defaults are
/// applied here or by the normalizer, never by failing the parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProfile {
    pub username: String,
    pub clan: Option<String>,
    pub is_online: bool,
    pub rank: Option<String>,
    pub experience: Option<u64>,
    pub max_experience: Option<u64>,
    pub premium: bool,
    pub kills: u64,
    pub deaths: u64,
    pub kd_ratio: Option<f64>,
    pub gold_boxes: u64,
    pub group: Option<String>,
    pub equipment: ParsedEquipment,
}
