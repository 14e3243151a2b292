//! Equipment identifiers and the static equipment catalog
//!
//! Item names on the ratings site are free text ("Smoky M3", "smoky  m3",
//! "Smoky Mk3"). They are canonicalized into [`ItemId`] tokens (`smoky_m3`)
//! which are the keys presentation layers use for display names and
//! translations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical equipment token, e.g. `smoky_m3` or `rail_protection_m1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Canonicalize a source item name; `None` when nothing usable remains
    pub fn canonicalize(raw: &str) -> Option<Self> {
        let mut parts: Vec<String> = raw
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .map(|part| part.to_lowercase())
            .collect();

        // "M 3" / "Mk 3" written with a space
        if parts.len() >= 2 {
            let last = &parts[parts.len() - 1];
            let prev = &parts[parts.len() - 2];
            if last.chars().all(|c| c.is_ascii_digit()) && is_modification_prefix(prev) {
                let merged = format!("m{last}");
                parts.truncate(parts.len() - 2);
                parts.push(merged);
            }
        }

        if let Some(last) = parts.last_mut()
            && let Some(level) = modification_level(last)
        {
            *last = format!("m{level}");
        }

        if parts.is_empty() {
            None
        } else {
            Some(Self(parts.join("_")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base item without the modification suffix (`smoky_m3` -> `smoky`)
    pub fn base(&self) -> &str {
        match self.0.rsplit_once('_') {
            Some((base, suffix)) if modification_level(suffix).is_some() => base,
            _ => &self.0,
        }
    }

    /// Modification level, if the item carries one
    pub fn modification(&self) -> Option<u8> {
        self.0
            .rsplit_once('_')
            .and_then(|(_, suffix)| modification_level(suffix))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_modification_prefix(token: &str) -> bool {
    matches!(token, "m" | "mk" | "м" | "мк")
}

fn modification_level(token: &str) -> Option<u8> {
    let digits = ["mk", "мк", "m", "м"]
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))?;
    let digits = digits.trim_start_matches('.');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Equipment slot category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCategory {
    Turret,
    Hull,
    Protection,
}

impl EquipmentCategory {
    pub const ALL: [EquipmentCategory; 3] = [Self::Turret, Self::Hull, Self::Protection];

    /// Match the category label used on the site (`turrets`, `Hulls`, `protection`...)
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "turret" | "turrets" | "guns" | "пушки" | "башни" => Some(Self::Turret),
            "hull" | "hulls" | "корпуса" | "корпус" => Some(Self::Hull),
            "protection" | "protections" | "resistance" | "resistances" | "modules"
            | "защита" | "модули" => Some(Self::Protection),
            _ => None,
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turret => f.write_str("turret"),
            Self::Hull => f.write_str("hull"),
            Self::Protection => f.write_str("protection"),
        }
    }
}

/// Owned and equipped items per slot
///
/// `equipped_*` lists are subsets of the owned lists; the first equipped item
/// of a slot is the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub turrets: Vec<ItemId>,
    pub hulls: Vec<ItemId>,
    pub protections: Vec<ItemId>,
    pub equipped_turrets: Vec<ItemId>,
    pub equipped_hulls: Vec<ItemId>,
    pub equipped_protections: Vec<ItemId>,
}

impl Equipment {
    pub fn owned(&self, category: EquipmentCategory) -> &[ItemId] {
        match category {
            EquipmentCategory::Turret => &self.turrets,
            EquipmentCategory::Hull => &self.hulls,
            EquipmentCategory::Protection => &self.protections,
        }
    }

    pub fn equipped(&self, category: EquipmentCategory) -> &[ItemId] {
        match category {
            EquipmentCategory::Turret => &self.equipped_turrets,
            EquipmentCategory::Hull => &self.equipped_hulls,
            EquipmentCategory::Protection => &self.equipped_protections,
        }
    }

    /// The item currently in use for a slot
    pub fn active(&self, category: EquipmentCategory) -> Option<&ItemId> {
        self.equipped(category).first()
    }

    pub fn is_empty(&self) -> bool {
        EquipmentCategory::ALL
            .iter()
            .all(|c| self.owned(*c).is_empty() && self.equipped(*c).is_empty())
    }
}

/// Static catalog of known equipment, keyed by canonical base id
pub mod catalog {
    use super::{EquipmentCategory, ItemId};

    pub struct CatalogEntry {
        pub base: &'static str,
        pub display: &'static str,
        pub category: EquipmentCategory,
    }

    const fn entry(
        base: &'static str,
        display: &'static str,
        category: EquipmentCategory,
    ) -> CatalogEntry {
        CatalogEntry {
            base,
            display,
            category,
        }
    }

    use EquipmentCategory::{Hull, Protection, Turret};

    pub static ENTRIES: &[CatalogEntry] = &[
        entry("smoky", "Smoky", Turret),
        entry("rail", "Rail", Turret),
        entry("ricochet", "Ricochet", Turret),
        entry("isida", "Isida", Turret),
        entry("freeze", "Freeze", Turret),
        entry("flamethrower", "Flamethrower", Turret),
        entry("thunder", "Thunder", Turret),
        entry("hammer", "Hammer", Turret),
        entry("vulcan", "Vulcan", Turret),
        entry("twins", "Twins", Turret),
        entry("shaft", "Shaft", Turret),
        entry("striker", "Striker", Turret),
        entry("hunter", "Hunter", Hull),
        entry("mammoth", "Mammoth", Hull),
        entry("titan", "Titan", Hull),
        entry("wasp", "Wasp", Hull),
        entry("viking", "Viking", Hull),
        entry("hornet", "Hornet", Hull),
        entry("dictator", "Dictator", Hull),
        entry("badger", "Badger", Protection),
        entry("spider", "Spider", Protection),
        entry("falcon", "Falcon", Protection),
        entry("bear", "Bear", Protection),
        entry("wolf", "Wolf", Protection),
        entry("eagle", "Eagle", Protection),
        entry("tiger", "Tiger", Protection),
        entry("shark", "Shark", Protection),
        entry("lion", "Lion", Protection),
        entry("snake", "Snake", Protection),
        entry("hawk", "Hawk", Protection),
        entry("panther", "Panther", Protection),
        entry("dolphin", "Dolphin", Protection),
        entry("ocelot", "Ocelot", Protection),
        entry("leopard", "Leopard", Protection),
        entry("rhino", "Rhino", Protection),
        entry("gorilla", "Gorilla", Protection),
        entry("cheetah", "Cheetah", Protection),
    ];

    const PROTECTION_SUFFIX: &str = "_protection";

    fn lookup(base: &str) -> Option<&'static CatalogEntry> {
        ENTRIES.iter().find(|e| e.base == base)
    }

    /// Category of a known item
    pub fn category(id: &ItemId) -> Option<EquipmentCategory> {
        let base = id.base();
        if let Some(turret) = base.strip_suffix(PROTECTION_SUFFIX) {
            return lookup(turret)
                .filter(|e| e.category == Turret)
                .map(|_| Protection);
        }
        lookup(base).map(|e| e.category)
    }

    /// English display name ("Smoky M3", "Rail Protection M1"); `None` for unknown items
    pub fn display_name(id: &ItemId) -> Option<String> {
        let base = id.base();
        let name = match base.strip_suffix(PROTECTION_SUFFIX) {
            Some(turret) => format!("{} Protection", lookup(turret)?.display),
            None => lookup(base)?.display.to_string(),
        };
        Some(match id.modification() {
            Some(level) => format!("{name} M{level}"),
            None => name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Smoky M0", "smoky_m0")]
    #[case("smoky  m0", "smoky_m0")]
    #[case("SMOKY-M0", "smoky_m0")]
    #[case(" Smoky Mk0 ", "smoky_m0")]
    #[case("Smoky M 0", "smoky_m0")]
    #[case("Smoky М0", "smoky_m0")]
    #[case("Rail Protection M2", "rail_protection_m2")]
    #[case("Mammoth M3", "mammoth_m3")]
    #[case("Badger", "badger")]
    fn test_canonicalize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ItemId::canonicalize(raw).unwrap().as_str(), expected);
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(ItemId::canonicalize("   ").is_none());
        assert!(ItemId::canonicalize("--").is_none());
    }

    #[test]
    fn test_base_and_modification() {
        let id = ItemId::canonicalize("Mammoth M3").unwrap();
        assert_eq!(id.base(), "mammoth");
        assert_eq!(id.modification(), Some(3));

        let id = ItemId::canonicalize("Badger").unwrap();
        assert_eq!(id.base(), "badger");
        assert_eq!(id.modification(), None);
    }

    #[test]
    fn test_catalog_lookup() {
        let id = ItemId::canonicalize("smoky m3").unwrap();
        assert_eq!(catalog::display_name(&id).as_deref(), Some("Smoky M3"));
        assert_eq!(catalog::category(&id), Some(EquipmentCategory::Turret));

        let id = ItemId::canonicalize("rail protection m1").unwrap();
        assert_eq!(catalog::display_name(&id).as_deref(), Some("Rail Protection M1"));
        assert_eq!(catalog::category(&id), Some(EquipmentCategory::Protection));

        let id = ItemId::canonicalize("Wasp M1").unwrap();
        assert_eq!(catalog::category(&id), Some(EquipmentCategory::Hull));

        let id = ItemId::canonicalize("Laser Cannon M1").unwrap();
        assert_eq!(catalog::display_name(&id), None);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(EquipmentCategory::from_label("Turrets"), Some(EquipmentCategory::Turret));
        assert_eq!(EquipmentCategory::from_label("hulls"), Some(EquipmentCategory::Hull));
        assert_eq!(
            EquipmentCategory::from_label("Resistances"),
            Some(EquipmentCategory::Protection)
        );
        assert_eq!(EquipmentCategory::from_label("paints"), None);
    }

    #[test]
    fn test_active_item_is_first_equipped() {
        let smoky = ItemId::canonicalize("Smoky M1").unwrap();
        let rail = ItemId::canonicalize("Rail M1").unwrap();
        let equipment = Equipment {
            turrets: vec![smoky.clone(), rail.clone()],
            equipped_turrets: vec![rail.clone(), smoky.clone()],
            ..Default::default()
        };
        assert_eq!(equipment.active(EquipmentCategory::Turret), Some(&rail));
        assert_eq!(equipment.active(EquipmentCategory::Hull), None);
        assert!(!equipment.is_empty());
        assert!(Equipment::default().is_empty());
    }
}
