//! Parsed profile → normalized player record
//!
//! Pure functions: derived fields are computed here (K/D ratio, rank
//! ceiling), identifiers are canonicalized, and equipped lists are capped to
//! what the player actually owns.

use chrono::Utc;
use tracing::warn;

use crate::models::{
    Equipment, EquipmentCategory, ItemId, NO_GROUP, ParsedEquipment, ParsedProfile, PlayerRecord,
    Rank,
};

/// Kills per death rounded to two decimals; zero deaths count as one
pub fn compute_kd_ratio(kills: u64, deaths: u64) -> f64 {
    let ratio = kills as f64 / deaths.max(1) as f64;
    (ratio * 100.0).round() / 100.0
}

/// Build the immutable record handed to callers
pub fn normalize(parsed: ParsedProfile) -> PlayerRecord {
    let experience = parsed.experience.unwrap_or_default();
    let (rank, max_experience) =
        resolve_rank(&parsed.username, parsed.rank.as_deref(), experience, parsed.max_experience);

    let kd_ratio = parsed
        .kd_ratio
        .unwrap_or_else(|| compute_kd_ratio(parsed.kills, parsed.deaths));

    let equipment = normalize_equipment(&parsed.username, &parsed.equipment);

    PlayerRecord {
        username: parsed.username,
        clan: parsed.clan.filter(|c| !c.trim().is_empty()),
        is_online: parsed.is_online,
        rank,
        experience,
        max_experience,
        premium: parsed.premium,
        kills: parsed.kills,
        deaths: parsed.deaths,
        kd_ratio,
        gold_boxes: parsed.gold_boxes,
        group: normalize_group(parsed.group),
        equipment,
        fetched_at: Utc::now(),
    }
}

fn normalize_group(group: Option<String>) -> String {
    match group {
        Some(group) if !group.trim().is_empty() && !group.trim().eq_ignore_ascii_case("unknown") => {
            group.trim().to_string()
        }
        _ => NO_GROUP.to_string(),
    }
}

/// Canonical rank name and next-rank threshold
fn resolve_rank(
    username: &str,
    raw: Option<&str>,
    experience: u64,
    page_max: Option<u64>,
) -> (String, Option<u64>) {
    let rank = match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(text) => match Rank::parse(text) {
            Some(rank) => rank,
            None => {
                warn!(username, rank = text, "Unrecognized rank name kept as shown");
                return (text.to_string(), page_max);
            }
        },
        None => Rank::from_experience(experience),
    };

    let max_experience = if rank.is_legend() {
        None
    } else {
        page_max.or_else(|| rank.ceiling())
    };
    (rank.to_string(), max_experience)
}

fn normalize_equipment(username: &str, parsed: &ParsedEquipment) -> Equipment {
    let mut equipment = Equipment::default();

    for category in EquipmentCategory::ALL {
        let owned: Vec<ItemId> = parsed
            .owned(category)
            .iter()
            .filter_map(|item| ItemId::canonicalize(&item.name))
            .collect();

        let marked = parsed
            .owned(category)
            .iter()
            .filter(|item| item.equipped)
            .map(|item| item.name.as_str());
        let listed = parsed.equipped_block(category).iter().map(String::as_str);

        let mut equipped: Vec<ItemId> = Vec::new();
        for name in marked.chain(listed) {
            let Some(id) = ItemId::canonicalize(name) else {
                continue;
            };
            if !owned.contains(&id) {
                warn!(
                    username,
                    %category,
                    item = %id,
                    "Equipped item missing from owned list, dropping"
                );
                continue;
            }
            if !equipped.contains(&id) {
                equipped.push(id);
            }
        }

        match category {
            EquipmentCategory::Turret => {
                equipment.turrets = owned;
                equipment.equipped_turrets = equipped;
            }
            EquipmentCategory::Hull => {
                equipment.hulls = owned;
                equipment.equipped_hulls = equipped;
            }
            EquipmentCategory::Protection => {
                equipment.protections = owned;
                equipment.equipped_protections = equipped;
            }
        }
    }

    equipment
}
