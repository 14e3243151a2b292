//! Profile page parser
//!
//! Expected markup (ratings site player page):
//!
//! ```html
//! <div class="player-identity">
//!   <span class="player-name">Alice</span> <span class="player-clan">[Wolves]</span>
//!   <span class="status online">Online</span> <span class="premium-badge"></span>
//! </div>
//! <div class="player-rank"><span class="rank-name">Major</span></div>
//! <div class="experience">84 000 / 100 000</div>
//! <table class="player-stats"><tr><th>Kills</th><td>150</td></tr>...</table>
//! <div class="equipment" data-category="turrets">
//!   <div class="item equipped">Smoky M0</div><div class="item">Rail M1</div>
//! </div>
//! ```

use scraper::{CaseSensitivity, ElementRef, Html};
use tracing::{debug, instrument};

use super::{element_text, first_text, parse_count, parse_ratio, selector};
use crate::errors::{ParseError, ParseResult};
use crate::models::{EquipmentCategory, ParsedItem, ParsedProfile};
use crate::utils::RawResponse;

const EQUIPPED_CLASSES: [&str; 3] = ["equipped", "active", "selected"];

/// Extract the raw profile fields from a fetched player page
#[instrument(skip(response), fields(url = %response.url), level = "debug")]
pub fn parse_profile(response: &RawResponse) -> ParseResult<ParsedProfile> {
    let document = Html::parse_document(&response.body);
    let profile = parse_profile_document(&document)?;
    debug!(
        username = %profile.username,
        turrets = profile.equipment.turrets.len(),
        hulls = profile.equipment.hulls.len(),
        protections = profile.equipment.protections.len(),
        "Parsed profile page"
    );
    Ok(profile)
}

fn parse_profile_document(document: &Html) -> ParseResult<ParsedProfile> {
    let root = document.root_element();

    let identity = root
        .select(&selector("div.player-identity")?)
        .next()
        .ok_or(ParseError::MissingAnchor {
            context: "player identity block (div.player-identity)",
        })?;

    let raw_name = first_text(&identity, &selector(".player-name")?).ok_or(
        ParseError::MissingAnchor {
            context: "player name (.player-name)",
        },
    )?;
    let (username, inline_clan) = split_clan_suffix(&raw_name);
    if username.is_empty() {
        return Err(ParseError::MissingAnchor {
            context: "player name (.player-name)",
        });
    }

    let mut profile = ParsedProfile {
        username,
        clan: first_text(&identity, &selector(".player-clan")?)
            .and_then(|c| clean_clan(&c))
            .or(inline_clan),
        is_online: parse_online_status(&identity)?,
        premium: root.select(&selector(".premium-badge")?).next().is_some(),
        rank: first_text(&root, &selector(".player-rank .rank-name")?),
        ..ParsedProfile::default()
    };

    if let Some(text) = first_text(&root, &selector(".experience")?) {
        apply_experience(&mut profile, &text);
    }

    apply_stats_table(&mut profile, &root)?;
    parse_equipment(&mut profile, &root)?;

    Ok(profile)
}

/// "Name [Clan]" → ("Name", Some("Clan"))
fn split_clan_suffix(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();
    if raw.ends_with(']')
        && let Some(open) = raw.rfind('[')
    {
        let name = raw[..open].trim().to_string();
        let clan = clean_clan(&raw[open..]);
        if !name.is_empty() {
            return (name, clan);
        }
    }
    (raw.to_string(), None)
}

fn clean_clan(raw: &str) -> Option<String> {
    let clan = raw.trim().trim_start_matches('[').trim_end_matches(']').trim();
    (!clan.is_empty()).then(|| clan.to_string())
}

fn parse_online_status(identity: &ElementRef) -> ParseResult<bool> {
    let Some(status) = identity.select(&selector(".status")?).next() else {
        return Ok(false);
    };
    if status
        .value()
        .has_class("online", CaseSensitivity::AsciiCaseInsensitive)
    {
        return Ok(true);
    }
    let text = element_text(&status).to_lowercase();
    Ok(matches!(text.as_str(), "online" | "в сети" | "онлайн"))
}

/// "412 300 / 455 000" → experience and the next-rank threshold
fn apply_experience(profile: &mut ParsedProfile, text: &str) {
    match text.split_once('/') {
        Some((current, max)) => {
            profile.experience = parse_count(current, "experience");
            profile.max_experience = parse_count(max, "max_experience");
        }
        None => profile.experience = parse_count(text, "experience"),
    }
}

fn apply_stats_table(profile: &mut ParsedProfile, root: &ElementRef) -> ParseResult<()> {
    let row_selector = selector("table.player-stats tr")?;
    let label_selector = selector("th")?;
    let value_selector = selector("td")?;

    for row in root.select(&row_selector) {
        let Some(label) = first_text(&row, &label_selector) else {
            continue;
        };
        let Some(value) = first_text(&row, &value_selector) else {
            continue;
        };
        let label = label.trim_end_matches(':').trim().to_lowercase();

        match label.as_str() {
            "kills" | "убийства" => {
                profile.kills = parse_count(&value, "kills").unwrap_or_default();
            }
            "deaths" | "смерти" => {
                profile.deaths = parse_count(&value, "deaths").unwrap_or_default();
            }
            "k/d" | "kd" | "k/d ratio" | "у/с" => {
                profile.kd_ratio = parse_ratio(&value, "kd_ratio");
            }
            "gold boxes" | "gold" | "золотые ящики" | "голды" => {
                profile.gold_boxes = parse_count(&value, "gold_boxes").unwrap_or_default();
            }
            "group" | "группа" => {
                profile.group = Some(value);
            }
            "rank" | "звание" if profile.rank.is_none() => {
                profile.rank = Some(value);
            }
            "experience" | "опыт" if profile.experience.is_none() => {
                apply_experience(profile, &value);
            }
            "premium" | "премиум" => {
                let value = value.to_lowercase();
                profile.premium |= matches!(value.as_str(), "yes" | "true" | "active" | "да");
            }
            _ => {}
        }
    }
    Ok(())
}

fn is_marked_equipped(element: &ElementRef) -> bool {
    let value = element.value();
    EQUIPPED_CLASSES
        .iter()
        .any(|class| value.has_class(class, CaseSensitivity::AsciiCaseInsensitive))
        || value
            .attr("data-equipped")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn item_name(item: &ElementRef, name_selector: &scraper::Selector) -> Option<String> {
    if let Some(name) = item.value().attr("data-item")
        && !name.trim().is_empty()
    {
        return Some(name.trim().to_string());
    }
    first_text(item, name_selector).or_else(|| {
        let text = element_text(item);
        (!text.is_empty()).then_some(text)
    })
}

fn parse_equipment(profile: &mut ParsedProfile, root: &ElementRef) -> ParseResult<()> {
    let block_selector = selector("div.equipment[data-category]")?;
    let item_selector = selector(".item")?;
    let name_selector = selector(".item-name")?;

    for block in root.select(&block_selector) {
        let label = block.value().attr("data-category").unwrap_or_default();
        let Some(category) = EquipmentCategory::from_label(label) else {
            debug!(label, "Skipping equipment block with unknown category");
            continue;
        };
        let equipped_block = is_marked_equipped(&block);

        for item in block.select(&item_selector) {
            let Some(name) = item_name(&item, &name_selector) else {
                continue;
            };
            if equipped_block {
                profile.equipment.equipped_block_mut(category).push(name);
            } else {
                let equipped = is_marked_equipped(&item);
                profile
                    .equipment
                    .owned_mut(category)
                    .push(ParsedItem { name, equipped });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> RawResponse {
        RawResponse::new(
            "https://ratings.ranked-rtanks.online/user/Alice",
            200,
            format!("<html><body>{body}</body></html>"),
        )
    }

    const FULL_PROFILE: &str = r#"
        <div class="player-identity">
          <span class="player-name">Alice</span>
          <span class="player-clan">[Wolves]</span>
          <span class="status online">Online</span>
          <span class="premium-badge">Premium</span>
        </div>
        <div class="player-rank"><img src="/r/14.png"><span class="rank-name">Major</span></div>
        <div class="experience">84&nbsp;000 / 100 000</div>
        <table class="player-stats">
          <tr><th>Kills</th><td>1 150</td></tr>
          <tr><th>Deaths:</th><td>50</td></tr>
          <tr><th>Gold boxes</th><td>3</td></tr>
          <tr><th>Group</th><td>Moderator</td></tr>
        </table>
        <div class="equipment" data-category="turrets">
          <div class="item equipped"><span class="item-name">Smoky M0</span></div>
          <div class="item"><span class="item-name">Rail M1</span></div>
          <div class="item"><span class="item-name">Rail M1</span></div>
        </div>
        <div class="equipment" data-category="hulls">
          <div class="item" data-equipped="true">Hunter M2</div>
        </div>
        <div class="equipment" data-category="protections">
          <div class="item" data-item="Badger M1"></div>
        </div>
        <div class="equipment" data-category="protections" data-equipped="true">
          <div class="item">Badger M1</div>
        </div>
    "#;

    #[test]
    fn test_full_profile() {
        let profile = parse_profile(&page(FULL_PROFILE)).unwrap();
        assert_eq!(profile.username, "Alice");
        assert_eq!(profile.clan.as_deref(), Some("Wolves"));
        assert!(profile.is_online);
        assert!(profile.premium);
        assert_eq!(profile.rank.as_deref(), Some("Major"));
        assert_eq!(profile.experience, Some(84_000));
        assert_eq!(profile.max_experience, Some(100_000));
        assert_eq!(profile.kills, 1150);
        assert_eq!(profile.deaths, 50);
        assert_eq!(profile.kd_ratio, None);
        assert_eq!(profile.gold_boxes, 3);
        assert_eq!(profile.group.as_deref(), Some("Moderator"));

        let turrets: Vec<_> = profile.equipment.turrets.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(turrets, vec!["Smoky M0", "Rail M1", "Rail M1"]);
        assert!(profile.equipment.turrets[0].equipped);
        assert!(!profile.equipment.turrets[1].equipped);
        assert!(profile.equipment.hulls[0].equipped);
        assert_eq!(profile.equipment.protections[0].name, "Badger M1");
        assert_eq!(profile.equipment.equipped_protections, vec!["Badger M1"]);
    }

    #[test]
    fn test_optional_fields_default() {
        let profile = parse_profile(&page(
            r#"<div class="player-identity"><span class="player-name">Bob</span></div>"#,
        ))
        .unwrap();
        assert_eq!(profile.username, "Bob");
        assert_eq!(profile.clan, None);
        assert!(!profile.is_online);
        assert!(!profile.premium);
        assert_eq!(profile.rank, None);
        assert_eq!(profile.experience, None);
        assert_eq!(profile.kills, 0);
        assert!(profile.equipment.turrets.is_empty());
    }

    #[test]
    fn test_inline_clan_and_textual_status() {
        let profile = parse_profile(&page(
            r#"<div class="player-identity">
                 <span class="player-name">Dark Knight [RU]</span>
                 <span class="status">в сети</span>
               </div>
               <table class="player-stats">
                 <tr><th>K/D</th><td>2,50</td></tr>
                 <tr><th>Rank</th><td>Legend 3</td></tr>
               </table>"#,
        ))
        .unwrap();
        assert_eq!(profile.username, "Dark Knight");
        assert_eq!(profile.clan.as_deref(), Some("RU"));
        assert!(profile.is_online);
        assert_eq!(profile.kd_ratio, Some(2.5));
        assert_eq!(profile.rank.as_deref(), Some("Legend 3"));
    }

    #[test]
    fn test_offline_status_class() {
        let profile = parse_profile(&page(
            r#"<div class="player-identity">
                 <span class="player-name">Carol</span>
                 <span class="status offline">Offline</span>
               </div>"#,
        ))
        .unwrap();
        assert!(!profile.is_online);
    }

    #[test]
    fn test_missing_identity_is_parse_error() {
        let err = parse_profile(&page("<div class=\"news\">Maintenance</div>")).unwrap_err();
        assert!(matches!(err, ParseError::MissingAnchor { .. }));
    }

    #[test]
    fn test_empty_name_is_parse_error() {
        let err = parse_profile(&page(
            r#"<div class="player-identity"><span class="player-name">  </span></div>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingAnchor { .. }));
    }

    #[test]
    fn test_negative_values_clamped() {
        let profile = parse_profile(&page(
            r#"<div class="player-identity"><span class="player-name">Eve</span></div>
               <table class="player-stats"><tr><th>Deaths</th><td>-4</td></tr></table>"#,
        ))
        .unwrap();
        assert_eq!(profile.deaths, 0);
    }

    #[test]
    fn test_unknown_equipment_category_skipped() {
        let profile = parse_profile(&page(
            r#"<div class="player-identity"><span class="player-name">Eve</span></div>
               <div class="equipment" data-category="paints"><div class="item">Green</div></div>"#,
        ))
        .unwrap();
        assert!(profile.equipment.turrets.is_empty());
        assert!(profile.equipment.hulls.is_empty());
        assert!(profile.equipment.protections.is_empty());
    }
}
