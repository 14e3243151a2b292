//! Rank vocabulary
//!
//! Ranks form a closed, ordered ladder. Every regular rank has an experience
//! ceiling (the threshold of the next rank); Legend ranks are open ended and
//! carry an optional level instead.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A regular rank and the experience required to reach it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankTier {
    pub name: &'static str,
    pub min_experience: u64,
}

/// Regular ranks in ascending order
pub static RANK_TIERS: &[RankTier] = &[
    RankTier { name: "Recruit", min_experience: 0 },
    RankTier { name: "Private", min_experience: 100 },
    RankTier { name: "Gefreiter", min_experience: 500 },
    RankTier { name: "Corporal", min_experience: 1_500 },
    RankTier { name: "Master Corporal", min_experience: 3_700 },
    RankTier { name: "Sergeant", min_experience: 7_100 },
    RankTier { name: "Staff Sergeant", min_experience: 12_300 },
    RankTier { name: "Master Sergeant", min_experience: 20_000 },
    RankTier { name: "First Sergeant", min_experience: 29_000 },
    RankTier { name: "Sergeant-Major", min_experience: 41_000 },
    RankTier { name: "Warrant Officer 1", min_experience: 57_000 },
    RankTier { name: "Warrant Officer 2", min_experience: 76_000 },
    RankTier { name: "Warrant Officer 3", min_experience: 98_000 },
    RankTier { name: "Warrant Officer 4", min_experience: 125_000 },
    RankTier { name: "Warrant Officer 5", min_experience: 156_000 },
    RankTier { name: "Third Lieutenant", min_experience: 192_000 },
    RankTier { name: "Second Lieutenant", min_experience: 233_000 },
    RankTier { name: "First Lieutenant", min_experience: 280_000 },
    RankTier { name: "Captain", min_experience: 332_000 },
    RankTier { name: "Major", min_experience: 390_000 },
    RankTier { name: "Lieutenant Colonel", min_experience: 455_000 },
    RankTier { name: "Colonel", min_experience: 527_000 },
    RankTier { name: "Brigadier", min_experience: 606_000 },
    RankTier { name: "Major General", min_experience: 692_000 },
    RankTier { name: "Lieutenant General", min_experience: 785_000 },
    RankTier { name: "General", min_experience: 885_000 },
    RankTier { name: "Marshal", min_experience: 991_000 },
    RankTier { name: "Field Marshal", min_experience: 1_122_000 },
    RankTier { name: "Commander", min_experience: 1_255_000 },
    RankTier { name: "Generalissimo", min_experience: 1_400_000 },
];

/// Experience at which players leave the regular ladder
pub const LEGEND_MIN_EXPERIENCE: u64 = 1_600_000;

const LEGEND_NAME: &str = "Legend";

/// A position on the rank ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Rank {
    /// Index into [`RANK_TIERS`]
    Tier { index: usize },
    Legend { level: Option<u32> },
}

impl Rank {
    /// Match a rank name from the site, ignoring case, spacing and hyphens
    pub fn parse(raw: &str) -> Option<Self> {
        let key = rank_key(raw);
        if key.is_empty() {
            return None;
        }

        if let Some(rest) = key.strip_prefix("legend") {
            let rest = rest.trim();
            if rest.is_empty() {
                return Some(Self::Legend { level: None });
            }
            return rest
                .parse::<u32>()
                .ok()
                .map(|level| Self::Legend { level: Some(level) });
        }

        RANK_TIERS
            .iter()
            .position(|tier| rank_key(tier.name) == key)
            .map(|index| Self::Tier { index })
    }

    /// The rank a player with this much experience holds
    pub fn from_experience(experience: u64) -> Self {
        if experience >= LEGEND_MIN_EXPERIENCE {
            return Self::Legend { level: None };
        }
        let index = RANK_TIERS
            .iter()
            .rposition(|tier| experience >= tier.min_experience)
            .unwrap_or(0);
        Self::Tier { index }
    }

    /// Experience needed for the next rank; `None` for Legend ranks
    pub fn ceiling(&self) -> Option<u64> {
        match self {
            Self::Tier { index } => Some(
                RANK_TIERS
                    .get(index + 1)
                    .map(|next| next.min_experience)
                    .unwrap_or(LEGEND_MIN_EXPERIENCE),
            ),
            Self::Legend { .. } => None,
        }
    }

    /// Position on the ladder; all Legend ranks sit above every regular tier
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Tier { index } => *index,
            Self::Legend { .. } => RANK_TIERS.len(),
        }
    }

    pub fn is_legend(&self) -> bool {
        matches!(self, Self::Legend { .. })
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Legend { level: a }, Self::Legend { level: b }) => {
                a.unwrap_or(0).cmp(&b.unwrap_or(0))
            }
            _ => self.ordinal().cmp(&other.ordinal()),
        }
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tier { index } => {
                let name = RANK_TIERS.get(*index).map(|t| t.name).unwrap_or("Unknown");
                f.write_str(name)
            }
            Self::Legend { level: Some(level) } => write!(f, "{LEGEND_NAME} {level}"),
            Self::Legend { level: None } => f.write_str(LEGEND_NAME),
        }
    }
}

fn rank_key(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
