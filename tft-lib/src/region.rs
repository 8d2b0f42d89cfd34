//! Routing values of the TFT API.
//!
//! Platform endpoints (league, summoner) are served per [`Region`], match
//! endpoints per [`RegionGroup`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, VariantNames};

/// Queue id of ranked TFT
pub const TFT_QUEUE_ID: u32 = 1100;

/// A platform routing value, e.g. `NA1` or `KR`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    /// Brazil
    Br1,
    /// Europe Nordic & East
    Eun1,
    /// Europe West
    Euw1,
    /// Japan
    Jp1,
    /// Korea
    Kr,
    /// Latin America North
    La1,
    /// Latin America South
    La2,
    /// North America
    Na1,
    /// Oceania
    Oc1,
    /// Turkey
    Tr1,
    /// Russia
    Ru,
    /// Public Beta Environment
    Pbe1,
    /// Vietnam
    Vn2,
}

impl Region {
    /// The regional routing group serving this platform's matches
    #[must_use]
    pub const fn group(self) -> RegionGroup {
        match self {
            Self::Br1 | Self::La1 | Self::La2 | Self::Na1 | Self::Pbe1 => RegionGroup::Americas,
            Self::Eun1 | Self::Euw1 | Self::Tr1 | Self::Ru => RegionGroup::Europe,
            Self::Jp1 | Self::Kr => RegionGroup::Asia,
            Self::Oc1 | Self::Vn2 => RegionGroup::Sea,
        }
    }

    /// Host of the platform endpoints, e.g. `https://kr.api.riotgames.com`
    #[must_use]
    pub fn host(self) -> String {
        format!(
            "https://{}.api.riotgames.com",
            self.to_string().to_lowercase()
        )
    }
}

/// A regional routing value, used by match endpoints
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RegionGroup {
    /// North and South America
    Americas,
    /// Europe, Turkey and Russia
    Europe,
    /// Japan and Korea
    Asia,
    /// Oceania and South East Asia
    Sea,
}

impl RegionGroup {
    /// Host of the regional endpoints, e.g. `https://asia.api.riotgames.com`
    #[must_use]
    pub fn host(self) -> String {
        format!("https://{self}.api.riotgames.com")
    }
}

/// A ranked tier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Tier {
    Challenger,
    Grandmaster,
    Master,
    Diamond,
    Emerald,
    Platinum,
    Gold,
    Silver,
    Bronze,
    Iron,
}

/// A tier below Master, the only ones split into divisions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum LowerTier {
    Diamond,
    Emerald,
    Platinum,
    Gold,
    Silver,
    Bronze,
    Iron,
}

impl Tier {
    /// Whether the whole tier is a single ladder without divisions
    #[must_use]
    pub const fn is_apex(self) -> bool {
        matches!(self, Self::Challenger | Self::Grandmaster | Self::Master)
    }

    /// The same tier as a [`LowerTier`], `None` for apex tiers
    #[must_use]
    pub const fn lower(self) -> Option<LowerTier> {
        Some(match self {
            Self::Challenger | Self::Grandmaster | Self::Master => return None,
            Self::Diamond => LowerTier::Diamond,
            Self::Emerald => LowerTier::Emerald,
            Self::Platinum => LowerTier::Platinum,
            Self::Gold => LowerTier::Gold,
            Self::Silver => LowerTier::Silver,
            Self::Bronze => LowerTier::Bronze,
            Self::Iron => LowerTier::Iron,
        })
    }
}

impl From<LowerTier> for Tier {
    fn from(tier: LowerTier) -> Self {
        match tier {
            LowerTier::Diamond => Self::Diamond,
            LowerTier::Emerald => Self::Emerald,
            LowerTier::Platinum => Self::Platinum,
            LowerTier::Gold => Self::Gold,
            LowerTier::Silver => Self::Silver,
            LowerTier::Bronze => Self::Bronze,
            LowerTier::Iron => Self::Iron,
        }
    }
}

/// A division within a [`LowerTier`]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case(Region::Br1, RegionGroup::Americas)]
    #[case(Region::Na1, RegionGroup::Americas)]
    #[case(Region::Pbe1, RegionGroup::Americas)]
    #[case(Region::Euw1, RegionGroup::Europe)]
    #[case(Region::Tr1, RegionGroup::Europe)]
    #[case(Region::Ru, RegionGroup::Europe)]
    #[case(Region::Kr, RegionGroup::Asia)]
    #[case(Region::Jp1, RegionGroup::Asia)]
    #[case(Region::Oc1, RegionGroup::Sea)]
    #[case(Region::Vn2, RegionGroup::Sea)]
    fn test_region_group(#[case] region: Region, #[case] group: RegionGroup) {
        assert_eq!(region.group(), group);
    }

    #[test]
    fn test_hosts() {
        assert_eq!(Region::Jp1.host(), "https://jp1.api.riotgames.com");
        assert_eq!(Region::Kr.host(), "https://kr.api.riotgames.com");
        assert_eq!(
            RegionGroup::Americas.host(),
            "https://americas.api.riotgames.com"
        );
    }

    #[test]
    fn test_routing_values() {
        assert_eq!(Region::Eun1.to_string(), "EUN1");
        assert_eq!(Region::from_str("euw1").unwrap(), Region::Euw1);
        assert_eq!(RegionGroup::from_str("SEA").unwrap(), RegionGroup::Sea);
        assert!(Region::from_str("EU").is_err());
        assert_eq!(Region::iter().count(), 13);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(Tier::Grandmaster.to_string(), "GRANDMASTER");
        assert_eq!(LowerTier::from_str("emerald").unwrap(), LowerTier::Emerald);
        assert_eq!(Tier::from(LowerTier::Iron), Tier::Iron);
        assert_eq!(Tier::Gold.lower(), Some(LowerTier::Gold));
        assert_eq!(Tier::Master.lower(), None);
        assert!(Tier::Grandmaster.is_apex());
        assert!(Tier::iter().all(|tier| tier.is_apex() == tier.lower().is_none()));
        assert_eq!(Division::IV.to_string(), "IV");
        assert_eq!(Division::from_str("ii").unwrap(), Division::II);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Region::Na1).unwrap(),
            "\"NA1\""
        );
        assert_eq!(
            serde_json::from_str::<RegionGroup>("\"europe\"").unwrap(),
            RegionGroup::Europe
        );
    }
}
