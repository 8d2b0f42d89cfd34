//! Response bodies of the TFT endpoints.
//!
//! Field names follow the API verbatim, which mixes `camelCase` (league,
//! summoner) and `snake_case` (match) depending on the endpoint.

use serde::{Deserialize, Serialize};

/// Response of `/tft/league/v1/{challenger,grandmaster,master}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueListDto {
    pub tier: String,
    pub league_id: String,
    pub queue: String,
    pub name: String,
    pub entries: Vec<LeagueItemDto>,
}

/// One player of a [`LeagueListDto`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueItemDto {
    #[serde(default)]
    pub summoner_id: Option<String>,
    #[serde(default)]
    pub puuid: Option<String>,
    pub league_points: i32,
    pub rank: String,
    pub wins: u32,
    pub losses: u32,
    pub veteran: bool,
    pub inactive: bool,
    pub fresh_blood: bool,
    pub hot_streak: bool,
}

/// Response item of `/tft/league/v1/entries/...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub summoner_id: Option<String>,
    pub puuid: String,
    pub queue_type: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub league_points: Option<i32>,
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub hot_streak: bool,
    #[serde(default)]
    pub veteran: bool,
    #[serde(default)]
    pub fresh_blood: bool,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mini_series: Option<MiniSeriesDto>,
}

/// Promotion series progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniSeriesDto {
    pub losses: u32,
    pub progress: String,
    pub target: u32,
    pub wins: u32,
}

/// Response of `/tft/summoner/v1/summoners/by-puuid/{puuid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    #[serde(default)]
    pub account_id: Option<String>,
    pub profile_icon_id: i64,
    /// Epoch milliseconds of the last profile change
    pub revision_date: i64,
    #[serde(default)]
    pub id: Option<String>,
    pub puuid: String,
    pub summoner_level: i64,
}

/// Response of `/tft/match/v1/matches/{matchId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDto {
    pub metadata: MatchMetadataDto,
    pub info: MatchInfoDto,
}

/// Identifiers of a match and its players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadataDto {
    pub data_version: String,
    pub match_id: String,
    /// PUUIDs of all participants
    pub participants: Vec<String>,
}

/// Course and outcome of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfoDto {
    /// Epoch milliseconds
    pub game_datetime: i64,
    /// Seconds
    pub game_length: f64,
    pub game_version: String,
    pub participants: Vec<MatchParticipantDto>,
    pub queue_id: u32,
    #[serde(default)]
    pub tft_game_type: String,
    #[serde(default)]
    pub tft_set_core_name: String,
    pub tft_set_number: u32,
}

/// One player's board at the end of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchParticipantDto {
    pub puuid: String,
    pub placement: u32,
    pub level: u32,
    pub gold_left: i32,
    pub last_round: u32,
    /// Seconds into the match
    pub time_eliminated: f64,
    pub traits: Vec<MatchTraitDto>,
    pub units: Vec<MatchUnitDto>,
    #[serde(default)]
    pub augments: Vec<String>,
    pub companion: CompanionDto,
}

/// The player's little legend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionDto {
    #[serde(rename = "content_ID")]
    pub content_id: String,
    #[serde(rename = "item_ID")]
    pub item_id: i64,
    #[serde(rename = "skin_ID")]
    pub skin_id: i64,
    pub species: String,
}

/// An active trait on a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTraitDto {
    pub name: String,
    pub num_units: u32,
    pub style: u32,
    pub tier_current: u32,
    pub tier_total: u32,
}

/// A champion on a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUnitDto {
    pub character_id: String,
    #[serde(rename = "itemNames", default)]
    pub item_names: Vec<String>,
    #[serde(default)]
    pub items: Vec<i64>,
    #[serde(default)]
    pub name: String,
    pub rarity: u32,
    pub tier: u32,
}
