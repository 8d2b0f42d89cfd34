use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Client;
use crate::Result;
use crate::api::types::MatchDto;
use crate::ratelimit::{MATCH_DETAIL_BUCKET, MATCH_LIST_BUCKET};
use crate::region::RegionGroup;

/// Filters for a player's match history.
///
/// Unset fields are left out of the request, so the API defaults apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListOptions {
    /// Number of match ids to return (API default 20, at most 100)
    pub count: Option<u32>,
    /// Only matches after this time, in epoch seconds
    pub start_time: Option<i64>,
    /// Only matches before this time, in epoch seconds
    pub end_time: Option<i64>,
    /// Offset into the history (API default 0)
    pub start: Option<u32>,
}

impl MatchListOptions {
    fn query(&self) -> Vec<(&'static str, String)> {
        [
            ("count", self.count.map(i64::from)),
            ("startTime", self.start_time),
            ("endTime", self.end_time),
            ("start", self.start.map(i64::from)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v.to_string())))
        .collect()
    }

    fn apply(&self, url: &mut Url) {
        let query = self.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
    }
}

/// `tft-match-v1`
#[derive(Debug, Clone, Copy)]
pub struct MatchApi<'a> {
    client: &'a Client,
}

impl<'a> MatchApi<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Match ids of a player, most recent first
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn ids(
        &self,
        group: RegionGroup,
        puuid: &str,
        options: &MatchListOptions,
    ) -> Result<Vec<String>> {
        let url = self.ids_url(group, puuid, options)?;
        self.client.execute_request(MATCH_LIST_BUCKET, url).await
    }

    /// A single match
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn get(&self, group: RegionGroup, match_id: &str) -> Result<MatchDto> {
        let url = self.match_url(group, match_id)?;
        self.client.execute_request(MATCH_DETAIL_BUCKET, url).await
    }

    /// Match ids of several players, keyed by PUUID
    ///
    /// # Errors
    ///
    /// Fails with the first error of any player, see [`Client::execute_batch`].
    pub async fn batch_ids<S: AsRef<str>>(
        &self,
        group: RegionGroup,
        puuids: &[S],
        options: &MatchListOptions,
    ) -> Result<HashMap<String, Vec<String>>> {
        let keys = owned(puuids);
        let ids = self
            .client
            .execute_batch(MATCH_LIST_BUCKET, keys.clone(), |puuid| {
                self.ids_url(group, puuid, options)
            })
            .await?;
        Ok(keys.into_iter().zip(ids).collect())
    }

    /// Several matches, keyed by match id
    ///
    /// # Errors
    ///
    /// Fails with the first error of any match, see [`Client::execute_batch`].
    pub async fn batch_get<S: AsRef<str>>(
        &self,
        group: RegionGroup,
        match_ids: &[S],
    ) -> Result<HashMap<String, MatchDto>> {
        let keys = owned(match_ids);
        let matches = self
            .client
            .execute_batch(MATCH_DETAIL_BUCKET, keys.clone(), |match_id| {
                self.match_url(group, match_id)
            })
            .await?;
        Ok(keys.into_iter().zip(matches).collect())
    }

    fn ids_url(&self, group: RegionGroup, puuid: &str, options: &MatchListOptions) -> Result<Url> {
        let mut url = self.client.regional_url(
            group,
            &["tft", "match", "v1", "matches", "by-puuid", puuid, "ids"],
        )?;
        options.apply(&mut url);
        Ok(url)
    }

    fn match_url(&self, group: RegionGroup, match_id: &str) -> Result<Url> {
        self.client
            .regional_url(group, &["tft", "match", "v1", "matches", match_id])
    }
}

fn owned<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    keys.iter().map(|key| key.as_ref().to_owned()).collect()
}
