use crate::Client;
use crate::Result;
use crate::api::types::{LeagueEntryDto, LeagueListDto};
use crate::ratelimit::LEAGUE_BUCKET;
use crate::region::{Division, LowerTier, Region};

/// `tft-league-v1`
#[derive(Debug, Clone, Copy)]
pub struct LeagueApi<'a> {
    client: &'a Client,
}

impl<'a> LeagueApi<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// The Challenger league of a platform
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn challenger(&self, region: Region) -> Result<LeagueListDto> {
        self.apex(region, "challenger").await
    }

    /// The Grandmaster league of a platform
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn grandmaster(&self, region: Region) -> Result<LeagueListDto> {
        self.apex(region, "grandmaster").await
    }

    /// The Master league of a platform
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn master(&self, region: Region) -> Result<LeagueListDto> {
        self.apex(region, "master").await
    }

    /// One page of the players in a tier and division.
    ///
    /// Pages start at 1; the first page is requested without a `page`
    /// parameter.
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn entries(
        &self,
        region: Region,
        tier: LowerTier,
        division: Division,
        page: Option<u32>,
    ) -> Result<Vec<LeagueEntryDto>> {
        let tier = tier.to_string();
        let division = division.to_string();
        let mut url = self.client.platform_url(
            region,
            &["tft", "league", "v1", "entries", &tier, &division],
        )?;
        if let Some(page) = page.filter(|page| *page > 1) {
            url.query_pairs_mut()
                .append_pair("page", &page.to_string());
        }
        self.client.execute_request(LEAGUE_BUCKET, url).await
    }

    /// Ranked entries of a player
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn by_puuid(&self, region: Region, puuid: &str) -> Result<Vec<LeagueEntryDto>> {
        let url = self.client.platform_url(
            region,
            &["tft", "league", "v1", "entries", "by-puuid", puuid],
        )?;
        self.client.execute_request(LEAGUE_BUCKET, url).await
    }

    async fn apex(&self, region: Region, tier: &str) -> Result<LeagueListDto> {
        let url = self
            .client
            .platform_url(region, &["tft", "league", "v1", tier])?;
        self.client.execute_request(LEAGUE_BUCKET, url).await
    }
}
