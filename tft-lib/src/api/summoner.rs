use crate::Client;
use crate::Result;
use crate::api::types::SummonerDto;
use crate::ratelimit::SUMMONER_BUCKET;
use crate::region::Region;

/// `tft-summoner-v1`
#[derive(Debug, Clone, Copy)]
pub struct SummonerApi<'a> {
    client: &'a Client,
}

impl<'a> SummonerApi<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Look up a summoner by PUUID
    ///
    /// # Errors
    ///
    /// Fails if the request fails, see [`Client::execute_request`].
    pub async fn by_puuid(&self, region: Region, puuid: &str) -> Result<SummonerDto> {
        let url = self.client.platform_url(
            region,
            &["tft", "summoner", "v1", "summoners", "by-puuid", puuid],
        )?;
        self.client.execute_request(SUMMONER_BUCKET, url).await
    }
}
