use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{Result, bail};
use log::info;
use serde::Serialize;
use tft_lib::Client;
use tft_lib::api::MatchListOptions;
use tft_lib::region::Tier;

use crate::options::Command;

/// Run `command` and print its result as JSON to stdout
pub(crate) async fn execute(command: &Command, client: &Client) -> Result<()> {
    match command {
        Command::Summoner { region, puuid } => {
            print_json(&client.summoner().by_puuid(*region, puuid).await?)
        }
        Command::Matches {
            group,
            puuid,
            count,
            start,
            start_time,
            end_time,
        } => {
            let options = MatchListOptions {
                count: *count,
                start_time: *start_time,
                end_time: *end_time,
                start: *start,
            };
            print_json(&client.matches().ids(*group, puuid, &options).await?)
        }
        Command::Match { group, match_ids } => {
            info!("Fetching {} matches", match_ids.len());
            let matches: BTreeMap<_, _> = client
                .matches()
                .batch_get(*group, match_ids)
                .await?
                .into_iter()
                .collect();
            print_json(&matches)
        }
        Command::League {
            region,
            tier,
            division,
            page,
        } => {
            let league = client.league();
            let Some(lower) = tier.lower() else {
                if division.is_some() || page.is_some() {
                    bail!("{tier} is a single ladder without divisions or pages");
                }
                let list = match tier {
                    Tier::Challenger => league.challenger(*region).await?,
                    Tier::Grandmaster => league.grandmaster(*region).await?,
                    _ => league.master(*region).await?,
                };
                return print_json(&list);
            };
            let Some(division) = division else {
                bail!("{tier} needs a division, one of I, II, III or IV");
            };
            print_json(&league.entries(*region, lower, *division, *page).await?)
        }
        Command::Buckets => print_json(&client.statuses()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(())
}
