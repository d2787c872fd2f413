use anyhow::{Context, Result};
use calgrid_core::CalGridError;
use calgrid_core::config::CalgridConfig;
use calgrid_core::date_range::DateRange;
use calgrid_core::dates::local_date;
use calgrid_core::remote::http::HttpGateway;
use calgrid_core::store::EventStore;
use chrono::Utc;
use owo_colors::OwoColorize;

use super::create_spinner;
use crate::render::render_events;
use crate::utils::when::When;

pub async fn run(config: &CalgridConfig, date: Option<&str>) -> Result<()> {
    let tz = config.timezone()?;
    let day = match date {
        Some(input) => When::parse(input)?.date(),
        None => local_date(&Utc::now(), &tz),
    };

    let gateway = HttpGateway::from_config(config)?;
    let mut store = EventStore::new(tz);

    let spinner = create_spinner(day.format("%b %-d").to_string());
    let result = store
        .load_range(&gateway, &DateRange::days(day, day, &tz))
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(_) => {}
        Err(e @ CalGridError::PartialLoad { .. }) => eprintln!("{}", e.to_string().yellow()),
        Err(e) => {
            return Err(e).with_context(|| format!("Could not load events from {}", gateway.base_url()));
        }
    }

    store.sort_for(day);
    println!("{}", day.format("%A, %B %-d, %Y").bold());
    println!("{}", render_events(store.events_on(day), &tz));

    Ok(())
}
