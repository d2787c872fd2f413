pub mod browse;
pub mod config;
pub mod day;
pub mod delete;
pub mod edit;
pub mod month;
pub mod new;

use anyhow::{Context, Result};
use calgrid_core::CalGridError;
use calgrid_core::config::CalgridConfig;
use calgrid_core::dates::local_date;
use calgrid_core::event::{Event, EventId};
use calgrid_core::remote::http::HttpGateway;
use calgrid_core::session::CalendarSession;
use chrono::{NaiveDate, Utc};
use dialoguer::Input;
use owo_colors::OwoColorize;

pub use crate::utils::tui::create_spinner;

pub type Session = CalendarSession<HttpGateway>;

/// Session against the configured server, opened on the month of `anchor`
/// (today's month when None).
pub fn open_session(config: &CalgridConfig, anchor: Option<NaiveDate>) -> Result<Session> {
    let tz = config.timezone()?;
    let today = local_date(&Utc::now(), &tz);
    let gateway = HttpGateway::from_config(config)?;

    let session = CalendarSession::anchored(
        gateway,
        tz,
        config.week_start()?,
        today,
        anchor.unwrap_or(today),
        config.window()?,
    )?;
    Ok(session)
}

/// Scroll to `index` behind a spinner. Malformed records only warn.
pub async fn scroll(session: &mut Session, index: usize) -> Result<()> {
    let spinner = create_spinner("Loading events".to_string());
    let result = session.scroll_to(index).await;
    spinner.finish_and_clear();

    match result {
        Ok(_) => Ok(()),
        Err(e @ CalGridError::PartialLoad { .. }) => {
            eprintln!("{}", e.to_string().yellow());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| {
            format!("Could not load events from {}", session.gateway().base_url())
        }),
    }
}

pub async fn find_event(session: &Session, id: EventId) -> Result<Event> {
    let spinner = create_spinner(format!("Looking up #{id}"));
    let result = session.find(id).await;
    spinner.finish_and_clear();

    result
        .with_context(|| format!("Could not reach {}", session.gateway().base_url()))?
        .with_context(|| format!("No event with id {id}"))
}

/// Prompt until `parse` accepts the input.
pub fn prompt_with_retry<T, F>(prompt: &str, initial: Option<String>, parse: F) -> Result<T>
where
    F: Fn(&str) -> Result<T>,
{
    loop {
        let mut input = Input::<String>::new().with_prompt(prompt);
        if let Some(initial) = &initial {
            input = input.with_initial_text(initial);
        }

        match parse(&input.interact_text()?) {
            Ok(result) => return Ok(result),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}
