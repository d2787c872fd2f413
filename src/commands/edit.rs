use anyhow::Result;
use calgrid_core::config::CalgridConfig;
use calgrid_core::event::EventId;
use calgrid_core::form::EventForm;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dialoguer::Input;
use owo_colors::OwoColorize;

use super::{create_spinner, find_event, open_session, prompt_with_retry};
use crate::render::RenderIn;
use crate::utils::when::{When, parse_end};

const EDIT_FORMAT: &str = "%Y-%m-%d %H:%M";

fn local_text(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format(EDIT_FORMAT).to_string()
}

pub async fn run(
    config: &CalgridConfig,
    id: EventId,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let tz = config.timezone()?;
    let mut session = open_session(config, None)?;
    let event = find_event(&session, id).await?;
    let mut form = EventForm::edit(&event);

    if title.is_none() && start.is_none() && end.is_none() {
        println!("   {}", event.render_in(&tz));

        let new_title: String = Input::new()
            .with_prompt("  Title")
            .with_initial_text(event.title())
            .interact_text()?;
        let new_start = prompt_with_retry("  Starts", Some(local_text(event.start(), &tz)), |s| {
            Ok(When::parse(s)?.start(&tz))
        })?;
        let new_end = prompt_with_retry("  Ends", Some(local_text(event.end(), &tz)), |s| {
            parse_end(s, new_start, &tz)
        })?;

        form.title = Some(new_title);
        form.start = Some(new_start);
        form.end = Some(new_end);
    } else {
        if let Some(title) = title {
            form.title = Some(title);
        }
        if let Some(start) = start {
            // Moving the start keeps the length unless an end is given too.
            let new_start = When::parse(&start)?.start(&tz);
            form.start = Some(new_start);
            form.end = Some(new_start + event.duration());
        }
        if let Some(end) = end {
            let anchor = form.start.unwrap_or(event.start());
            form.end = Some(parse_end(&end, anchor, &tz)?);
        }
    }

    let spinner = create_spinner("Saving".to_string());
    let result = session.update(&form).await;
    spinner.finish_and_clear();
    let updated = result?;

    println!("{}", format!("  Updated: {}", updated.title()).yellow());
    println!("   {}", updated.render_in(&tz));

    Ok(())
}
