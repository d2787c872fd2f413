use anyhow::Result;
use calgrid_core::config::CalgridConfig;
use calgrid_core::form::EventForm;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dialoguer::Input;
use owo_colors::OwoColorize;

use super::{create_spinner, open_session, prompt_with_retry};
use crate::render::RenderIn;
use crate::utils::when::{When, parse_end, parse_length};

pub async fn run(
    config: &CalgridConfig,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    duration: Option<String>,
) -> Result<()> {
    let interactive = title.is_none() || start.is_none();
    let tz = config.timezone()?;

    let title = match title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    let when = match start {
        Some(s) => When::parse(&s)?,
        None => prompt_with_retry("  When?", None, When::parse)?,
    };
    let start_time = when.start(&tz);

    let end_time = if let Some(end_input) = end {
        parse_end(&end_input, start_time, &tz)?
    } else if let Some(dur_input) = duration {
        start_time + parse_length(&dur_input)?
    } else if interactive {
        prompt_end(&when, start_time, &tz)?
    } else {
        start_time + when.default_length()
    };

    let form = EventForm::filled(title, start_time, end_time);

    let mut session = open_session(config, Some(when.date()))?;
    let spinner = create_spinner("Saving".to_string());
    let result = session.create(&form).await;
    spinner.finish_and_clear();
    let event = result?;

    if interactive {
        println!();
    }
    println!("{}", format!("  Created: {}", event.title()).green());
    println!("   {}", event.render_in(&tz));

    Ok(())
}

/// Ask for a length or an end, defaulting to the start's usual length.
fn prompt_end(when: &When, start: DateTime<Utc>, tz: &Tz) -> Result<DateTime<Utc>> {
    let hint = match when {
        When::Day(_) => "1 day",
        When::At(_) => "1 hour",
    };

    prompt_with_retry(&format!("  How long? ({hint})"), None, |input| {
        if input.trim().is_empty() {
            Ok(start + when.default_length())
        } else {
            parse_end(input, start, tz)
        }
    })
}
