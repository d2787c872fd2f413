use anyhow::Result;
use calgrid_core::config::CalgridConfig;
use calgrid_core::event::EventId;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use super::{create_spinner, find_event, open_session};
use crate::render::RenderIn;

pub async fn run(config: &CalgridConfig, id: EventId, yes: bool) -> Result<()> {
    let tz = config.timezone()?;
    let mut session = open_session(config, None)?;
    let event = find_event(&session, id).await?;

    println!("   {}", event.render_in(&tz));
    if !yes
        && !Confirm::new()
            .with_prompt("  Delete this event?")
            .default(false)
            .interact()?
    {
        println!("{}", "  Kept".dimmed());
        return Ok(());
    }

    let spinner = create_spinner("Deleting".to_string());
    let result = session.delete(&event).await;
    spinner.finish_and_clear();
    result?;

    println!("{}", format!("  Deleted: {}", event.title()).red());
    Ok(())
}
