use anyhow::{Context, Result};
use calgrid_core::config::CalgridConfig;
use calgrid_core::dates::start_of_month;
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use super::{open_session, scroll};
use crate::render::{Render, render_events};

pub async fn run(
    config: &CalgridConfig,
    month: Option<NaiveDate>,
    select: Option<NaiveDate>,
) -> Result<()> {
    let mut session = open_session(config, month.or(select))?;
    let tz = session.store().timezone();

    let index = session.visible_index();
    scroll(&mut session, index).await?;

    let shown = session.visible_month().context("Month window is empty")?;
    let today = session.today();
    let selected = select.or((start_of_month(today) == shown).then_some(today));
    session.select(selected);

    let grid = session
        .month_grid(session.visible_index())
        .context("Month window is empty")?;
    println!("{}", grid.render());

    if let Some(day) = session.selected() {
        println!();
        println!("{}", day.format("%A, %B %-d").bold());
        println!("{}", render_events(session.selected_events(), &tz));
    }

    Ok(())
}
