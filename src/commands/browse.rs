use anyhow::Result;
use calgrid_core::config::CalgridConfig;
use calgrid_core::date_range::DateRange;
use calgrid_core::remote::EventGateway;
use chrono::Duration;
use chrono_tz::Tz;
use owo_colors::OwoColorize;

use super::{Session, create_spinner, open_session};
use crate::render::Render;

/// Step through months one at a time, showing what the window loads and
/// drops along the way.
pub async fn run(config: &CalgridConfig, forward: usize, backward: usize) -> Result<()> {
    let mut session = open_session(config, None)?;
    let tz = session.store().timezone();

    let start = session.visible_index();
    step(&mut session, start, &tz).await;

    for _ in 0..forward {
        let next = session.visible_index() + 1;
        println!();
        step(&mut session, next, &tz).await;
    }
    for _ in 0..backward {
        let prev = session.visible_index().saturating_sub(1);
        println!();
        step(&mut session, prev, &tz).await;
    }

    Ok(())
}

async fn step(session: &mut Session, index: usize, tz: &Tz) {
    let visit = session.visit(index);
    let mut report = Vec::new();

    if visit.shifted > 0 {
        report.push(format!("   Added {} earlier months", visit.shifted).dimmed().to_string());
    }

    for load in &visit.loads {
        let spinner = create_spinner(format!("   {}", load.render()));
        let result = session.gateway().list(Some(&load.range)).await;
        spinner.finish_and_clear();

        match session.finish_load(load, result) {
            Ok(added) => report.push(format!("   {} {}", load.render(), added.to_string().dimmed())),
            Err(e) => report.push(format!("   {} {}", load.render(), e.to_string().red())),
        }
    }

    for range in &visit.evicted {
        report.push(format!("   {} {}", "✕".red(), render_span(range, tz).dimmed()));
    }

    if let Some(grid) = session.month_grid(session.visible_index()) {
        println!("{}", grid.render());
    }
    for line in report {
        println!("{}", line);
    }

    let window = session.window();
    println!(
        "{}",
        format!(
            "   {} months, {} with events, {} events held",
            window.len(),
            window.resident_count(),
            session.store().len()
        )
        .dimmed()
    );
}

fn render_span(range: &DateRange, tz: &Tz) -> String {
    let first = range.from.with_timezone(tz).date_naive();
    let last = (range.to - Duration::days(1)).with_timezone(tz).date_naive();
    format!("{} - {}", first.format("%b %Y"), last.format("%b %Y"))
}
