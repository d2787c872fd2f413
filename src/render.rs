//! Terminal rendering for calgrid-core types.
//!
//! Extension traits that add colored output with owo_colors.

use calgrid_core::event::Event;
use calgrid_core::month_grid::{DayCell, MonthGrid};
use calgrid_core::window::{Direction, LoadRequest};
use chrono::Weekday;
use chrono_tz::Tz;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

/// Rendering that needs the display time zone.
pub trait RenderIn {
    fn render_in(&self, tz: &Tz) -> String;
}

impl Render for DayCell {
    fn render(&self) -> String {
        let day = format!("{:>2}", self.day);
        let day = if self.is_selected {
            day.reversed().to_string()
        } else if self.is_today {
            day.cyan().bold().to_string()
        } else if !self.in_month {
            day.dimmed().to_string()
        } else {
            day
        };

        let marker = if self.has_event { "•" } else { " " };
        format!("{}{}", day, marker.yellow())
    }
}

fn short_name(weekday: Weekday) -> String {
    weekday.to_string().chars().take(2).collect()
}

impl Render for MonthGrid {
    fn render(&self) -> String {
        let title = self.month().format("%B %Y").to_string();
        let headers: Vec<String> = self
            .headers()
            .iter()
            .map(|weekday| format!("{:>2} ", short_name(*weekday)))
            .collect();

        let mut lines = vec![
            format!("{:^27}", title).bold().to_string(),
            headers.join(" ").trim_end().dimmed().to_string(),
        ];
        for week in self.weeks() {
            let cells: Vec<String> = week.iter().map(Render::render).collect();
            lines.push(cells.join(" "));
        }

        lines.join("\n")
    }
}

impl RenderIn for Event {
    fn render_in(&self, tz: &Tz) -> String {
        let start = self.start().with_timezone(tz);
        let end = self.end().with_timezone(tz);

        let time = if start.date_naive() == end.date_naive() {
            format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
        } else {
            format!("{} - {}", start.format("%H:%M"), end.format("%b %-d %H:%M"))
        };
        let id = self.id().map(|id| format!("#{id}")).unwrap_or_default();

        format!("{}  {} {}", time.dimmed(), self.title(), id.dimmed())
    }
}

impl Render for LoadRequest {
    fn render(&self) -> String {
        let span = if self.first_month == self.last_month {
            self.first_month.format("%b %Y").to_string()
        } else {
            format!(
                "{} - {}",
                self.first_month.format("%b %Y"),
                self.last_month.format("%b %Y")
            )
        };

        match self.direction {
            Some(Direction::Backward) => format!("{} {}", "←".blue(), span),
            Some(Direction::Forward) => format!("{} {}", "→".blue(), span),
            None => format!("{} {}", "↻".blue(), span),
        }
    }
}

/// A day's events, one per line, or a note that there are none.
pub fn render_events(events: &[Event], tz: &Tz) -> String {
    if events.is_empty() {
        return "   No events".dimmed().to_string();
    }

    events
        .iter()
        .map(|event| format!("   {}", event.render_in(tz)))
        .collect::<Vec<_>>()
        .join("\n")
}
