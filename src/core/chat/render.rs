//! Card rendering contract.
//!
//! Renderers implement one method per card type. `render_card` dispatches on
//! the payload so a renderer never sees an unchecked type; unknown types were
//! already coerced to text during normalization and land in `text`.

use std::fmt::Write;

use super::cards::{
    CalendarData, CardData, DetailCard, FoodData, GridData, KeyValueData, MapData, ParkingData,
    TableData, TextData,
};
use super::calendar::{CalendarEntry, map_search_url};

/// Renders cards into some output type.
pub trait CardRenderer {
    type Output;

    fn key_value(&self, title: &str, data: &KeyValueData) -> Self::Output;
    fn grid(&self, title: &str, data: &GridData) -> Self::Output;
    fn table(&self, title: &str, data: &TableData) -> Self::Output;
    fn calendar(&self, title: &str, data: &CalendarData) -> Self::Output;
    fn map(&self, title: &str, data: &MapData) -> Self::Output;
    fn parking(&self, title: &str, data: &ParkingData) -> Self::Output;
    fn food(&self, title: &str, data: &FoodData) -> Self::Output;
    fn text(&self, title: &str, data: &TextData) -> Self::Output;

    fn render_card(&self, card: &DetailCard) -> Self::Output {
        let title = card.title.as_str();
        match &card.data {
            CardData::KeyValue(d) => self.key_value(title, d),
            CardData::Grid(d) => self.grid(title, d),
            CardData::Table(d) => self.table(title, d),
            CardData::Calendar(d) => self.calendar(title, d),
            CardData::Map(d) => self.map(title, d),
            CardData::Parking(d) => self.parking(title, d),
            CardData::Food(d) => self.food(title, d),
            CardData::Text(d) => self.text(title, d),
        }
    }
}

/// Plain-text rendering for logs and non-visual clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    /// Render a summary followed by its cards, separated by blank lines.
    pub fn render_reply(&self, summary: &str, cards: &[DetailCard]) -> String {
        let mut out = summary.to_string();
        for card in cards {
            out.push_str("\n\n");
            out.push_str(&self.render_card(card));
        }
        out
    }
}

fn heading(title: &str) -> String {
    if title.is_empty() {
        String::new()
    } else {
        format!("[{title}]\n")
    }
}

fn push_opt(out: &mut String, label: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        let _ = write!(out, " | {label}: {value}");
    }
}

impl CardRenderer for PlainTextRenderer {
    type Output = String;

    fn key_value(&self, title: &str, data: &KeyValueData) -> String {
        let mut out = heading(title);
        for item in &data.items {
            let marker = if item.highlight { "* " } else { "- " };
            let _ = writeln!(out, "{marker}{}: {}", item.key, item.value);
        }
        out.trim_end().to_string()
    }

    fn grid(&self, title: &str, data: &GridData) -> String {
        let mut out = heading(title);
        for item in &data.items {
            let _ = write!(out, "- {}", item.title);
            if let Some(badge) = &item.badge {
                let _ = write!(out, " ({badge})");
            }
            if let Some(subtitle) = &item.subtitle {
                let _ = write!(out, ": {subtitle}");
            }
            out.push('\n');
            for field in &item.fields {
                let _ = writeln!(out, "    {}: {}", field.key, field.value);
            }
        }
        out.trim_end().to_string()
    }

    fn table(&self, title: &str, data: &TableData) -> String {
        let mut out = heading(title);
        if !data.headers.is_empty() {
            let _ = writeln!(out, "{}", data.headers.join(" | "));
        }
        for row in &data.rows {
            let _ = writeln!(out, "{}", row.join(" | "));
        }
        out.trim_end().to_string()
    }

    fn calendar(&self, title: &str, data: &CalendarData) -> String {
        let mut out = heading(title);
        for event in &data.events {
            let _ = write!(out, "- {} {} {}", event.date, event.time, event.title);
            push_opt(&mut out, "@", &event.location);
            out.push('\n');
            // Events without a usable date or time are listed without a link
            if let Ok(entry) = CalendarEntry::from_event(event) {
                let _ = writeln!(out, "    {}", entry.google_calendar_url());
            }
        }
        out.trim_end().to_string()
    }

    fn map(&self, title: &str, data: &MapData) -> String {
        let mut out = heading(title);
        match (&data.address, data.lat, data.lng) {
            (Some(address), _, _) => out.push_str(address),
            (None, Some(lat), Some(lng)) => {
                let _ = write!(out, "{lat}, {lng}");
            }
            _ => {}
        }
        if let Some(url) = map_search_url(data) {
            let _ = write!(out, "\n{url}");
        }
        out.trim_end().to_string()
    }

    fn parking(&self, title: &str, data: &ParkingData) -> String {
        let mut out = heading(title);
        if !data.overview.is_empty() {
            let _ = writeln!(out, "{}", data.overview);
        }
        for lot in &data.lots {
            let _ = write!(out, "- {}", lot.name);
            push_opt(&mut out, "address", &lot.address);
            push_opt(&mut out, "capacity", &lot.capacity);
            push_opt(&mut out, "fee", &lot.fee);
            push_opt(&mut out, "note", &lot.note);
            out.push('\n');
        }
        out.trim_end().to_string()
    }

    fn food(&self, title: &str, data: &FoodData) -> String {
        let mut out = heading(title);
        for restaurant in &data.restaurants {
            let _ = write!(out, "- {}", restaurant.name);
            if let Some(category) = &restaurant.category {
                let _ = write!(out, " ({category})");
            }
            push_opt(&mut out, "location", &restaurant.location);
            out.push('\n');
            for item in &restaurant.menu {
                match &item.price {
                    Some(price) => {
                        let _ = writeln!(out, "    {} {price}", item.name);
                    }
                    None => {
                        let _ = writeln!(out, "    {}", item.name);
                    }
                }
            }
        }
        out.trim_end().to_string()
    }

    fn text(&self, title: &str, data: &TextData) -> String {
        format!("{}{}", heading(title), data.text).trim_end().to_string()
    }
}
