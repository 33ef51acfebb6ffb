//! Calendar and map exports for card payloads.

use thiserror::Error;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime, Time};
use url::Url;
use uuid::Uuid;

use super::cards::{CalendarEvent, MapData};

const GOOGLE_CALENDAR_RENDER_URL: &str = "https://calendar.google.com/calendar/render";
const GOOGLE_MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
const GOOGLE_MAPS_VIEW_URL: &str = "https://www.google.com/maps/@";
const ICS_PRODID: &str = "-//festival-concierge//calendar export//EN";

/// Errors converting a calendar card event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid event date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid event time '{0}', expected HH:mm or HH:mm~HH:mm")]
    InvalidTime(String),

    #[error("Event '{date} {time}' ends outside the supported date range")]
    OutOfRange { date: String, time: String },
}

/// A calendar card event with resolved start and end times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

fn parse_clock(raw: &str) -> Result<Time, CalendarError> {
    let invalid = || CalendarError::InvalidTime(raw.to_string());
    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u8 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u8 = minute.trim().parse().map_err(|_| invalid())?;
    Time::from_hms(hour, minute, 0).map_err(|_| invalid())
}

impl CalendarEntry {
    /// Resolve an event's `date` and `time` (`HH:mm~HH:mm` or `HH:mm`).
    ///
    /// A single time lasts one hour. An end before the start rolls over to
    /// the next day.
    pub fn from_event(event: &CalendarEvent) -> Result<Self, CalendarError> {
        let date = Date::parse(event.date.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|_| CalendarError::InvalidDate(event.date.clone()))?;

        let (start_raw, end_raw) = match event.time.split_once('~') {
            Some((start, end)) if !end.trim().is_empty() => (start, Some(end)),
            Some((start, _)) => (start, None),
            None => (event.time.as_str(), None),
        };

        let start = PrimitiveDateTime::new(date, parse_clock(start_raw)?);
        let end = match end_raw {
            Some(end_raw) => {
                let end = PrimitiveDateTime::new(date, parse_clock(end_raw)?);
                if end < start {
                    end.checked_add(Duration::days(1))
                } else {
                    Some(end)
                }
            }
            None => start.checked_add(Duration::hours(1)),
        }
        .ok_or_else(|| CalendarError::OutOfRange {
            date: event.date.clone(),
            time: event.time.clone(),
        })?;

        let description = event
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| event.title.clone());

        Ok(Self {
            title: event.title.clone(),
            description,
            location: event.location.clone().filter(|l| !l.trim().is_empty()),
            start,
            end,
        })
    }

    fn stamp(at: PrimitiveDateTime) -> String {
        let format = format_description!("[year][month][day]T[hour][minute][second]");
        // Formatting a complete PrimitiveDateTime with a fixed description cannot fail.
        at.format(format).unwrap_or_default()
    }

    /// Google Calendar "add event" template URL, in floating local time.
    pub fn google_calendar_url(&self) -> String {
        let dates = format!("{}/{}", Self::stamp(self.start), Self::stamp(self.end));
        let mut params = vec![
            ("action", "TEMPLATE"),
            ("text", self.title.as_str()),
            ("dates", dates.as_str()),
            ("details", self.description.as_str()),
        ];
        if let Some(location) = &self.location {
            params.push(("location", location.as_str()));
        }

        match Url::parse_with_params(GOOGLE_CALENDAR_RENDER_URL, &params) {
            Ok(url) => url.to_string(),
            Err(_) => GOOGLE_CALENDAR_RENDER_URL.to_string(),
        }
    }

    /// iCalendar document with a single event, CRLF line endings and content
    /// lines folded at 75 octets.
    pub fn to_ics(&self) -> String {
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{ICS_PRODID}"),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}@festival-concierge", Uuid::new_v4()),
            format!("DTSTART:{}", Self::stamp(self.start)),
            format!("DTEND:{}", Self::stamp(self.end)),
            format!("SUMMARY:{}", escape_ics_text(&self.title)),
            format!("DESCRIPTION:{}", escape_ics_text(&self.description)),
        ];
        if let Some(location) = &self.location {
            lines.push(format!("LOCATION:{}", escape_ics_text(location)));
        }
        lines.extend(
            ["STATUS:CONFIRMED", "END:VEVENT", "END:VCALENDAR"]
                .into_iter()
                .map(str::to_string),
        );

        lines.iter().fold(String::new(), |mut ics, line| {
            ics.push_str(&fold_ics_line(line));
            ics.push_str("\r\n");
            ics
        })
    }
}

/// Longest content line in octets, excluding the CRLF.
const ICS_LINE_OCTETS: usize = 75;

/// Split a content line on char boundaries so no physical line exceeds
/// [`ICS_LINE_OCTETS`]; continuation lines start with a single space.
fn fold_ics_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / ICS_LINE_OCTETS * 3);
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > ICS_LINE_OCTETS {
            folded.push_str("\r\n ");
            used = 1;
        }
        folded.push(ch);
        used += width;
    }
    folded
}

fn escape_ics_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

/// Maps link for a map card: address search, else a view centered on
/// `lat,lng` at the card's zoom. `None` when the card has neither.
pub fn map_search_url(data: &MapData) -> Option<String> {
    if let Some(address) = data.address.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        let url =
            Url::parse_with_params(GOOGLE_MAPS_SEARCH_URL, &[("api", "1"), ("query", address)]).ok()?;
        return Some(url.to_string());
    }

    let (lat, lng) = (data.lat?, data.lng?);
    let center = format!("{lat},{lng}");
    let zoom = data.zoom_or_default().to_string();
    let url = Url::parse_with_params(
        GOOGLE_MAPS_VIEW_URL,
        &[
            ("api", "1"),
            ("map_action", "map"),
            ("center", center.as_str()),
            ("zoom", zoom.as_str()),
        ],
    )
    .ok()?;
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn event(date: &str, time: &str) -> CalendarEvent {
        CalendarEvent {
            title: "Mud Run".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            location: Some("Main stage".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_range_time() {
        let entry = CalendarEntry::from_event(&event("2025-09-26", "14:00~16:30")).unwrap();
        assert_eq!(entry.start, datetime!(2025-09-26 14:00));
        assert_eq!(entry.end, datetime!(2025-09-26 16:30));
        assert_eq!(entry.description, "Mud Run");
    }

    #[test]
    fn test_single_time_lasts_one_hour() {
        let entry = CalendarEntry::from_event(&event("2025-09-26", "23:30")).unwrap();
        assert_eq!(entry.end, datetime!(2025-09-27 00:30));
    }

    #[test]
    fn test_end_before_start_rolls_over() {
        let entry = CalendarEntry::from_event(&event("2025-09-26", "22:00~01:00")).unwrap();
        assert_eq!(entry.end, datetime!(2025-09-27 01:00));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            CalendarEntry::from_event(&event("26/09/2025", "10:00")),
            Err(CalendarError::InvalidDate("26/09/2025".to_string()))
        );
        assert!(matches!(
            CalendarEntry::from_event(&event("2025-09-26", "morning")),
            Err(CalendarError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_google_calendar_url() {
        let entry = CalendarEntry::from_event(&event("2025-09-26", "9:00~10:00")).unwrap();
        let url = Url::parse(&entry.google_calendar_url()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["action"], "TEMPLATE");
        assert_eq!(params["text"], "Mud Run");
        assert_eq!(params["dates"], "20250926T090000/20250926T100000");
        assert_eq!(params["location"], "Main stage");
    }

    #[test]
    fn test_ics_document() {
        let mut ev = event("2025-09-26", "14:00");
        ev.description = Some("Bring, boots; line\nbreak".to_string());
        let ics = CalendarEntry::from_event(&ev).unwrap().to_ics();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.contains("DTSTART:20250926T140000\r\n"));
        assert!(ics.contains("DTEND:20250926T150000\r\n"));
        assert!(ics.contains("DESCRIPTION:Bring\\, boots\\; line\\nbreak\r\n"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_end_of_calendar_is_an_error() {
        let expected = Err(CalendarError::OutOfRange {
            date: "9999-12-31".to_string(),
            time: "23:30".to_string(),
        });
        assert_eq!(CalendarEntry::from_event(&event("9999-12-31", "23:30")), expected);

        assert!(matches!(
            CalendarEntry::from_event(&event("9999-12-31", "23:00~01:00")),
            Err(CalendarError::OutOfRange { .. })
        ));
        // The last representable hour still fits
        assert!(CalendarEntry::from_event(&event("9999-12-31", "22:00~23:00")).is_ok());
    }

    #[test]
    fn test_long_ics_lines_are_folded() {
        let mut ev = event("2025-09-26", "14:00");
        ev.title = "갯골".repeat(40);
        ev.description = Some("Mud run at the salt pond ".repeat(10));
        let ics = CalendarEntry::from_event(&ev).unwrap().to_ics();

        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line of {} octets: {line}", line.len());
        }
        assert!(ics.lines().any(|line| line.starts_with(' ')));

        // Unfolding restores the original content lines
        let unfolded = ics.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("SUMMARY:{}\r\n", "갯골".repeat(40))));
        assert!(unfolded.contains("DTSTART:20250926T140000\r\n"));
    }

    #[test]
    fn test_map_urls() {
        let by_address = MapData {
            address: Some("Siheung Gaetgol Eco Park".to_string()),
            ..Default::default()
        };
        let url = map_search_url(&by_address).unwrap();
        assert!(url.starts_with("https://www.google.com/maps/search/?api=1&query=Siheung"));

        let by_coords = MapData {
            lat: Some(37.39),
            lng: Some(126.78),
            ..Default::default()
        };
        let url = map_search_url(&by_coords).unwrap();
        assert!(url.contains("center=37.39%2C126.78"));
        assert!(url.contains("zoom=15"));

        assert_eq!(map_search_url(&MapData::default()), None);
    }
}
