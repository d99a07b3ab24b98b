use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#3788d8";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const TIME_FORMAT_SECS: &str = "%H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoredEvent", try_from = "StoredEvent")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: EventColor,
    /// Opaque image reference (path or URL), never inspected.
    pub image: Option<String>,
}

impl Event {
    /// Whether the event touches `date`. An end before the start is
    /// treated as a single-day event on the start date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        let first = self.start.date();
        let last = self.end.date().max(first);
        first <= date && date <= last
    }

    pub fn duration_display(&self) -> String {
        if self.start.date() == self.end.date() {
            format!("{} - {}", format_time(self.start.time()), format_time(self.end.time()))
        } else {
            format!(
                "{} {} - {} {}",
                self.start.format("%b %d"),
                format_time(self.start.time()),
                self.end.format("%b %d"),
                format_time(self.end.time()),
            )
        }
    }
}

/// Fill and border colour of an event, kept as the string the user gave.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventColor(String);

impl EventColor {
    /// Accepts `#rrggbb` or a basic colour name.
    pub fn parse(s: &str) -> Option<Self> {
        parse_color(s).map(|_| Self(s.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_color(&self) -> Color {
        parse_color(&self.0).unwrap_or(Color::Blue)
    }
}

impl Default for EventColor {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        _ => None,
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, TIME_FORMAT_SECS))
        .ok()
}

/// `HH:MM`, with seconds (and any fraction) only when they are non-zero.
pub fn format_time(time: NaiveTime) -> String {
    if time.second() == 0 && time.nanosecond() == 0 {
        time.format(TIME_FORMAT).to_string()
    } else {
        time.format(TIME_FORMAT_SECS).to_string()
    }
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let (date, time) = s.split_once('T')?;
    Some(parse_date(date)?.and_time(parse_time(time)?))
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    format!("{}T{}", format_date(dt.date()), format_time(dt.time()))
}

// ── Stored record layout ──

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEvent {
    id: String,
    title: String,
    start: String,
    end: String,
    #[serde(default)]
    background_color: Option<String>,
    #[serde(default)]
    border_color: Option<String>,
    #[serde(default)]
    extended_props: StoredProps,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredProps {
    #[serde(default)]
    image: Option<String>,
}

impl From<Event> for StoredEvent {
    fn from(ev: Event) -> Self {
        Self {
            id: ev.id,
            title: ev.title,
            start: format_datetime(ev.start),
            end: format_datetime(ev.end),
            background_color: Some(ev.color.to_string()),
            border_color: Some(ev.color.to_string()),
            extended_props: StoredProps { image: ev.image },
        }
    }
}

impl TryFrom<StoredEvent> for Event {
    type Error = String;

    fn try_from(rec: StoredEvent) -> Result<Self, Self::Error> {
        let start = parse_datetime(&rec.start)
            .ok_or_else(|| format!("event {}: invalid start {:?}", rec.id, rec.start))?;
        let end = parse_datetime(&rec.end)
            .ok_or_else(|| format!("event {}: invalid end {:?}", rec.id, rec.end))?;
        if rec.title.is_empty() {
            return Err(format!("event {}: empty title", rec.id));
        }
        let color = rec
            .background_color
            .or(rec.border_color)
            .map(EventColor)
            .unwrap_or_default();

        Ok(Self {
            id: rec.id,
            title: rec.title,
            start,
            end,
            color,
            image: rec.extended_props.image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn dt(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    fn meeting() -> Event {
        Event {
            id: "42".to_string(),
            title: "Meeting".to_string(),
            start: dt("2025-06-10T09:00"),
            end: dt("2025-06-10T10:00"),
            color: EventColor::default(),
            image: Some("blob:cat".to_string()),
        }
    }

    #[test]
    fn serializes_to_stored_record_layout() {
        let value = serde_json::to_value(meeting()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "42",
                "title": "Meeting",
                "start": "2025-06-10T09:00",
                "end": "2025-06-10T10:00",
                "backgroundColor": "#3788d8",
                "borderColor": "#3788d8",
                "extendedProps": { "image": "blob:cat" },
            })
        );
    }

    #[test]
    fn decodes_record_without_colors_or_props() {
        let ev: Event = serde_json::from_value(json!({
            "id": "7",
            "title": "Lunch",
            "start": "2025-06-10T12:00:00",
            "end": "2025-06-10T13:00",
        }))
        .unwrap();
        assert_eq!(ev.color, EventColor::default());
        assert_eq!(ev.image, None);
        assert_eq!(format_datetime(ev.start), "2025-06-10T12:00");
    }

    #[test]
    fn falls_back_to_border_color() {
        let ev: Event = serde_json::from_value(json!({
            "id": "7",
            "title": "Lunch",
            "start": "2025-06-10T12:00",
            "end": "2025-06-10T13:00",
            "borderColor": "red",
        }))
        .unwrap();
        assert_eq!(ev.color.as_str(), "red");
    }

    #[test]
    fn rejects_record_with_bad_start() {
        let result: Result<Event, _> = serde_json::from_value(json!({
            "id": "7",
            "title": "Lunch",
            "start": "tomorrow",
            "end": "2025-06-10T13:00",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_record_with_empty_title() {
        let result: Result<Event, _> = serde_json::from_value(json!({
            "id": "7",
            "title": "",
            "start": "2025-06-10T12:00",
            "end": "2025-06-10T13:00",
        }));
        assert!(result.unwrap_err().to_string().contains("empty title"));
    }

    #[rstest]
    #[case("2025-06-10T09:00", Some("2025-06-10T09:00"))]
    #[case("2025-06-10T09:00:30", Some("2025-06-10T09:00:30"))]
    #[case("2025-06-10T09:00:00.000", Some("2025-06-10T09:00"))]
    #[case("2025-06-10T09:00:30.250", Some("2025-06-10T09:00:30.250"))]
    #[case("2025-06-10", None)]
    #[case("2025-13-10T09:00", None)]
    fn datetime_parsing(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_datetime(input).map(format_datetime).as_deref(), expected);
    }

    #[rstest]
    #[case("#3788d8", Some(Color::Rgb(0x37, 0x88, 0xd8)))]
    #[case("Cyan", Some(Color::Cyan))]
    #[case("#378", None)]
    #[case("chartreuse", None)]
    fn color_parsing(#[case] input: &str, #[case] expected: Option<Color>) {
        assert_eq!(parse_color(input), expected);
    }

    #[test]
    fn multi_day_event_covers_every_day() {
        let mut ev = meeting();
        ev.end = dt("2025-06-12T08:00");
        assert!(ev.covers(parse_date("2025-06-11").unwrap()));
        assert!(!ev.covers(parse_date("2025-06-13").unwrap()));
        assert_eq!(ev.duration_display(), "Jun 10 09:00 - Jun 12 08:00");
    }

    #[test]
    fn inverted_event_covers_only_start_day() {
        let mut ev = meeting();
        ev.end = dt("2025-06-09T08:00");
        assert!(ev.covers(parse_date("2025-06-10").unwrap()));
        assert!(!ev.covers(parse_date("2025-06-09").unwrap()));
    }
}
