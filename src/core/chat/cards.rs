//! Typed detail cards attached to chat replies.
//!
//! A card is `{title, type, data}` where `type` selects the shape of `data`.
//! The set of types is closed. Cards produced by the model are untrusted and
//! go through [`normalize_card`], which guarantees every surviving card has a
//! known type and a payload of the matching shape.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Closed set of card kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardType {
    KeyValue,
    Grid,
    Table,
    Calendar,
    Map,
    Parking,
    Food,
    Text,
}

impl CardType {
    pub const ALL: [CardType; 8] = [
        CardType::KeyValue,
        CardType::Grid,
        CardType::Table,
        CardType::Calendar,
        CardType::Map,
        CardType::Parking,
        CardType::Food,
        CardType::Text,
    ];

    /// Wire name.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyValue => "keyvalue",
            Self::Grid => "grid",
            Self::Table => "table",
            Self::Calendar => "calendar",
            Self::Map => "map",
            Self::Parking => "parking",
            Self::Food => "food",
            Self::Text => "text",
        }
    }

    /// Parse a wire name, tolerating case and separator variations.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "keyvalue" | "kv" => Some(Self::KeyValue),
            "grid" => Some(Self::Grid),
            "table" => Some(Self::Table),
            "calendar" | "schedule" => Some(Self::Calendar),
            "map" | "location" => Some(Self::Map),
            "parking" => Some(Self::Parking),
            "food" | "restaurants" => Some(Self::Food),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Lenient field helpers
// =============================================================================

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    scalar_to_string(&value).ok_or_else(|| de::Error::custom("expected a string"))
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        value => scalar_to_string(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a string")),
    }
}

fn lenient_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_to_string(item).ok_or_else(|| de::Error::custom("expected a string")))
            .collect(),
        _ => Err(de::Error::custom("expected a list of strings")),
    }
}

/// `null` and missing are false; `"true"`/`"false"` and 0/1 are accepted.
fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            _ => Err(de::Error::custom("expected a boolean")),
        },
        _ => Err(de::Error::custom("expected a boolean")),
    }
}

/// Small counts such as zoom and column numbers, rounded and clamped to `u8`.
fn lenient_u8<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
    let number = match Value::deserialize(d)? {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(Some(n.round().clamp(0.0, f64::from(u8::MAX)) as u8)),
        _ => Err(de::Error::custom("expected a number")),
    }
}

fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(d).map(Option::unwrap_or_default)
}

fn lenient_rows<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<String>>, D::Error> {
    let rows = Option::<Vec<Vec<Value>>>::deserialize(d)?.unwrap_or_default();
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    scalar_to_string(cell).ok_or_else(|| de::Error::custom("expected a table cell"))
                })
                .collect()
        })
        .collect()
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom("expected a coordinate")),
        _ => Err(de::Error::custom("expected a coordinate")),
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValueItem {
    #[serde(deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(skip_serializing_if = "is_false", deserialize_with = "lenient_flag")]
    pub highlight: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValueData {
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<KeyValueItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridField {
    #[serde(deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridItem {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    pub fields: Vec<GridField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridData {
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<GridItem>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_u8")]
    pub columns: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableData {
    #[serde(deserialize_with = "lenient_strings")]
    pub headers: Vec<String>,
    #[serde(deserialize_with = "lenient_rows")]
    pub rows: Vec<Vec<String>>,
}

/// One dated event; `date` is `YYYY-MM-DD`, `time` is `HH:mm~HH:mm` or `HH:mm`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarEvent {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarData {
    #[serde(deserialize_with = "null_as_empty")]
    pub events: Vec<CalendarEvent>,
}

/// Default zoom level of map cards.
pub const DEFAULT_MAP_ZOOM: u8 = 15;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapData {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_u8")]
    pub zoom: Option<u8>,
}

impl MapData {
    pub fn zoom_or_default(&self) -> u8 {
        self.zoom.unwrap_or(DEFAULT_MAP_ZOOM)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingLot {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingData {
    #[serde(deserialize_with = "lenient_string")]
    pub overview: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub lots: Vec<ParkingLot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restaurant {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    pub menu: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodData {
    #[serde(deserialize_with = "null_as_empty")]
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextData {
    #[serde(deserialize_with = "lenient_string")]
    pub text: String,
}

/// Card payload, one variant per card type.
#[derive(Debug, Clone, PartialEq)]
pub enum CardData {
    KeyValue(KeyValueData),
    Grid(GridData),
    Table(TableData),
    Calendar(CalendarData),
    Map(MapData),
    Parking(ParkingData),
    Food(FoodData),
    Text(TextData),
}

impl CardData {
    pub fn card_type(&self) -> CardType {
        match self {
            CardData::KeyValue(_) => CardType::KeyValue,
            CardData::Grid(_) => CardType::Grid,
            CardData::Table(_) => CardType::Table,
            CardData::Calendar(_) => CardType::Calendar,
            CardData::Map(_) => CardType::Map,
            CardData::Parking(_) => CardType::Parking,
            CardData::Food(_) => CardType::Food,
            CardData::Text(_) => CardType::Text,
        }
    }

    /// Decode a payload of the given type.
    fn decode(card_type: CardType, data: Value) -> serde_json::Result<Self> {
        Ok(match card_type {
            CardType::KeyValue => CardData::KeyValue(serde_json::from_value(data)?),
            CardType::Grid => CardData::Grid(serde_json::from_value(data)?),
            CardType::Table => CardData::Table(serde_json::from_value(data)?),
            CardType::Calendar => CardData::Calendar(serde_json::from_value(data)?),
            CardType::Map => CardData::Map(serde_json::from_value(data)?),
            CardType::Parking => CardData::Parking(serde_json::from_value(data)?),
            CardType::Food => CardData::Food(serde_json::from_value(data)?),
            CardType::Text => CardData::Text(TextData {
                text: text_from_value(&data),
            }),
        })
    }
}

/// One renderable card.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailCard {
    pub title: String,
    pub data: CardData,
}

impl DetailCard {
    pub fn new(title: impl Into<String>, data: CardData) -> Self {
        Self {
            title: title.into(),
            data,
        }
    }

    pub fn card_type(&self) -> CardType {
        self.data.card_type()
    }
}

impl Serialize for DetailCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("type", self.card_type().as_str())?;
        match &self.data {
            CardData::KeyValue(d) => map.serialize_entry("data", d)?,
            CardData::Grid(d) => map.serialize_entry("data", d)?,
            CardData::Table(d) => map.serialize_entry("data", d)?,
            CardData::Calendar(d) => map.serialize_entry("data", d)?,
            CardData::Map(d) => map.serialize_entry("data", d)?,
            CardData::Parking(d) => map.serialize_entry("data", d)?,
            CardData::Food(d) => map.serialize_entry("data", d)?,
            CardData::Text(d) => map.serialize_entry("data", d)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DetailCard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        normalize_card(value).ok_or_else(|| de::Error::custom("card must be a JSON object"))
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Best-effort plain text for a payload that is rendered as a text card.
fn text_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(s)) => s.clone(),
            _ if map.is_empty() => String::new(),
            _ => value.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Coerce one untrusted card into a well-formed `DetailCard`.
///
/// - non-object input is dropped (`None`)
/// - missing `data` becomes `{}`
/// - missing or unknown `type` becomes `text`
/// - a payload that does not fit its type becomes `text`
pub fn normalize_card(value: Value) -> Option<DetailCard> {
    let mut card = match value {
        Value::Object(card) => card,
        other => {
            warn!(kind = json_kind(&other), "Dropping card that is not an object");
            return None;
        }
    };

    let title = card
        .remove("title")
        .as_ref()
        .and_then(scalar_to_string)
        .unwrap_or_default();

    let data = match card.remove("data") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(data) => data,
    };

    let declared = card.get("type").and_then(Value::as_str).map(str::to_string);
    let card_type = match declared.as_deref().and_then(CardType::parse) {
        Some(card_type) => card_type,
        None => {
            warn!(
                title = %title,
                declared = declared.as_deref().unwrap_or("<missing>"),
                "Unknown card type, rendering as text"
            );
            CardType::Text
        }
    };

    let data = match CardData::decode(card_type, data.clone()) {
        Ok(data) => data,
        Err(e) => {
            warn!(title = %title, card_type = %card_type, error = %e, "Card payload does not fit its type, rendering as text");
            CardData::Text(TextData {
                text: text_from_value(&data),
            })
        }
    };

    Some(DetailCard { title, data })
}

/// Normalize a JSON `cards` value; anything but an array yields no cards.
pub fn normalize_cards(value: Option<Value>) -> Vec<DetailCard> {
    match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(normalize_card).collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!(kind = json_kind(&other), "Ignoring cards field that is not an array");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_type_parse() {
        assert_eq!(CardType::parse("keyvalue"), Some(CardType::KeyValue));
        assert_eq!(CardType::parse("Key-Value"), Some(CardType::KeyValue));
        assert_eq!(CardType::parse("key_value"), Some(CardType::KeyValue));
        assert_eq!(CardType::parse(" PARKING "), Some(CardType::Parking));
        assert_eq!(CardType::parse("carousel"), None);
        for card_type in CardType::ALL {
            assert_eq!(CardType::parse(card_type.as_str()), Some(card_type));
        }
    }

    #[test]
    fn test_keyvalue_card() {
        let card = normalize_card(json!({
            "title": "Admission",
            "type": "keyvalue",
            "data": {"items": [
                {"key": "Price", "value": "Free", "highlight": true},
                {"key": "Age", "value": 7}
            ]}
        }))
        .unwrap();
        match &card.data {
            CardData::KeyValue(d) => {
                assert_eq!(d.items.len(), 2);
                assert!(d.items[0].highlight);
                assert_eq!(d.items[1].value, "7");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_becomes_empty_payload() {
        let card = normalize_card(json!({"title": "Schedule", "type": "calendar"})).unwrap();
        assert_eq!(card.card_type(), CardType::Calendar);
        assert_eq!(card.data, CardData::Calendar(CalendarData::default()));

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["data"], json!({"events": []}));
    }

    #[test]
    fn test_unknown_type_coerced_to_text() {
        let card = normalize_card(json!({
            "title": "Weather",
            "type": "weather",
            "data": {"text": "Sunny all weekend"}
        }))
        .unwrap();
        assert_eq!(card.card_type(), CardType::Text);
        assert_eq!(
            card.data,
            CardData::Text(TextData {
                text: "Sunny all weekend".to_string()
            })
        );
    }

    #[test]
    fn test_missing_type_coerced_to_text() {
        let card = normalize_card(json!({"title": "Note", "data": "Bring a hat"})).unwrap();
        assert_eq!(card.card_type(), CardType::Text);
        assert_eq!(serde_json::to_value(&card).unwrap()["data"]["text"], "Bring a hat");
    }

    #[test]
    fn test_mismatched_payload_coerced_to_text() {
        let card = normalize_card(json!({
            "title": "Lots",
            "type": "parking",
            "data": {"lots": "three lots near the gate"}
        }))
        .unwrap();
        assert_eq!(card.card_type(), CardType::Text);
    }

    #[test]
    fn test_non_object_card_dropped() {
        assert!(normalize_card(json!("just a string")).is_none());
        assert!(normalize_card(json!(42)).is_none());
        let cards = normalize_cards(Some(json!([
            "bad",
            {"title": "ok", "type": "text", "data": {"text": "fine"}}
        ])));
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_cards_field_not_array() {
        assert!(normalize_cards(Some(json!({"title": "x"}))).is_empty());
        assert!(normalize_cards(None).is_empty());
    }

    #[test]
    fn test_map_coordinates_accept_strings() {
        let card = normalize_card(json!({
            "title": "Venue",
            "type": "map",
            "data": {"lat": "37.39", "lng": 126.78}
        }))
        .unwrap();
        match card.data {
            CardData::Map(map) => {
                assert_eq!(map.lat, Some(37.39));
                assert_eq!(map.lng, Some(126.78));
                assert_eq!(map.zoom_or_default(), 15);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_table_cells_accept_numbers() {
        let card = normalize_card(json!({
            "title": "Prices",
            "type": "table",
            "data": {"headers": ["Menu", "Price"], "rows": [["Hotdog", 6000]]}
        }))
        .unwrap();
        match card.data {
            CardData::Table(table) => assert_eq!(table.rows[0][1], "6000"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_numeric_parking_fields_keep_parking_type() {
        let card = normalize_card(json!({
            "title": "Parking",
            "type": "parking",
            "data": {
                "overview": "Temporary lots",
                "lots": [
                    {"name": "Lot 1", "capacity": 300, "fee": 0, "note": null},
                    {"name": 2, "address": "City Hall"}
                ]
            }
        }))
        .unwrap();
        match card.data {
            CardData::Parking(parking) => {
                assert_eq!(parking.lots[0].capacity.as_deref(), Some("300"));
                assert_eq!(parking.lots[0].fee.as_deref(), Some("0"));
                assert_eq!(parking.lots[0].note, None);
                assert_eq!(parking.lots[1].name, "2");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_null_highlight_keeps_keyvalue_type() {
        let card = normalize_card(json!({
            "title": "Admission",
            "type": "keyvalue",
            "data": {"items": [
                {"key": "Price", "value": "Free", "highlight": null},
                {"key": "Wristband", "value": "Required", "highlight": "true"}
            ]}
        }))
        .unwrap();
        match card.data {
            CardData::KeyValue(d) => {
                assert!(!d.items[0].highlight);
                assert!(d.items[1].highlight);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_food_and_calendar_accept_scalars() {
        let food = normalize_card(json!({
            "title": "Food",
            "type": "food",
            "data": {"restaurants": [{"name": "Gaetgol Kitchen", "menu": [{"name": "Hotdog", "price": 8000}]}]}
        }))
        .unwrap();
        match food.data {
            CardData::Food(d) => assert_eq!(d.restaurants[0].menu[0].price.as_deref(), Some("8000")),
            other => panic!("unexpected payload: {other:?}"),
        }

        let calendar = normalize_card(json!({
            "title": "Schedule",
            "type": "calendar",
            "data": {"events": [{"title": 20, "date": "2025-09-26", "time": "14:00", "location": null}]}
        }))
        .unwrap();
        match calendar.data {
            CardData::Calendar(d) => {
                assert_eq!(d.events[0].title, "20");
                assert_eq!(d.events[0].location, None);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_zoom_and_columns_are_clamped() {
        let map = normalize_card(json!({
            "title": "Venue",
            "type": "map",
            "data": {"address": "Siheung", "zoom": 15.5}
        }))
        .unwrap();
        match map.data {
            CardData::Map(d) => assert_eq!(d.zoom, Some(16)),
            other => panic!("unexpected payload: {other:?}"),
        }

        let grid = normalize_card(json!({
            "title": "Booths",
            "type": "grid",
            "data": {"columns": "3", "items": [{"title": "A", "fields": null}]}
        }))
        .unwrap();
        match grid.data {
            CardData::Grid(d) => {
                assert_eq!(d.columns, Some(3));
                assert!(d.items[0].fields.is_empty());
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        let huge =
            normalize_card(json!({"type": "map", "data": {"lat": 1, "lng": 2, "zoom": 900}})).unwrap();
        assert_eq!(
            huge.data,
            CardData::Map(MapData {
                lat: Some(1.0),
                lng: Some(2.0),
                zoom: Some(u8::MAX),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_serialized_shape() {
        let card = DetailCard::new(
            "Parking",
            CardData::Parking(ParkingData {
                overview: "Use the shuttle".to_string(),
                lots: vec![ParkingLot {
                    name: "Lot 1".to_string(),
                    fee: Some("Free".to_string()),
                    ..Default::default()
                }],
            }),
        );
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["title"], "Parking");
        assert_eq!(value["type"], "parking");
        assert_eq!(value["data"]["lots"][0]["fee"], "Free");
        assert!(value["data"]["lots"][0].get("address").is_none());
    }

    #[test]
    fn test_deserialize_goes_through_normalization() {
        let card: DetailCard =
            serde_json::from_str(r#"{"title":"x","type":"mystery","data":null}"#).unwrap();
        assert_eq!(card.card_type(), CardType::Text);
        assert!(serde_json::from_str::<DetailCard>("[1]").is_err());
    }
}
