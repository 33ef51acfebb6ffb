//! Structured chat response protocol.
//!
//! A chat turn asks the model for a `{summary, cards}` JSON answer, repairs
//! whatever comes back into a valid `StructuredReply`, and separately asks for
//! up to three follow-up questions.
//!
//! - `cards` - the closed card union and its normalization
//! - `reply` - parse, salvage and fallback of raw model output
//! - `prompt` - system prompts
//! - `follow_up` - follow-up suggestion parsing
//! - `service` - `ChatService`, one turn end to end
//! - `render` - `CardRenderer` and the plain-text renderer
//! - `calendar` - calendar and map exports of card payloads

mod calendar;
mod cards;
mod follow_up;
mod prompt;
mod render;
mod reply;
mod service;

pub use calendar::{CalendarEntry, CalendarError, map_search_url};
pub use cards::{
    CalendarData, CalendarEvent, CardData, CardType, DEFAULT_MAP_ZOOM, DetailCard, FoodData,
    GridData, GridField, GridItem, KeyValueData, KeyValueItem, MapData, MenuItem, ParkingData,
    ParkingLot, Restaurant, TableData, TextData, normalize_card, normalize_cards,
};
pub use follow_up::{FollowUps, MAX_FOLLOW_UPS, parse_follow_ups};
pub use prompt::{
    CARD_SCHEMA_VERSION, answer_system_prompt, follow_up_system_prompt, follow_up_user_prompt,
};
pub use render::{CardRenderer, PlainTextRenderer};
pub use reply::{
    ParseFailure, ParseOutcome, ParsedReply, StructuredReply, parse_reply, strip_code_fence,
    try_parse_reply,
};
pub use service::{
    ChatError, ChatRequest, ChatResponse, ChatResult, ChatService, ChatServiceConfig,
    HISTORY_LIMIT, HistoryEntry,
};
