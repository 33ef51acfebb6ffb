//! System prompts for the chat protocol.

use crate::core::festival::FestivalFacts;
use crate::core::language::Language;

/// Version of the card schema contract embedded in the answer prompt.
pub const CARD_SCHEMA_VERSION: &str = "2";

const CARD_SCHEMA: &str = r#"Respond with ONE JSON object and nothing else:
{
  "summary": "short answer, 1-3 sentences",
  "cards": [ { "title": "...", "type": "<card type>", "data": { ... } } ]
}

Allowed card types and their exact "data" shapes:
- "keyvalue": { "items": [ { "key": "...", "value": "...", "highlight": true|false } ] }
- "grid":     { "items": [ { "title": "...", "subtitle": "...", "badge": "...", "fields": [ { "key": "...", "value": "..." } ] } ], "columns": 1|2 }
- "table":    { "headers": ["..."], "rows": [["..."]] }
- "calendar": { "events": [ { "title": "...", "date": "YYYY-MM-DD", "time": "HH:mm~HH:mm", "location": "...", "description": "..." } ] }
- "map":      { "address": "...", "lat": 37.0, "lng": 126.0, "zoom": 15 }
- "parking":  { "overview": "...", "lots": [ { "name": "...", "address": "...", "capacity": "...", "fee": "...", "note": "..." } ] }
- "food":     { "restaurants": [ { "name": "...", "category": "...", "location": "...", "menu": [ { "name": "...", "price": "..." } ] } ] }
- "text":     { "text": "..." }
Use no other types. Optional fields may be omitted."#;

const ANSWER_RULES: &str = r#"Rules:
1. Detect the language of the user's latest message. Write the summary AND every text inside cards (titles, keys, values, headers, rows, event titles, notes) in that language. Translate festival data when it is written in another language.
2. Broad or comprehensive questions (e.g. "Is there parking?", "What programs are there?") get a summary plus the cards that fit. Narrow factual questions (e.g. "How much is parking?", "What time does it open?") get only the summary and "cards": [].
3. Answer only from FESTIVAL DATA. Never invent times, prices, places, phone numbers or program names that are not listed. When the data is silent, say so and give general guidance instead.
4. Keep the summary friendly and concise."#;

/// System prompt for the primary answer call.
pub fn answer_system_prompt(facts: &FestivalFacts) -> String {
    let name = &facts.summary().name;
    let assistant = if name.is_empty() {
        "the festival".to_string()
    } else {
        format!("'{name}'")
    };

    format!(
        "You are the official AI guide for {assistant}.\n\
         Card schema version {CARD_SCHEMA_VERSION}.\n\n\
         {CARD_SCHEMA}\n\n\
         {ANSWER_RULES}\n\n\
         FESTIVAL DATA:\n{}",
        facts.to_prompt_context()
    )
}

/// System prompt for the follow-up suggestion call.
pub fn follow_up_system_prompt(default_language: Language) -> String {
    format!(
        r#"You suggest follow-up questions for a festival guide chatbot.
Detect the language of the user's MOST RECENT message only, ignoring earlier turns.
Respond with ONE JSON object and nothing else:
{{ "label": "<'AI suggested questions' translated into that language>", "questions": ["...", "...", "..."] }}
Give 0 to 3 short questions in that same language, related to the topic just discussed, that the user is likely to ask next.
If the language cannot be detected, use {}."#,
        default_language.english_name()
    )
}

/// User content for the follow-up call: the latest message and the answer
/// that preceded it, if any.
pub fn follow_up_user_prompt(message: &str, previous_answer: Option<&str>) -> String {
    match previous_answer {
        Some(answer) => format!("Assistant: {answer}\nUser: {message}"),
        None => format!("User: {message}"),
    }
}
