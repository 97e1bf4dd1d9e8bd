//! Browser bindings. Each entry point takes one JSON payload holding the
//! planner's record tables plus the operation's parameters, and returns the
//! serialized result. Errors come back as strings.

use chrono::NaiveDate;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::planner::Planner;
use crate::roster::Duty;
use crate::suggest::{SlotRequest, SuggestConfig};

fn js_err<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Whose free time an operation is about: a GM's or a room's.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum Resource {
    #[serde(rename_all = "camelCase")]
    Gm { user_id: String },
    #[serde(rename_all = "camelCase")]
    Room { room_id: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarBlocksPayload {
    #[serde(flatten)]
    planner: Planner,
    from: NaiveDate,
    days: u32,
}

#[wasm_bindgen(js_name = calendarBlocks)]
pub fn calendar_blocks(payload: JsValue) -> Result<JsValue, JsValue> {
    let mut payload: CalendarBlocksPayload =
        serde_wasm_bindgen::from_value(payload).map_err(js_err)?;
    payload.planner.sort();

    let rows = payload
        .planner
        .calendar(payload.from, payload.days)
        .map_err(js_err)?;

    serde_wasm_bindgen::to_value(&rows).map_err(js_err)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeRangesPayload {
    #[serde(flatten)]
    planner: Planner,
    date: NaiveDate,
    #[serde(flatten)]
    resource: Resource,
}

#[wasm_bindgen(js_name = freeRanges)]
pub fn free_ranges(payload: JsValue) -> Result<JsValue, JsValue> {
    let mut payload: FreeRangesPayload =
        serde_wasm_bindgen::from_value(payload).map_err(js_err)?;
    payload.planner.sort();

    let free = match &payload.resource {
        Resource::Gm { user_id } => payload.planner.gm_free(user_id, payload.date),
        Resource::Room { room_id } => payload
            .planner
            .room_free(room_id, payload.date)
            .map_err(js_err)?,
    };

    serde_wasm_bindgen::to_value(&free).map_err(js_err)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestSlotsPayload {
    #[serde(flatten)]
    planner: Planner,
    request: SlotRequest,
    #[serde(default)]
    config: SuggestConfig,
    #[serde(flatten)]
    resource: Resource,
}

#[wasm_bindgen(js_name = suggestSlots)]
pub fn suggest_slots(payload: JsValue) -> Result<JsValue, JsValue> {
    let mut payload: SuggestSlotsPayload =
        serde_wasm_bindgen::from_value(payload).map_err(js_err)?;
    payload.planner.sort();

    let suggestions = match &payload.resource {
        Resource::Gm { user_id } => {
            payload
                .planner
                .suggest_gm(&payload.request, user_id, &payload.config)
        }
        Resource::Room { room_id } => {
            payload
                .planner
                .suggest_room(&payload.request, room_id, &payload.config)
        }
    }
    .map_err(js_err)?;

    serde_wasm_bindgen::to_value(&suggestions).map_err(js_err)
}

fn default_required() -> Vec<Duty> {
    vec![Duty::Reception, Duty::Runner]
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterIssuesPayload {
    #[serde(flatten)]
    planner: Planner,
    from: NaiveDate,
    days: u32,
    #[serde(default = "default_required")]
    required: Vec<Duty>,
}

#[wasm_bindgen(js_name = rosterIssues)]
pub fn roster_issues(payload: JsValue) -> Result<JsValue, JsValue> {
    let mut payload: RosterIssuesPayload =
        serde_wasm_bindgen::from_value(payload).map_err(js_err)?;
    payload.planner.sort();

    let issues = payload
        .planner
        .reconcile(payload.from, payload.days, &payload.required);

    serde_wasm_bindgen::to_value(&issues).map_err(js_err)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventOccurrencesPayload {
    #[serde(flatten)]
    planner: Planner,
    from: NaiveDate,
    to: NaiveDate,
}

#[wasm_bindgen(js_name = eventOccurrences)]
pub fn event_occurrences(payload: JsValue) -> Result<JsValue, JsValue> {
    let mut payload: EventOccurrencesPayload =
        serde_wasm_bindgen::from_value(payload).map_err(js_err)?;
    payload.planner.sort();

    let occurrences = payload.planner.occurrences(payload.from, payload.to);

    serde_wasm_bindgen::to_value(&occurrences).map_err(js_err)
}
