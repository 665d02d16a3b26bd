//! # Actions
//!
//! Everything that can change console state, plus the wire envelope it
//! arrives in.
//!
//! ## Wire Format
//! ```json
//! { "type": "UPSERT_DEVICE", "payload": { "id": "dev-1", "name": "A" } }
//! ```
//!
//! ## Wire Names
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Action               Accepted type names                               │
//! │  ───────────────────  ─────────────────────────────────────────────     │
//! │  SelectDevice         SELECT_DEVICE, GET_DEV                            │
//! │  UpsertDevice         UPSERT_DEVICE, GET_DEV_SUCCESS,                   │
//! │                       UPDATE_DEV_SUCCESS                                │
//! │  UpsertDeviceList     UPSERT_DEVICE_LIST, GET_DEVICES_LIST_SUCCESS      │
//! │  SelectGateway        SELECT_GATEWAY, GET_GTW                           │
//! │  UpsertGateway        UPSERT_GATEWAY, GET_GTW_SUCCESS,                  │
//! │                       UPDATE_GTW_SUCCESS                                │
//! │  UpsertGatewayList    UPSERT_GATEWAY_LIST, GET_GTWS_LIST_SUCCESS        │
//! │  ListRequested        GET_<LIST>                                        │
//! │  ListSucceeded        GET_<LIST>_SUCCESS                                │
//! │  ListFailed           GET_<LIST>_FAILURE                                │
//! │                                                                         │
//! │  <LIST> = COLLABORATORS_LIST | GTW_COLLABORATORS_LIST | API_KEYS_LIST   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unknown type names decode to [`Action::Unknown`], which every reducer
//! ignores. A known type name with a malformed payload is an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use crate::ids::ID_SEPARATOR;
use crate::record::{into_record, Record};

// =============================================================================
// Parent References
// =============================================================================

/// Kind of entity that owns a list (collaborators, API keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Application,
    Gateway,
    Organization,
    User,
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentKind::Application => write!(f, "application"),
            ParentKind::Gateway => write!(f, "gateway"),
            ParentKind::Organization => write!(f, "organization"),
            ParentKind::User => write!(f, "user"),
        }
    }
}

impl FromStr for ParentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application" => Ok(ParentKind::Application),
            "gateway" => Ok(ParentKind::Gateway),
            "organization" => Ok(ParentKind::Organization),
            "user" => Ok(ParentKind::User),
            other => Err(CoreError::InvalidParentKind(other.to_string())),
        }
    }
}

/// The entity a list belongs to, e.g. `gateway/gtw-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub id: String,
}

impl ParentRef {
    pub fn new(kind: ParentKind, id: impl Into<String>) -> Self {
        ParentRef {
            kind,
            id: id.into(),
        }
    }

    /// Shorthand for a gateway parent.
    pub fn gateway(id: impl Into<String>) -> Self {
        ParentRef::new(ParentKind::Gateway, id)
    }

    /// Key under which list pages for this parent are stored.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.kind, ID_SEPARATOR, self.id)
    }
}

// =============================================================================
// List Kinds
// =============================================================================

/// The list slices kept in console state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Collaborators of any parent entity.
    Collaborators,
    /// Collaborators fetched through the gateway-specific endpoint.
    GatewayCollaborators,
    /// API keys of any parent entity.
    ApiKeys,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [
        ListKind::Collaborators,
        ListKind::GatewayCollaborators,
        ListKind::ApiKeys,
    ];

    /// Wire name of the request action; success/failure append a suffix.
    pub fn request_type(&self) -> &'static str {
        match self {
            ListKind::Collaborators => "GET_COLLABORATORS_LIST",
            ListKind::GatewayCollaborators => "GET_GTW_COLLABORATORS_LIST",
            ListKind::ApiKeys => "GET_API_KEYS_LIST",
        }
    }

    /// Parent kind assumed when a payload omits `parentType`.
    fn implied_parent(&self) -> Option<ParentKind> {
        match self {
            ListKind::GatewayCollaborators => Some(ParentKind::Gateway),
            _ => None,
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Collaborators => write!(f, "collaborators"),
            ListKind::GatewayCollaborators => write!(f, "gateway_collaborators"),
            ListKind::ApiKeys => write!(f, "api_keys"),
        }
    }
}

const SUCCESS_SUFFIX: &str = "_SUCCESS";
const FAILURE_SUFFIX: &str = "_FAILURE";

// =============================================================================
// Action
// =============================================================================

/// A state-changing event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Point the device selection at an identifier. No validation.
    SelectDevice { device_id: String },

    /// Result of a single device fetch or update.
    UpsertDevice(Record),

    /// Result of a device list fetch.
    UpsertDeviceList { entities: Vec<Record> },

    /// Point the gateway selection at an identifier.
    SelectGateway { gateway_id: String },

    /// Result of a single gateway fetch or update.
    UpsertGateway(Record),

    /// Result of a gateway list fetch.
    UpsertGatewayList { entities: Vec<Record> },

    /// Fetch intent for a list. Published to the effect layer by the store.
    ListRequested { kind: ListKind, parent: ParentRef },

    /// A list fetch completed.
    ListSucceeded {
        kind: ListKind,
        parent: ParentRef,
        entities: Vec<Value>,
        total_count: Option<u64>,
    },

    /// A list fetch failed.
    ListFailed {
        kind: ListKind,
        parent: ParentRef,
        error: String,
    },

    /// Any type name the console does not handle.
    Unknown(String),
}

impl Action {
    /// Canonical wire name of this action.
    pub fn type_name(&self) -> String {
        match self {
            Action::SelectDevice { .. } => "SELECT_DEVICE".to_string(),
            Action::UpsertDevice(_) => "UPSERT_DEVICE".to_string(),
            Action::UpsertDeviceList { .. } => "UPSERT_DEVICE_LIST".to_string(),
            Action::SelectGateway { .. } => "SELECT_GATEWAY".to_string(),
            Action::UpsertGateway(_) => "UPSERT_GATEWAY".to_string(),
            Action::UpsertGatewayList { .. } => "UPSERT_GATEWAY_LIST".to_string(),
            Action::ListRequested { kind, .. } => kind.request_type().to_string(),
            Action::ListSucceeded { kind, .. } => {
                format!("{}{}", kind.request_type(), SUCCESS_SUFFIX)
            }
            Action::ListFailed { kind, .. } => {
                format!("{}{}", kind.request_type(), FAILURE_SUFFIX)
            }
            Action::Unknown(kind) => kind.clone(),
        }
    }

    /// Returns true for fetch intents that an effect layer should act on.
    pub fn is_intent(&self) -> bool {
        matches!(self, Action::ListRequested { .. })
    }

    /// Decodes a wire envelope.
    pub fn decode(envelope: ActionEnvelope) -> CoreResult<Action> {
        let ActionEnvelope { kind, payload } = envelope;

        match kind.as_str() {
            "SELECT_DEVICE" | "GET_DEV" => {
                let p: SelectDevicePayload = parse(&kind, payload)?;
                Ok(Action::SelectDevice {
                    device_id: p.device_id,
                })
            }
            "UPSERT_DEVICE" | "GET_DEV_SUCCESS" | "UPDATE_DEV_SUCCESS" => {
                Ok(Action::UpsertDevice(parse_record(&kind, payload)?))
            }
            "UPSERT_DEVICE_LIST" | "GET_DEVICES_LIST_SUCCESS" => {
                let p: EntitiesPayload = parse(&kind, payload)?;
                Ok(Action::UpsertDeviceList {
                    entities: p.entities,
                })
            }
            "SELECT_GATEWAY" | "GET_GTW" => {
                let p: SelectGatewayPayload = parse(&kind, payload)?;
                Ok(Action::SelectGateway {
                    gateway_id: p.gateway_id,
                })
            }
            "UPSERT_GATEWAY" | "GET_GTW_SUCCESS" | "UPDATE_GTW_SUCCESS" => {
                Ok(Action::UpsertGateway(parse_record(&kind, payload)?))
            }
            "UPSERT_GATEWAY_LIST" | "GET_GTWS_LIST_SUCCESS" => {
                let p: EntitiesPayload = parse(&kind, payload)?;
                Ok(Action::UpsertGatewayList {
                    entities: p.entities,
                })
            }
            _ => match decode_list_action(&kind, payload)? {
                Some(action) => Ok(action),
                None => Ok(Action::Unknown(kind)),
            },
        }
    }

    /// Encodes this action under its canonical wire name.
    pub fn to_envelope(&self) -> ActionEnvelope {
        let payload = match self {
            Action::SelectDevice { device_id } => json!({ "deviceId": device_id }),
            Action::UpsertDevice(record) | Action::UpsertGateway(record) => {
                Value::Object(record.clone())
            }
            Action::UpsertDeviceList { entities } | Action::UpsertGatewayList { entities } => {
                json!({ "entities": entities })
            }
            Action::SelectGateway { gateway_id } => json!({ "gatewayId": gateway_id }),
            Action::ListRequested { parent, .. } => {
                json!({ "parentType": parent.kind, "id": parent.id })
            }
            Action::ListSucceeded {
                parent,
                entities,
                total_count,
                ..
            } => json!({
                "parentType": parent.kind,
                "id": parent.id,
                "entities": entities,
                "totalCount": total_count,
            }),
            Action::ListFailed { parent, error, .. } => json!({
                "parentType": parent.kind,
                "id": parent.id,
                "error": error,
            }),
            Action::Unknown(_) => Value::Null,
        };

        ActionEnvelope {
            kind: self.type_name(),
            payload,
        }
    }
}

impl TryFrom<ActionEnvelope> for Action {
    type Error = CoreError;

    fn try_from(envelope: ActionEnvelope) -> Result<Self, Self::Error> {
        Action::decode(envelope)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Tagged payload as it travels between the console and its effect layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub payload: Value,
}

impl ActionEnvelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        ActionEnvelope {
            kind: kind.into(),
            payload,
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectDevicePayload {
    device_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectGatewayPayload {
    #[serde(alias = "id")]
    gateway_id: String,
}

#[derive(Deserialize)]
struct EntitiesPayload {
    entities: Vec<Record>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPayload {
    #[serde(default)]
    parent_type: Option<String>,
    id: String,
    #[serde(default)]
    entities: Vec<Value>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    error: Value,
}

fn parse<T: serde::de::DeserializeOwned>(kind: &str, payload: Value) -> CoreResult<T> {
    serde_json::from_value(payload).map_err(|e| CoreError::invalid_payload(kind, e.to_string()))
}

fn parse_record(kind: &str, payload: Value) -> CoreResult<Record> {
    into_record(payload).ok_or_else(|| CoreError::invalid_payload(kind, "expected an object"))
}

/// Decodes `GET_<LIST>[_SUCCESS|_FAILURE]`. Returns `None` for other names.
fn decode_list_action(kind: &str, payload: Value) -> CoreResult<Option<Action>> {
    for list in ListKind::ALL {
        let Some(suffix) = kind.strip_prefix(list.request_type()) else {
            continue;
        };
        if !matches!(suffix, "" | SUCCESS_SUFFIX | FAILURE_SUFFIX) {
            continue;
        }

        let p: ListPayload = parse(kind, payload)?;
        let parent_kind = match p.parent_type {
            Some(name) => name.parse::<ParentKind>()?,
            None => list
                .implied_parent()
                .ok_or_else(|| CoreError::invalid_payload(kind, "missing parentType"))?,
        };
        let parent = ParentRef::new(parent_kind, p.id);

        let action = match suffix {
            SUCCESS_SUFFIX => Action::ListSucceeded {
                kind: list,
                parent,
                entities: p.entities,
                total_count: p.total_count,
            },
            FAILURE_SUFFIX => Action::ListFailed {
                kind: list,
                parent,
                error: match p.error {
                    Value::String(message) => message,
                    Value::Null => "unknown error".to_string(),
                    other => other.to_string(),
                },
            },
            _ => Action::ListRequested { kind: list, parent },
        };
        return Ok(Some(action));
    }
    Ok(None)
}
