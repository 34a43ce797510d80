use once_cell::sync::Lazy;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Operational state of a service point.
///
/// Deserialization accepts every legacy spelling understood by
/// [`ServicePointStatus::normalize`], so request bodies and query strings
/// may carry `"работает"`, `1` or `true` and still land on a canonical value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServicePointStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// A status value as it arrives from legacy clients.
///
/// `Other` catches every remaining JSON shape (`null`, arrays, objects) so a
/// strange status never fails the surrounding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStatus {
    Flag(bool),
    Code(i64),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

static STATUS_ALIASES: Lazy<HashMap<&'static str, ServicePointStatus>> = Lazy::new(|| {
    use ServicePointStatus::*;

    HashMap::from([
        ("active", Active),
        ("suspended", Suspended),
        ("closed", Closed),
        // english leftovers from older admin builds
        ("enabled", Active),
        ("open", Active),
        ("working", Active),
        ("inactive", Suspended),
        ("disabled", Suspended),
        ("paused", Suspended),
        ("temporarily_closed", Suspended),
        // legacy russian labels
        ("активна", Active),
        ("активный", Active),
        ("активен", Active),
        ("работает", Active),
        ("открыта", Active),
        ("приостановлена", Suspended),
        ("приостановлен", Suspended),
        ("временно закрыта", Suspended),
        ("временно не работает", Suspended),
        ("неактивна", Suspended),
        ("закрыта", Closed),
        ("закрыт", Closed),
        ("не работает", Closed),
        // numeric codes and is_active flags sent as strings
        ("1", Active),
        ("true", Active),
        ("0", Suspended),
        ("false", Suspended),
        ("2", Suspended),
        ("3", Closed),
    ])
});

impl ServicePointStatus {
    /// Looks up a textual status. Matching ignores case and surrounding whitespace.
    pub fn lookup(input: &str) -> Option<Self> {
        let key = input.trim().to_lowercase();
        STATUS_ALIASES.get(key.as_str()).copied()
    }

    /// Maps any legacy input to a canonical status; unknown inputs become `Active`.
    pub fn normalize(raw: &RawStatus) -> Self {
        Self::recognize(raw).unwrap_or_default()
    }

    /// Like [`normalize`](Self::normalize) but reports unknown inputs as `None`.
    pub fn recognize(raw: &RawStatus) -> Option<Self> {
        match raw {
            RawStatus::Flag(true) => Some(Self::Active),
            RawStatus::Flag(false) => Some(Self::Suspended),
            RawStatus::Code(code) => Self::lookup(&code.to_string()),
            RawStatus::Number(value) => {
                integral(*value).and_then(|code| Self::lookup(&code.to_string()))
            }
            RawStatus::Text(text) => Self::lookup(text),
            RawStatus::Other(_) => None,
        }
    }

    pub fn normalize_str(input: &str) -> Self {
        Self::lookup(input).unwrap_or_default()
    }

    /// Only active points take new schedules and bookings.
    pub fn accepts_bookings(self) -> bool {
        self == Self::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        }
    }
}

/// `1.0` counts as code 1; fractional and non-finite values are no code at all.
fn integral(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value <= i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then(|| value as i64)
}

impl<'de> Deserialize<'de> for ServicePointStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawStatus::deserialize(deserializer).map(|raw| Self::normalize(&raw))
    }
}

impl From<RawStatus> for ServicePointStatus {
    fn from(raw: RawStatus) -> Self {
        Self::normalize(&raw)
    }
}
