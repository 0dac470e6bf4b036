use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::esi::EsiStructure;

const FUEL_EXPIRES_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Last observed state of a single structure.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureStatus {
    pub state: Option<String>,
    pub fuel_expires: Option<DateTime<Utc>>,
    pub under_attack: bool,
    pub shield_percentage: Option<f64>,
}

pub fn parse_fuel_expires(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(value, FUEL_EXPIRES_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

impl StructureStatus {
    /// Builds the status from a wire record. A malformed `fuel_expires` is
    /// returned as the error half, with the status carrying no fuel time.
    pub fn from_esi(structure: &EsiStructure) -> (Self, Option<chrono::ParseError>) {
        let (fuel_expires, error) = match structure.fuel_expires.as_deref() {
            Some(value) => match parse_fuel_expires(value) {
                Ok(fuel_expires) => (Some(fuel_expires), None),
                Err(error) => (None, Some(error)),
            },
            None => (None, None),
        };

        (
            StructureStatus {
                state: structure.state.clone(),
                fuel_expires,
                under_attack: structure.under_attack.unwrap_or(false),
                shield_percentage: structure.shield_percentage,
            },
            error,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Alert {
    UnderAttack { name: String },
    NewlyUnderAttack { name: String },
    LowFuel { name: String, expires: DateTime<Utc> },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::UnderAttack { name } => write!(f, "🚨 ALERT! `{}` is under attack!", name),
            Alert::NewlyUnderAttack { name } => {
                write!(f, "🚨 ALERT! `{}` has come under attack!", name)
            }
            Alert::LowFuel { name, expires } => write!(
                f,
                "⚠️ `{}` is low on fuel! Fuel runs out at {} UTC (<t:{}:R>).",
                name,
                expires.format("%Y-%m-%d %H:%M:%S"),
                expires.timestamp()
            ),
        }
    }
}
