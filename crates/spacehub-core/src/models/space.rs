//! Rental space model (tenant scope).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    Hourly,
    Daily,
    Monthly,
}

impl SpaceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for SpaceType {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => Err(HubError::Validation {
                message: format!("unknown space type: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Space {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub space_type: SpaceType,
    pub capacity: Option<u32>,
    pub price_per_unit: f64,
    pub is_available: bool,
    pub floor: Option<String>,
    pub area_sqm: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpace {
    pub name: String,
    pub description: Option<String>,
    pub space_type: SpaceType,
    pub capacity: Option<u32>,
    pub price_per_unit: f64,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub floor: Option<String>,
    pub area_sqm: Option<f64>,
}

fn default_available() -> bool {
    true
}
