use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
    AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HolidayType {
    #[default]
    National,
    Regional,
    Company,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 4,
    "date": "2026-03-26",
    "name": "Independence Day",
    "holiday_type": "national",
    "description": null
}))]
pub struct Holiday {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub name: String,
    pub holiday_type: HolidayType,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHoliday {
    #[schema(value_type = String, format = "date", example = "2026-12-16")]
    pub date: NaiveDate,
    #[schema(example = "Victory Day")]
    pub name: String,
    #[serde(default)]
    pub holiday_type: HolidayType,
    pub description: Option<String>,
}
