//! Analysis period for the priority workflow.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Time period a priority analysis covers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Today,
    Week,
}

impl Period {
    /// Number of days of transcripts to look back over.
    pub fn lookback_days(&self) -> u32 {
        match self {
            Period::Today => 1,
            Period::Week => 7,
        }
    }

    /// Human readable hint handed to the extractor and used in report titles.
    pub fn describe(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "this week",
        }
    }
}
