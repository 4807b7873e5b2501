//! Core identification types shared by the request and response sides.
//!
//! Everything here is created per request and dropped once the result has
//! been rendered. Nothing is cached or shared between invocations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IdentifyError, PlantIdError};

/// Result of one identification: ranked candidates or a classified error.
pub type Outcome = Result<Identification, IdentifyError>;

/// Flora database (region subset) the service searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Project {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "weurope")]
    WesternEurope,
    #[serde(rename = "k-world-flora")]
    KWorldFlora,
    #[serde(rename = "weeds")]
    Weeds,
    #[serde(rename = "crop")]
    Crop,
}

impl Project {
    pub const ALL: [Project; 5] = [
        Project::All,
        Project::WesternEurope,
        Project::KWorldFlora,
        Project::Weeds,
        Project::Crop,
    ];

    /// The identifier used in the service URL path.
    pub fn as_str(self) -> &'static str {
        match self {
            Project::All => "all",
            Project::WesternEurope => "weurope",
            Project::KWorldFlora => "k-world-flora",
            Project::Weeds => "weeds",
            Project::Crop => "crop",
        }
    }

    /// Human-readable label for selectors and listings.
    pub fn description(self) -> &'static str {
        match self {
            Project::All => "All flora (worldwide)",
            Project::WesternEurope => "Western Europe",
            Project::KWorldFlora => "K World Flora",
            Project::Weeds => "Weeds",
            Project::Crop => "Crops",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Project {
    type Err = PlantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Project::ALL
            .into_iter()
            .find(|project| project.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PlantIdError::UnsupportedProject(format!(
                    "'{}' (supported: all, weurope, k-world-flora, weeds, crop)",
                    s
                ))
            })
    }
}

/// The plant part shown in the photo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organ {
    #[default]
    Leaf,
    Flower,
    Fruit,
    Bark,
    /// The whole plant.
    Habit,
}

impl Organ {
    pub const ALL: [Organ; 5] = [
        Organ::Leaf,
        Organ::Flower,
        Organ::Fruit,
        Organ::Bark,
        Organ::Habit,
    ];

    /// The value sent in the `organs` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Organ::Leaf => "leaf",
            Organ::Flower => "flower",
            Organ::Fruit => "fruit",
            Organ::Bark => "bark",
            Organ::Habit => "habit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Organ::Leaf => "Leaf",
            Organ::Flower => "Flower",
            Organ::Fruit => "Fruit",
            Organ::Bark => "Bark",
            Organ::Habit => "Habit (whole plant)",
        }
    }
}

impl fmt::Display for Organ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Organ {
    type Err = PlantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Organ::ALL
            .into_iter()
            .find(|organ| organ.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PlantIdError::UnsupportedOrgan(format!(
                    "'{}' (supported: leaf, flower, fruit, bark, habit)",
                    s
                ))
            })
    }
}

/// Display bucket derived from a confidence score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// `> 0.70` is high, `(0.40, 0.70]` is medium, anything else is low.
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            ConfidenceTier::High
        } else if score > 0.4 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate species returned by the service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    /// Scientific name without author citation.
    pub scientific_name: String,

    /// Up to three non-empty common names, in service order.
    pub common_names: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,

    /// Service score in `[0, 1]`, passed through unmodified.
    pub score: f64,

    /// Medium-size reference image of the species.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image_url: Option<String>,
}

impl Candidate {
    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_score(self.score)
    }
}

/// A successful identification.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identification {
    /// Top candidates in the order the service ranked them. Never empty.
    pub candidates: Vec<Candidate>,

    /// Number of results the service returned before truncation.
    pub total_matches: usize,
}

impl Identification {
    /// The first (highest ranked) candidate.
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}
