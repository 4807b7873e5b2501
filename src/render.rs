//! Terminal and JSON formatting for identification results.

use std::fmt;

use serde::Serialize;

use crate::error::IdentifyError;
use crate::model::{Candidate, ConfidenceTier, Identification};

/// Default width of the confidence bar, in characters.
pub const DEFAULT_BAR_WIDTH: usize = 20;

/// Text report for a successful identification.
#[derive(Clone, Debug)]
pub struct IdentificationReport<'a> {
    identification: &'a Identification,
    bar_width: usize,
}

impl<'a> IdentificationReport<'a> {
    pub fn new(identification: &'a Identification) -> Self {
        Self {
            identification,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }

    pub fn with_bar_width(mut self, bar_width: usize) -> Self {
        self.bar_width = bar_width;
        self
    }
}

impl fmt::Display for IdentificationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.identification.candidates.len();
        let total = self.identification.total_matches;

        write!(f, "Found {} possible match", total)?;
        if total != 1 {
            write!(f, "es")?;
        }
        if total > shown {
            write!(f, " (showing top {})", shown)?;
        }
        writeln!(f, "!")?;

        for (index, candidate) in self.identification.candidates.iter().enumerate() {
            writeln!(f)?;
            fmt_candidate(f, index, candidate, self.bar_width)?;
        }

        Ok(())
    }
}

fn fmt_candidate(
    f: &mut fmt::Formatter<'_>,
    index: usize,
    candidate: &Candidate,
    bar_width: usize,
) -> fmt::Result {
    write!(
        f,
        "{:>2}. [{}] {} ({:.1}% confidence)",
        index + 1,
        candidate.tier(),
        candidate.scientific_name,
        candidate.score * 100.0
    )?;
    if index == 0 {
        write!(f, "  <- best match")?;
    }
    writeln!(f)?;

    writeln!(f, "    Scientific name:  {}", candidate.scientific_name)?;
    if !candidate.common_names.is_empty() {
        writeln!(f, "    Common names:     {}", candidate.common_names.join(", "))?;
    }
    if let Some(family) = &candidate.family {
        writeln!(f, "    Family:           {}", family)?;
    }
    if let Some(genus) = &candidate.genus {
        writeln!(f, "    Genus:            {}", genus)?;
    }
    match &candidate.reference_image_url {
        Some(url) => writeln!(f, "    Reference image:  {}", url)?,
        None => writeln!(f, "    Reference image:  not available")?,
    }
    writeln!(
        f,
        "    Confidence score: {} {:.2}%",
        render_bar(candidate.score, bar_width),
        candidate.score * 100.0
    )
}

#[derive(Serialize)]
struct CandidateJson<'a> {
    #[serde(flatten)]
    candidate: &'a Candidate,
    tier: ConfidenceTier,
}

#[derive(Serialize)]
struct IdentificationJson<'a> {
    total_matches: usize,
    candidates: Vec<CandidateJson<'a>>,
}

#[derive(Serialize)]
struct ErrorJson<'a> {
    error: &'a IdentifyError,
    message: String,
}

/// Pretty JSON for a successful identification, with derived tiers.
pub fn identification_to_json(identification: &Identification) -> Result<String, serde_json::Error> {
    let view = IdentificationJson {
        total_matches: identification.total_matches,
        candidates: identification
            .candidates
            .iter()
            .map(|candidate| CandidateJson {
                candidate,
                tier: candidate.tier(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&view)
}

/// Pretty JSON for a failed identification.
pub fn error_to_json(error: &IdentifyError) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ErrorJson {
        error,
        message: error.to_string(),
    })
}

/// Render a progress bar for a score in `[0, 1]` using Unicode blocks.
fn render_bar(score: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let filled = (score.clamp(0.0, 1.0) * width as f64).round() as usize;
    let filled = filled.min(width);

    "█".repeat(filled) + &"░".repeat(width - filled)
}
