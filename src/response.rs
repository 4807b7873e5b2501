//! Response interpretation: turn an HTTP exchange into an [`Outcome`].
//!
//! Classification happens in a fixed order. Transport failures win over
//! any status code, then the status code is checked, and only a 200 body is
//! parsed. Per-candidate optional fields that are missing or malformed are
//! dropped quietly; the required scientific name and score are not.

use serde_json::Value;
use tracing::debug;

use crate::error::{ErrorKind, IdentifyError};
use crate::model::{Candidate, Identification, Outcome};

/// Maximum number of candidates kept from a response.
pub const MAX_CANDIDATES: usize = 5;

/// Maximum number of common names kept per candidate.
pub const MAX_COMMON_NAMES: usize = 3;

/// Failure below the HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the timeout budget.
    Timeout,
    /// DNS, TCP, TLS or I/O failure while talking to the service.
    Connection(String),
}

/// Classifies a finished (or failed) HTTP exchange.
///
/// `status` is `None` when no response was received. `body` is ignored
/// unless the status needs it.
pub fn interpret(
    status: Option<u16>,
    body: &str,
    transport_error: Option<&TransportError>,
) -> Outcome {
    match transport_error {
        Some(TransportError::Timeout) => return Err(ErrorKind::Timeout.into()),
        Some(TransportError::Connection(message)) => {
            return Err(IdentifyError::with_detail(
                ErrorKind::ConnectionFailed,
                message.clone(),
            ))
        }
        None => {}
    }

    let Some(status) = status else {
        return Err(IdentifyError::with_detail(
            ErrorKind::ConnectionFailed,
            "no response received",
        ));
    };

    match status {
        200 => parse_results(body),
        401 => Err(IdentifyError::with_detail(
            ErrorKind::InvalidCredential,
            "please check your PlantNet API key",
        )),
        413 => Err(ErrorKind::PayloadTooLarge.into()),
        400 => Err(IdentifyError::with_detail(ErrorKind::BadRequest, body)),
        other => Err(IdentifyError::with_detail(
            ErrorKind::UpstreamFailure,
            format!("status code {other}. Response: {body}"),
        )),
    }
}

/// Parses a 200 response body into ranked candidates.
pub fn parse_results(body: &str) -> Outcome {
    let json: Value = serde_json::from_str(body).map_err(|source| {
        IdentifyError::with_detail(
            ErrorKind::MalformedResponse,
            format!("body is not valid JSON: {source}"),
        )
    })?;

    let results = match json.get("results") {
        None | Some(Value::Null) => return Err(ErrorKind::NoMatch.into()),
        Some(Value::Array(results)) => results,
        Some(_) => {
            return Err(IdentifyError::with_detail(
                ErrorKind::MalformedResponse,
                "'results' is not an array",
            ))
        }
    };

    if results.is_empty() {
        return Err(ErrorKind::NoMatch.into());
    }

    let total_matches = results.len();
    let candidates = results
        .iter()
        .take(MAX_CANDIDATES)
        .enumerate()
        .map(|(index, entry)| parse_candidate(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        total_matches,
        kept = candidates.len(),
        "Parsed identification results"
    );

    Ok(Identification {
        candidates,
        total_matches,
    })
}

fn parse_candidate(index: usize, entry: &Value) -> Result<Candidate, IdentifyError> {
    let species = entry.get("species");

    let scientific_name = species
        .and_then(|s| s.get("scientificNameWithoutAuthor"))
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            IdentifyError::with_detail(
                ErrorKind::MalformedResponse,
                format!("result {index} has no scientific name"),
            )
        })?
        .to_string();

    let score = entry.get("score").and_then(Value::as_f64).ok_or_else(|| {
        IdentifyError::with_detail(
            ErrorKind::MalformedResponse,
            format!("result {index} ({scientific_name}) has no numeric score"),
        )
    })?;
    if !(0.0..=1.0).contains(&score) {
        return Err(IdentifyError::with_detail(
            ErrorKind::MalformedResponse,
            format!("result {index} ({scientific_name}) has score {score} outside [0, 1]"),
        ));
    }

    let common_names = species
        .and_then(|s| s.get("commonNames"))
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| !name.is_empty())
                .take(MAX_COMMON_NAMES)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let reference_image_url = first_reference_image(entry);
    if reference_image_url.is_none() && entry.get("images").is_some() {
        debug!(index, %scientific_name, "Reference image not available");
    }

    Ok(Candidate {
        family: taxon_name(species, "family"),
        genus: taxon_name(species, "genus"),
        scientific_name,
        common_names,
        score,
        reference_image_url,
    })
}

fn taxon_name(species: Option<&Value>, rank: &str) -> Option<String> {
    species?
        .get(rank)?
        .get("scientificNameWithoutAuthor")?
        .as_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn first_reference_image(entry: &Value) -> Option<String> {
    entry
        .get("images")?
        .as_array()?
        .first()?
        .get("url")?
        .get("m")?
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}
