#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

pub fn proptest_config() -> ProptestConfig {
    proptest_config_with_cases(64)
}

/// Config for properties that encode real images; they are slow in debug builds.
pub fn image_proptest_config() -> ProptestConfig {
    proptest_config_with_cases(12)
}

fn proptest_config_with_cases(default_cases: u32) -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default_cases);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A raw service result entry with known score and name.
#[derive(Clone, Debug, PartialEq)]
pub struct EntrySem {
    pub scientific_name: String,
    pub score: f64,
    pub common_names: Vec<Option<String>>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub image_url: Option<String>,
}

impl EntrySem {
    pub fn to_json(&self) -> Value {
        let mut species = json!({
            "scientificNameWithoutAuthor": self.scientific_name,
            "commonNames": self.common_names,
        });
        if let Some(family) = &self.family {
            species["family"] = json!({ "scientificNameWithoutAuthor": family });
        }
        if let Some(genus) = &self.genus {
            species["genus"] = json!({ "scientificNameWithoutAuthor": genus });
        }

        let mut entry = json!({ "score": self.score, "species": species });
        if let Some(url) = &self.image_url {
            entry["images"] = json!([{ "url": { "o": url, "m": url, "s": url } }]);
        }
        entry
    }

    /// Common names as the interpreter should keep them.
    pub fn expected_common_names(&self) -> Vec<String> {
        self.common_names
            .iter()
            .flatten()
            .filter(|name| !name.is_empty())
            .take(3)
            .cloned()
            .collect()
    }
}

pub fn body_for(entries: &[EntrySem]) -> String {
    let results: Vec<Value> = entries.iter().map(EntrySem::to_json).collect();
    json!({ "results": results }).to_string()
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10} [a-z]{3,12}"
}

fn optional_word() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z ]{0,12}")
}

pub fn arb_entry() -> BoxedStrategy<EntrySem> {
    (
        name_strategy(),
        0.0f64..=1.0,
        prop::collection::vec(optional_word(), 0..6),
        prop::option::of("[A-Z][a-z]{3,12}aceae"),
        prop::option::of("[A-Z][a-z]{3,12}"),
        prop::option::of("https://bs\\.plantnet\\.org/image/m/[0-9a-f]{8}"),
    )
        .prop_map(
            |(scientific_name, score, common_names, family, genus, image_url)| EntrySem {
                scientific_name,
                score,
                common_names,
                family,
                genus,
                image_url,
            },
        )
        .boxed()
}

pub fn arb_entries(max: usize) -> BoxedStrategy<Vec<EntrySem>> {
    prop::collection::vec(arb_entry(), 1..=max).boxed()
}

/// Image dimensions whose longer edge exceeds the upload limit.
///
/// The short edge stays small to keep resize and encode time reasonable.
pub fn arb_oversized_dims() -> BoxedStrategy<(u32, u32)> {
    (1025u32..=3000, 1u32..=48, any::<bool>())
        .prop_map(|(long, short, landscape)| if landscape { (long, short) } else { (short, long) })
        .boxed()
}

pub fn arb_fitting_dims() -> BoxedStrategy<(u32, u32)> {
    (1u32..=1024, 1u32..=48, any::<bool>())
        .prop_map(|(long, short, landscape)| if landscape { (long, short) } else { (short, long) })
        .boxed()
}
