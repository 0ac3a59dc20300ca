//! Named player-model presets loaded from the embedded catalog.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::ModelConfigError;
use crate::player::{PlayerModel, ShootingPolicy};

const DEFAULT_MODEL_DATA: &str = include_str!("../data/models.json");

/// One named behavior: a policy applied on top of each player's base rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub policy: ShootingPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelCatalog {
    #[serde(default)]
    pub presets: Vec<ModelPreset>,
}

impl ModelCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_MODEL_DATA).unwrap_or_default()
    }

    /// Parse a catalog, dropping presets whose policy fails validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a model catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.presets.retain(|preset| match preset.policy.validate() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("skipping model preset `{}`: {err}", preset.name);
                false
            }
        });
        Ok(catalog)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelPreset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|preset| preset.name.as_str())
    }

    /// Instantiate the named preset for a player with the given base rate.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreset` for a name not in the catalog, or the model's
    /// own validation error when `base_probability` is out of range.
    pub fn build(
        &self,
        name: &str,
        base_probability: f64,
    ) -> Result<PlayerModel, ModelConfigError> {
        let preset = self
            .get(name)
            .ok_or_else(|| ModelConfigError::UnknownPreset {
                name: name.to_string(),
            })?;
        PlayerModel::new(base_probability, preset.policy.clone())
    }
}

/// Process-wide catalog parsed from the embedded preset file.
#[must_use]
pub fn model_catalog() -> &'static ModelCatalog {
    static CATALOG: OnceLock<ModelCatalog> = OnceLock::new();
    CATALOG.get_or_init(ModelCatalog::load_from_static)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{ProbabilityModel, ThresholdParams, WindowTable};

    #[test]
    fn embedded_catalog_loads_every_preset() {
        let names: Vec<&str> = model_catalog().names().collect();
        assert_eq!(
            names,
            vec![
                "normal",
                "constant",
                "lukewarm",
                "only_heat_check",
                "get_a_bucket",
                "truly_streaky",
                "last_five",
                "shot_mix",
            ]
        );
    }

    #[test]
    fn threshold_presets_match_constructors() {
        let catalog = model_catalog();
        let expect = [
            ("normal", ThresholdParams::neutral()),
            ("lukewarm", ThresholdParams::lukewarm()),
            ("only_heat_check", ThresholdParams::heat_check()),
            ("get_a_bucket", ThresholdParams::get_a_bucket()),
            ("truly_streaky", ThresholdParams::truly_streaky()),
        ];
        for (name, params) in expect {
            let preset = catalog.get(name).unwrap();
            assert_eq!(
                preset.policy,
                ShootingPolicy::ThresholdAdaptive(params),
                "preset {name}"
            );
        }
    }

    #[test]
    fn last_five_uses_offset_table() {
        let preset = model_catalog().get("last_five").unwrap();
        assert!(matches!(
            preset.policy,
            ShootingPolicy::RecentWindow {
                window: 5,
                mode: WindowTable::Offset,
                ..
            }
        ));
    }

    #[test]
    fn build_applies_base_rate_and_rejects_unknown() {
        let mut rng = crate::rng::TrialRng::from_user_seed(1);
        let model = model_catalog().build("normal", 0.41).unwrap();
        assert!((model.next_success_probability(&mut rng) - 0.41).abs() < f64::EPSILON);
        assert!(matches!(
            model_catalog().build("heroball", 0.5),
            Err(ModelConfigError::UnknownPreset { .. })
        ));
        assert!(matches!(
            model_catalog().build("lukewarm", 1.5),
            Err(ModelConfigError::RangeViolation { .. })
        ));
    }

    #[test]
    fn invalid_presets_are_dropped() {
        let json = r#"{
            "presets": [
                { "name": "ok", "policy": { "policy": "constant" } },
                {
                    "name": "broken",
                    "policy": { "policy": "recent_window", "window": 2, "table": [0.5] }
                }
            ]
        }"#;
        let catalog = ModelCatalog::from_json(json).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["ok"]);
        assert!(ModelCatalog::from_json("not json").is_err());
    }
}
