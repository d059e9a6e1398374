use std::{fs, path::Path};

use bevy::prelude::*;
use serde::Deserialize;

const CONFIG_PATH: &str = "config/interaction.toml";

/// Number of discrete intensity steps above zero.
pub const MAX_INTENSITY: u8 = 3;

/// Upper bound of both arousal accumulators.
pub const ACCUMULATOR_MAX: f32 = 100.0;

#[derive(Debug, Clone, Deserialize, Default)]
struct RawInteractionConfig {
    #[serde(default)]
    timing: RawTiming,
    #[serde(default)]
    stamina: RawStamina,
    #[serde(default)]
    rates: RawRates,
    #[serde(default)]
    player: RawPlayer,
    #[serde(default)]
    partner: RawPartner,
    #[serde(default)]
    relationship: RawRelationship,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawTiming {
    tick_seconds: f32,
    enter_seconds: f32,
    ready_climax_seconds: f32,
    climax_seconds: f32,
    withdraw_seconds: f32,
    max_catch_up_ticks: u32,
}

impl Default for RawTiming {
    fn default() -> Self {
        Self {
            tick_seconds: 1.0,
            enter_seconds: 1.5,
            ready_climax_seconds: 5.0,
            climax_seconds: 10.0,
            withdraw_seconds: 1.5,
            max_catch_up_ticks: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawStamina {
    player_base: f32,
    player_per_affection: f32,
    partner_base: f32,
    partner_per_affection: f32,
}

impl Default for RawStamina {
    fn default() -> Self {
        Self {
            player_base: 2.0,
            player_per_affection: 0.0015,
            partner_base: 1.0,
            partner_per_affection: 0.0038,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawRates {
    by_intensity: [f32; 4],
}

impl Default for RawRates {
    fn default() -> Self {
        Self {
            by_intensity: [0.0, 0.55, 0.8, 1.5],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawPlayer {
    gain: f32,
    idle_decay: f32,
    hand_job_decay: f32,
    decay_floor: f32,
}

impl Default for RawPlayer {
    fn default() -> Self {
        Self {
            gain: 1.0,
            idle_decay: 0.5,
            hand_job_decay: 0.15,
            decay_floor: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawPartner {
    gain: f32,
    stimulation_gain: f32,
    idle_decay: f32,
    active_decay: f32,
    decay_floor: f32,
    promiscuity_factor: f32,
    desire_factor: f32,
    orgasm_factor: f32,
    stimulation_factor: f32,
    high_band_threshold: f32,
    high_band_multiplier: f32,
    low_band_threshold: f32,
    low_band_multiplier: f32,
}

impl Default for RawPartner {
    fn default() -> Self {
        Self {
            gain: 0.25,
            stimulation_gain: 0.1,
            idle_decay: 0.25,
            active_decay: 0.1,
            decay_floor: 0.5,
            promiscuity_factor: 0.003,
            desire_factor: 0.01,
            orgasm_factor: 0.1,
            stimulation_factor: 0.1,
            high_band_threshold: 80.0,
            high_band_multiplier: 1.5,
            low_band_threshold: 60.0,
            low_band_multiplier: 1.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRelationship {
    affection: i32,
    promiscuity: i32,
    desire: i32,
    orgasm_count: u32,
}

/// Runtime configuration derived from `config/interaction.toml`.
#[derive(Resource, Debug, Clone)]
pub struct InteractionConfig {
    pub timing: TimingConfig,
    pub stamina: StaminaConfig,
    pub rates: IntensityRates,
    pub player: PlayerArousalConfig,
    pub partner: PartnerArousalConfig,
    pub relationship: RelationshipSeed,
}

#[derive(Debug, Clone)]
pub struct TimingConfig {
    pub tick_seconds: f32,
    pub enter_seconds: f32,
    pub ready_climax_seconds: f32,
    pub climax_seconds: f32,
    pub withdraw_seconds: f32,
    /// Upper bound on simulator ticks run by one `advance` call. Time beyond it is dropped.
    pub max_catch_up_ticks: u32,
}

#[derive(Debug, Clone)]
pub struct StaminaConfig {
    pub player_base: f32,
    pub player_per_affection: f32,
    pub partner_base: f32,
    pub partner_per_affection: f32,
}

/// Gain rate per intensity step, index 0 is the stopped state.
#[derive(Debug, Clone)]
pub struct IntensityRates {
    by_intensity: [f32; 4],
}

impl IntensityRates {
    pub fn rate(&self, intensity: u8) -> f32 {
        self.by_intensity[usize::from(intensity.min(MAX_INTENSITY))]
    }
}

#[derive(Debug, Clone)]
pub struct PlayerArousalConfig {
    pub gain: f32,
    pub idle_decay: f32,
    pub hand_job_decay: f32,
    pub decay_floor: f32,
}

#[derive(Debug, Clone)]
pub struct PartnerArousalConfig {
    pub gain: f32,
    pub stimulation_gain: f32,
    pub idle_decay: f32,
    pub active_decay: f32,
    pub decay_floor: f32,
    pub promiscuity_factor: f32,
    pub desire_factor: f32,
    pub orgasm_factor: f32,
    pub stimulation_factor: f32,
    pub high_band: SensitivityBand,
    pub low_band: SensitivityBand,
}

/// Partner delight level at or above which sensitivity is multiplied.
#[derive(Debug, Clone, Copy)]
pub struct SensitivityBand {
    pub threshold: f32,
    pub multiplier: f32,
}

/// Relationship values used to seed the in-memory stats store.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipSeed {
    pub affection: i32,
    pub promiscuity: i32,
    pub desire: i32,
    pub orgasm_count: u32,
}

impl InteractionConfig {
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_PATH);
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {} ({}). Falling back to defaults.",
                    CONFIG_PATH, err
                );
                RawInteractionConfig::default().into()
            }),
            Err(err) => {
                warn!(
                    "Failed to read {} ({}). Falling back to defaults.",
                    CONFIG_PATH, err
                );
                RawInteractionConfig::default().into()
            }
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawInteractionConfig>(raw).map(Into::into)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        RawInteractionConfig::default().into()
    }
}

impl From<RawInteractionConfig> for InteractionConfig {
    fn from(value: RawInteractionConfig) -> Self {
        let timing = TimingConfig {
            tick_seconds: value.timing.tick_seconds.max(0.01),
            enter_seconds: value.timing.enter_seconds.max(0.0),
            ready_climax_seconds: value.timing.ready_climax_seconds.max(0.0),
            climax_seconds: value.timing.climax_seconds.max(0.0),
            withdraw_seconds: value.timing.withdraw_seconds.max(0.0),
            max_catch_up_ticks: value.timing.max_catch_up_ticks.max(1),
        };

        let stamina = StaminaConfig {
            player_base: value.stamina.player_base.max(0.0),
            player_per_affection: value.stamina.player_per_affection,
            partner_base: value.stamina.partner_base.max(0.0),
            partner_per_affection: value.stamina.partner_per_affection,
        };

        let mut by_intensity = value.rates.by_intensity.map(|rate| rate.max(0.0));
        by_intensity[0] = 0.0;
        let rates = IntensityRates { by_intensity };

        let player = PlayerArousalConfig {
            gain: value.player.gain.max(0.0),
            idle_decay: value.player.idle_decay.max(0.0),
            hand_job_decay: value.player.hand_job_decay.max(0.0),
            decay_floor: value.player.decay_floor.clamp(0.0, ACCUMULATOR_MAX),
        };

        let raw_partner = value.partner;
        let mut high_band = SensitivityBand {
            threshold: raw_partner.high_band_threshold.clamp(0.0, ACCUMULATOR_MAX),
            multiplier: raw_partner.high_band_multiplier.max(0.0),
        };
        let low_band = SensitivityBand {
            threshold: raw_partner.low_band_threshold.clamp(0.0, ACCUMULATOR_MAX),
            multiplier: raw_partner.low_band_multiplier.max(0.0),
        };
        if high_band.threshold < low_band.threshold {
            high_band.threshold = low_band.threshold;
        }

        let partner = PartnerArousalConfig {
            gain: raw_partner.gain.max(0.0),
            stimulation_gain: raw_partner.stimulation_gain.max(0.0),
            idle_decay: raw_partner.idle_decay.max(0.0),
            active_decay: raw_partner.active_decay.max(0.0),
            decay_floor: raw_partner.decay_floor.clamp(0.0, ACCUMULATOR_MAX),
            promiscuity_factor: raw_partner.promiscuity_factor,
            desire_factor: raw_partner.desire_factor,
            orgasm_factor: raw_partner.orgasm_factor.max(0.0),
            stimulation_factor: raw_partner.stimulation_factor.max(0.0),
            high_band,
            low_band,
        };

        let relationship = RelationshipSeed {
            affection: value.relationship.affection,
            promiscuity: value.relationship.promiscuity,
            desire: value.relationship.desire,
            orgasm_count: value.relationship.orgasm_count,
        };

        Self {
            timing,
            stamina,
            rates,
            player,
            partner,
            relationship,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_falls_back_to_defaults() {
        let config = InteractionConfig::from(RawInteractionConfig::default());
        assert_eq!(config.timing.enter_seconds, 1.5);
        assert_eq!(config.timing.ready_climax_seconds, 5.0);
        assert_eq!(config.timing.climax_seconds, 10.0);
        assert_eq!(config.timing.max_catch_up_ticks, 600);
        assert_eq!(config.rates.rate(3), 1.5);
        assert_eq!(config.partner.high_band.multiplier, 1.5);
        assert_eq!(config.partner.low_band.threshold, 60.0);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = InteractionConfig::from_toml_str(
            r#"
            [timing]
            climax_seconds = 4.0

            [relationship]
            affection = 120
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.timing.climax_seconds, 4.0);
        assert_eq!(config.timing.withdraw_seconds, 1.5);
        assert_eq!(config.relationship.affection, 120);
        assert_eq!(config.player.hand_job_decay, 0.15);
    }

    #[test]
    fn sanitises_out_of_range_values() {
        let config = InteractionConfig::from_toml_str(
            r#"
            [timing]
            tick_seconds = -1.0
            max_catch_up_ticks = 0

            [rates]
            by_intensity = [4.0, -0.5, 0.8, 1.5]

            [partner]
            high_band_threshold = 40.0
            low_band_threshold = 60.0
            "#,
        )
        .expect("config should parse");

        assert!(config.timing.tick_seconds > 0.0);
        assert_eq!(config.timing.max_catch_up_ticks, 1);
        assert_eq!(config.rates.rate(0), 0.0);
        assert_eq!(config.rates.rate(1), 0.0);
        assert_eq!(config.rates.rate(9), 1.5);
        assert!(config.partner.high_band.threshold >= config.partner.low_band.threshold);
    }
}
