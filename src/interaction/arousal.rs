//! Fixed-tick integrator for the player and partner arousal accumulators.
use super::{
    config::{InteractionConfig, StaminaConfig, ACCUMULATOR_MAX},
    coordinator::CoordinatorState,
    stats::RelationshipStats,
};

/// Stamina bases derived from affection at session creation. Display only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaminaBases {
    pub player: f32,
    pub partner: f32,
}

impl StaminaBases {
    pub fn from_affection(affection: i32, config: &StaminaConfig) -> Self {
        let affection = affection as f32;
        Self {
            player: config.player_base + affection * config.player_per_affection,
            partner: config.partner_base + affection * config.partner_per_affection,
        }
    }
}

/// Inputs sampled from the coordinator and channels for one tick.
#[derive(Debug, Clone, Copy)]
pub struct ArousalTick<'a> {
    pub phase: &'a CoordinatorState,
    pub intensity: u8,
    pub other_stimulation: u32,
    pub orgasm_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArousalEvent {
    /// An accumulator reached the maximum during HandJob or Thrusting.
    ThresholdCrossed,
}

#[derive(Debug, Clone)]
pub struct ArousalSimulator {
    stats: RelationshipStats,
    stamina: StaminaBases,
    player: f32,
    partner: f32,
    threshold_latched: bool,
}

impl ArousalSimulator {
    pub const BASELINE: f32 = 0.0;

    pub fn new(stats: RelationshipStats, config: &InteractionConfig) -> Self {
        Self {
            stats,
            stamina: StaminaBases::from_affection(stats.affection, &config.stamina),
            player: Self::BASELINE,
            partner: Self::BASELINE,
            threshold_latched: false,
        }
    }

    pub fn stats(&self) -> RelationshipStats {
        self.stats
    }

    pub fn stamina(&self) -> StaminaBases {
        self.stamina
    }

    pub fn player(&self) -> f32 {
        self.player
    }

    pub fn partner(&self) -> f32 {
        self.partner
    }

    pub fn player_ratio(&self) -> f32 {
        self.player / ACCUMULATOR_MAX
    }

    pub fn partner_ratio(&self) -> f32 {
        self.partner / ACCUMULATOR_MAX
    }

    pub fn player_at_max(&self) -> bool {
        self.player >= ACCUMULATOR_MAX
    }

    pub fn partner_at_max(&self) -> bool {
        self.partner >= ACCUMULATOR_MAX
    }

    /// Replaces the stats snapshot and stamina bases, keeping both accumulators.
    pub fn resample(&mut self, stats: RelationshipStats, config: &InteractionConfig) {
        self.stats = stats;
        self.stamina = StaminaBases::from_affection(stats.affection, &config.stamina);
    }

    /// Returns both accumulators to the session baseline.
    pub fn reset(&mut self) {
        self.player = Self::BASELINE;
        self.partner = Self::BASELINE;
        self.threshold_latched = false;
    }

    /// Partner gain multiplier for the current delight level.
    pub fn sensitivity(&self, tick: &ArousalTick<'_>, config: &InteractionConfig) -> f32 {
        let partner = &config.partner;
        let mut sensitivity = (1.0
            + self.stats.promiscuity as f32 * partner.promiscuity_factor
            + self.stats.desire as f32 * partner.desire_factor)
            * (1.0 + tick.orgasm_count as f32 * partner.orgasm_factor)
            * (1.0 + tick.other_stimulation as f32 * partner.stimulation_factor);

        if self.partner >= partner.high_band.threshold {
            sensitivity *= partner.high_band.multiplier;
        } else if self.partner >= partner.low_band.threshold {
            sensitivity *= partner.low_band.multiplier;
        }
        sensitivity
    }

    /// Advances both accumulators by one tick.
    pub fn step(
        &mut self,
        tick: &ArousalTick<'_>,
        config: &InteractionConfig,
    ) -> Option<ArousalEvent> {
        let rate = config.rates.rate(tick.intensity);

        let player = &config.player;
        if !tick.phase.is_hand_job() {
            if tick.intensity != 0 {
                self.player += player.gain * rate;
            } else if self.player > player.decay_floor {
                self.player -= player.idle_decay;
            }
        } else if self.player > player.decay_floor {
            self.player -= player.hand_job_decay;
        }

        let sensitivity = self.sensitivity(tick, config);
        let partner = &config.partner;
        if tick.intensity != 0 {
            self.partner += partner.gain * rate * sensitivity;
        } else if tick.other_stimulation != 0 {
            self.partner += partner.stimulation_gain * sensitivity;
        } else if self.partner > partner.decay_floor {
            self.partner -= if tick.phase.is_idle() {
                partner.idle_decay
            } else {
                partner.active_decay
            };
        }

        self.player = self.player.clamp(0.0, ACCUMULATOR_MAX);
        self.partner = self.partner.clamp(0.0, ACCUMULATOR_MAX);

        let at_max = self.player_at_max() || self.partner_at_max();
        if !at_max {
            self.threshold_latched = false;
            return None;
        }

        if tick.phase.is_active_mode() && !self.threshold_latched {
            self.threshold_latched = true;
            return Some(ArousalEvent::ThresholdCrossed);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::interaction::coordinator::EnterMode;

    fn stats(affection: i32, promiscuity: i32, desire: i32) -> RelationshipStats {
        RelationshipStats {
            affection,
            promiscuity,
            desire,
        }
    }

    fn tick(phase: &CoordinatorState, intensity: u8) -> ArousalTick<'_> {
        ArousalTick {
            phase,
            intensity,
            other_stimulation: 0,
            orgasm_count: 0,
        }
    }

    #[test]
    fn stamina_bases_follow_affection() {
        let config = InteractionConfig::default();
        let simulator = ArousalSimulator::new(stats(500, 0, 0), &config);
        assert!((simulator.stamina().player - 2.75).abs() < 1e-4);
        assert!((simulator.stamina().partner - 2.9).abs() < 1e-4);
    }

    #[test]
    fn player_gains_by_intensity_rate() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let phase = CoordinatorState::Thrusting;

        simulator.step(&tick(&phase, 1), &config);
        assert!((simulator.player() - 0.55).abs() < 1e-5);
        simulator.step(&tick(&phase, 3), &config);
        assert!((simulator.player() - 2.05).abs() < 1e-5);
        assert!((simulator.partner() - (0.25 * 0.55 + 0.25 * 1.5)).abs() < 1e-5);
    }

    #[test]
    fn hand_job_only_decays_player() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let thrusting = CoordinatorState::Thrusting;
        for _ in 0..4 {
            simulator.step(&tick(&thrusting, 3), &config);
        }
        let before = simulator.player();

        let hand_job = CoordinatorState::HandJob;
        simulator.step(&tick(&hand_job, 3), &config);
        assert!((simulator.player() - (before - 0.15)).abs() < 1e-5);
    }

    #[test]
    fn decay_stops_at_floor() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let thrusting = CoordinatorState::Thrusting;
        simulator.step(&tick(&thrusting, 1), &config);

        let idle = CoordinatorState::Idle;
        simulator.step(&tick(&idle, 0), &config);
        assert!((simulator.player() - 0.05).abs() < 1e-5);
        simulator.step(&tick(&idle, 0), &config);
        assert!((simulator.player() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn partner_decays_faster_when_idle() {
        let config = InteractionConfig::default();
        let thrusting = CoordinatorState::Thrusting;
        let idle = CoordinatorState::Idle;
        let withdrawing = CoordinatorState::Withdrawing { elapsed: 0.0 };

        let mut idle_sim = ArousalSimulator::new(stats(0, 0, 0), &config);
        let mut active_sim = ArousalSimulator::new(stats(0, 0, 0), &config);
        for _ in 0..10 {
            idle_sim.step(&tick(&thrusting, 3), &config);
            active_sim.step(&tick(&thrusting, 3), &config);
        }
        let start = idle_sim.partner();

        idle_sim.step(&tick(&idle, 0), &config);
        active_sim.step(&tick(&withdrawing, 0), &config);
        assert!((idle_sim.partner() - (start - 0.25)).abs() < 1e-5);
        assert!((active_sim.partner() - (start - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn secondary_stimulation_feeds_partner_without_intensity() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let idle = CoordinatorState::Idle;
        let input = ArousalTick {
            phase: &idle,
            intensity: 0,
            other_stimulation: 2,
            orgasm_count: 0,
        };
        simulator.step(&input, &config);
        assert!((simulator.partner() - 0.1 * 1.2).abs() < 1e-5);
        assert_eq!(simulator.player(), 0.0);
    }

    #[test]
    fn sensitivity_escalates_with_stats_and_history() {
        let config = InteractionConfig::default();
        let simulator = ArousalSimulator::new(stats(0, 100, 50), &config);
        let phase = CoordinatorState::Thrusting;
        let input = ArousalTick {
            phase: &phase,
            intensity: 2,
            other_stimulation: 1,
            orgasm_count: 3,
        };
        let expected = (1.0 + 0.3 + 0.5) * 1.3 * 1.1;
        assert!((simulator.sensitivity(&input, &config) - expected).abs() < 1e-4);
    }

    #[test]
    fn partner_crosses_sensitivity_bands_in_order() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let phase = CoordinatorState::Thrusting;

        let mut crossed_sixty_at = None;
        let mut crossed_eighty_at = None;
        let mut previous = simulator.partner();
        for step in 0..400 {
            simulator.step(&tick(&phase, 3), &config);
            let current = simulator.partner();
            assert!(current >= previous);
            if current < 100.0 {
                assert!(current > previous);
            }
            if crossed_sixty_at.is_none() && current >= 60.0 {
                crossed_sixty_at = Some(step);
            }
            if crossed_eighty_at.is_none() && current >= 80.0 {
                crossed_eighty_at = Some(step);
            }
            previous = current;
        }

        let sixty = crossed_sixty_at.expect("partner reaches 60");
        let eighty = crossed_eighty_at.expect("partner reaches 80");
        assert!(sixty < eighty);
    }

    #[test]
    fn threshold_event_fires_once_per_crossing() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let phase = CoordinatorState::Thrusting;

        let mut events = 0;
        for _ in 0..100 {
            if simulator.step(&tick(&phase, 3), &config).is_some() {
                events += 1;
            }
        }
        assert_eq!(events, 1);
        assert!(simulator.player_at_max());

        simulator.reset();
        assert_eq!(simulator.player(), ArousalSimulator::BASELINE);
        assert_eq!(simulator.stats(), stats(0, 0, 0));
        assert_eq!(simulator.partner(), ArousalSimulator::BASELINE);
    }

    #[test]
    fn threshold_event_only_in_active_modes() {
        let config = InteractionConfig::default();
        let mut simulator = ArousalSimulator::new(stats(0, 0, 0), &config);
        let ready = CoordinatorState::ReadyClimax { elapsed: 0.0 };
        for _ in 0..100 {
            assert!(simulator.step(&tick(&ready, 3), &config).is_none());
        }
        assert!(simulator.player_at_max());

        let entering = CoordinatorState::Entering {
            mode: EnterMode::Insert,
            elapsed: 0.0,
        };
        assert!(simulator.step(&tick(&entering, 3), &config).is_none());

        let thrusting = CoordinatorState::Thrusting;
        assert_eq!(
            simulator.step(&tick(&thrusting, 3), &config),
            Some(ArousalEvent::ThresholdCrossed)
        );
    }

    fn arb_phase() -> impl Strategy<Value = CoordinatorState> {
        prop_oneof![
            Just(CoordinatorState::Idle),
            Just(CoordinatorState::HandJob),
            Just(CoordinatorState::Thrusting),
            Just(CoordinatorState::ReadyClimax { elapsed: 0.0 }),
            Just(CoordinatorState::Withdrawing { elapsed: 0.0 }),
        ]
    }

    proptest! {
        #[test]
        fn accumulators_stay_bounded(
            promiscuity in -1000i32..5000,
            desire in -1000i32..5000,
            steps in prop::collection::vec((arb_phase(), 0u8..=3, 0u32..=6, 0u32..=50), 1..300),
        ) {
            let config = InteractionConfig::default();
            let mut simulator = ArousalSimulator::new(stats(0, promiscuity, desire), &config);
            for (phase, intensity, other_stimulation, orgasm_count) in steps {
                let input = ArousalTick { phase: &phase, intensity, other_stimulation, orgasm_count };
                simulator.step(&input, &config);
                prop_assert!((0.0..=ACCUMULATOR_MAX).contains(&simulator.player()));
                prop_assert!((0.0..=ACCUMULATOR_MAX).contains(&simulator.partner()));
            }
        }
    }
}
