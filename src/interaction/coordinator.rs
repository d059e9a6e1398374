//! Top-level session state machine.
//!
//! The coordinator is the only writer of channel state. It validates player
//! actions, expands them through the exclusivity rules, drives the arousal
//! simulator on a fixed tick and runs the timed phase changes:
//!
//! - Idle → Entering: `start_enter(mode)`
//! - Entering → HandJob / Thrusting: after `enter_seconds`
//! - HandJob / Thrusting → ReadyClimax: accumulator threshold event
//! - ReadyClimax → Climax*: after `ready_climax_seconds`, gated on accumulators
//! - Climax* → Idle: after `climax_seconds`, orgasm count committed
//! - any active phase → Withdrawing → Idle: `withdraw()`, after `withdraw_seconds`
use bevy::prelude::*;
use serde::Serialize;

use super::{
    action::{self, ActionEffect, ActionId},
    arousal::{ArousalEvent, ArousalSimulator, ArousalTick, StaminaBases},
    channel::{
        ChannelController, ChannelId, ChannelSet, ChannelState, ChannelTransition, ContactState,
        Expression, Side,
    },
    config::{InteractionConfig, MAX_INTENSITY},
    errors::SessionError,
    events::InteractionNotice,
    rules,
    stats::{PersistentStatsStore, RelationshipStats},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnterMode {
    Hand,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimaxKind {
    Player,
    Girl,
    Both,
}

/// Session phase. Timed phases carry their own elapsed counter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CoordinatorState {
    #[default]
    Idle,
    Entering {
        mode: EnterMode,
        elapsed: f32,
    },
    HandJob,
    Thrusting,
    ReadyClimax {
        elapsed: f32,
    },
    ClimaxPlayer {
        elapsed: f32,
    },
    ClimaxGirl {
        elapsed: f32,
    },
    ClimaxBoth {
        elapsed: f32,
    },
    Withdrawing {
        elapsed: f32,
    },
}

impl CoordinatorState {
    pub fn climax(kind: ClimaxKind) -> Self {
        match kind {
            ClimaxKind::Player => Self::ClimaxPlayer { elapsed: 0.0 },
            ClimaxKind::Girl => Self::ClimaxGirl { elapsed: 0.0 },
            ClimaxKind::Both => Self::ClimaxBoth { elapsed: 0.0 },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Entering { .. } => "entering",
            Self::HandJob => "hand job",
            Self::Thrusting => "thrusting",
            Self::ReadyClimax { .. } => "ready to climax",
            Self::ClimaxPlayer { .. } => "player climax",
            Self::ClimaxGirl { .. } => "partner climax",
            Self::ClimaxBoth { .. } => "shared climax",
            Self::Withdrawing { .. } => "withdrawing",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_hand_job(&self) -> bool {
        matches!(self, Self::HandJob)
    }

    /// HandJob or Thrusting: the phases that react to the threshold event.
    pub fn is_active_mode(&self) -> bool {
        matches!(self, Self::HandJob | Self::Thrusting)
    }

    /// Phases in which the stored intensity reaches the simulator.
    pub fn drives_intensity(&self) -> bool {
        matches!(self, Self::HandJob | Self::Thrusting | Self::ReadyClimax { .. })
    }

    /// Player channel actions and intensity changes are refused.
    pub fn locks_input(&self) -> bool {
        matches!(self, Self::ReadyClimax { .. }) || self.climax_kind().is_some()
    }

    pub fn climax_kind(&self) -> Option<ClimaxKind> {
        match self {
            Self::ClimaxPlayer { .. } => Some(ClimaxKind::Player),
            Self::ClimaxGirl { .. } => Some(ClimaxKind::Girl),
            Self::ClimaxBoth { .. } => Some(ClimaxKind::Both),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Option<f32> {
        match self {
            Self::Entering { elapsed, .. }
            | Self::ReadyClimax { elapsed }
            | Self::ClimaxPlayer { elapsed }
            | Self::ClimaxGirl { elapsed }
            | Self::ClimaxBoth { elapsed }
            | Self::Withdrawing { elapsed } => Some(*elapsed),
            Self::Idle | Self::HandJob | Self::Thrusting => None,
        }
    }

    fn advance(&mut self, delta_seconds: f32) {
        match self {
            Self::Entering { elapsed, .. }
            | Self::ReadyClimax { elapsed }
            | Self::ClimaxPlayer { elapsed }
            | Self::ClimaxGirl { elapsed }
            | Self::ClimaxBoth { elapsed }
            | Self::Withdrawing { elapsed } => *elapsed += delta_seconds,
            Self::Idle | Self::HandJob | Self::Thrusting => {}
        }
    }

    fn head_expression(&self, intensity: u8) -> Expression {
        match self {
            Self::Idle | Self::Withdrawing { .. } => Expression::Idle,
            Self::Entering { .. } | Self::ReadyClimax { .. } | Self::ClimaxPlayer { .. } => {
                Expression::Enduring
            }
            Self::HandJob | Self::Thrusting => Expression::Blushing(intensity),
            Self::ClimaxGirl { .. } | Self::ClimaxBoth { .. } => Expression::Climax,
        }
    }
}

/// Owns every piece of per-session state: phase, channels, accumulators.
#[derive(Debug, Clone)]
pub struct InteractionCoordinator {
    config: InteractionConfig,
    state: CoordinatorState,
    channels: ChannelSet,
    simulator: ArousalSimulator,
    intensity: u8,
    orgasm_count: u32,
    tick_accumulator: f32,
    resample_pending: bool,
    outbox: Vec<InteractionNotice>,
}

impl InteractionCoordinator {
    /// Wires the seven channel controllers and samples the stats store.
    pub fn start(
        config: InteractionConfig,
        controllers: Vec<ChannelController>,
        store: &dyn PersistentStatsStore,
    ) -> Result<Self, SessionError> {
        let channels = ChannelSet::wire(controllers)?;
        Ok(Self::new(config, channels, store))
    }

    pub fn new(config: InteractionConfig, channels: ChannelSet, store: &dyn PersistentStatsStore) -> Self {
        let stats = RelationshipStats::sample(store);
        let simulator = ArousalSimulator::new(stats, &config);
        let stamina = simulator.stamina();
        info!(
            "Interaction session created (affection {}, stamina bases {:.2}/{:.2})",
            stats.affection, stamina.player, stamina.partner
        );

        Self {
            config,
            state: CoordinatorState::Idle,
            channels,
            simulator,
            intensity: 0,
            orgasm_count: store.orgasm_count(),
            tick_accumulator: 0.0,
            resample_pending: false,
            outbox: Vec::new(),
        }
    }

    pub fn current_state(&self) -> CoordinatorState {
        self.state
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn channel_state(&self, id: ChannelId) -> ChannelState {
        self.channels.state(id)
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn orgasm_count(&self) -> u32 {
        self.orgasm_count
    }

    pub fn simulator(&self) -> &ArousalSimulator {
        &self.simulator
    }

    pub fn stamina(&self) -> StaminaBases {
        self.simulator.stamina()
    }

    pub fn player_ratio(&self) -> f32 {
        self.simulator.player_ratio()
    }

    pub fn partner_ratio(&self) -> f32 {
        self.simulator.partner_ratio()
    }

    pub fn is_action_legal(&self, action: ActionId) -> bool {
        action::evaluate(action, &self.state, &self.channels).is_ok()
    }

    /// Applies `action` if legal. Illegal requests change nothing and are only logged.
    pub fn request_action(&mut self, action: ActionId) -> bool {
        let effect = match action::evaluate(action, &self.state, &self.channels) {
            Ok(effect) => effect,
            Err(reason) => {
                warn!(
                    "Ignoring {} during {}: {}",
                    action,
                    self.state.label(),
                    reason
                );
                return false;
            }
        };

        match effect {
            ActionEffect::StartEnter(mode) => {
                self.resample_pending = true;
                self.transition_to(CoordinatorState::Entering { mode, elapsed: 0.0 });
            }
            ActionEffect::Channel(channel, state) => self.change_channel(channel, state),
            ActionEffect::Withdraw => {
                self.transition_to(CoordinatorState::Withdrawing { elapsed: 0.0 });
            }
        }
        true
    }

    pub fn start_enter(&mut self, mode: EnterMode) -> bool {
        self.request_action(ActionId::start(mode))
    }

    pub fn withdraw(&mut self) -> bool {
        self.request_action(ActionId::Withdraw)
    }

    /// Clamps `level` into range and broadcasts it to every channel.
    pub fn set_intensity(&mut self, level: i32) -> bool {
        if self.state.locks_input() || matches!(self.state, CoordinatorState::Withdrawing { .. }) {
            warn!(
                "Ignoring intensity change to {} during {}",
                level,
                self.state.label()
            );
            return false;
        }

        let clamped = level.clamp(0, i32::from(MAX_INTENSITY)) as u8;
        self.broadcast_intensity(clamped);
        true
    }

    /// Advances timers, runs due simulator ticks and resolves timed phase changes.
    pub fn advance(&mut self, delta_seconds: f32, store: &mut dyn PersistentStatsStore) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }

        self.channels.advance(delta_seconds);
        self.state.advance(delta_seconds);

        if self.resample_pending {
            self.begin_session(store);
        }

        let tick_seconds = self.config.timing.tick_seconds;
        let max_ticks = self.config.timing.max_catch_up_ticks;
        self.tick_accumulator += delta_seconds;
        let due = (self.tick_accumulator / tick_seconds).floor();
        self.tick_accumulator %= tick_seconds;
        if !self.tick_accumulator.is_finite() {
            self.tick_accumulator = 0.0;
        }
        if due > max_ticks as f32 {
            warn!(
                "Dropping {:.0} overdue arousal ticks, running the last {}",
                due - max_ticks as f32,
                max_ticks
            );
        }
        for _ in 0..(due as u32).min(max_ticks) {
            self.run_arousal_tick();
        }

        self.resolve_timed_transitions(store);
    }

    /// Re-reads relationship stats for a new cycle and re-derives the stamina bases.
    fn begin_session(&mut self, store: &dyn PersistentStatsStore) {
        self.resample_pending = false;
        self.simulator
            .resample(RelationshipStats::sample(store), &self.config);
        self.orgasm_count = store.orgasm_count();
        let stamina = self.simulator.stamina();
        info!(
            "Interaction session started (affection {}, stamina bases {:.2}/{:.2})",
            self.simulator.stats().affection,
            stamina.player,
            stamina.partner
        );
    }

    pub fn drain_notices(&mut self) -> Vec<InteractionNotice> {
        std::mem::take(&mut self.outbox)
    }

    fn run_arousal_tick(&mut self) {
        let intensity = if self.state.drives_intensity() {
            self.intensity
        } else {
            0
        };
        let tick = ArousalTick {
            phase: &self.state,
            intensity,
            other_stimulation: self.channels.other_stimulation_count(),
            orgasm_count: self.orgasm_count,
        };
        let event = self.simulator.step(&tick, &self.config);
        debug!(
            "Arousal tick ({}): player {:.2}, partner {:.2}",
            self.state.label(),
            self.simulator.player(),
            self.simulator.partner()
        );

        if event == Some(ArousalEvent::ThresholdCrossed) && self.state.is_active_mode() {
            self.transition_to(CoordinatorState::ReadyClimax { elapsed: 0.0 });
        }
    }

    fn resolve_timed_transitions(&mut self, store: &mut dyn PersistentStatsStore) {
        let timing = self.config.timing.clone();
        match self.state {
            CoordinatorState::Entering { mode, elapsed } if elapsed >= timing.enter_seconds => {
                let next = match mode {
                    EnterMode::Hand => CoordinatorState::HandJob,
                    EnterMode::Insert => CoordinatorState::Thrusting,
                };
                self.transition_to(next);
            }
            CoordinatorState::ReadyClimax { elapsed } if elapsed >= timing.ready_climax_seconds => {
                let kind = match (self.simulator.player_at_max(), self.simulator.partner_at_max()) {
                    (true, true) => Some(ClimaxKind::Both),
                    (false, true) => Some(ClimaxKind::Girl),
                    (true, false) => Some(ClimaxKind::Player),
                    (false, false) => None,
                };
                if let Some(kind) = kind {
                    self.transition_to(CoordinatorState::climax(kind));
                }
            }
            CoordinatorState::ClimaxPlayer { elapsed }
            | CoordinatorState::ClimaxGirl { elapsed }
            | CoordinatorState::ClimaxBoth { elapsed }
                if elapsed >= timing.climax_seconds =>
            {
                self.orgasm_count += 1;
                store.commit_orgasm_count(self.orgasm_count);
                info!("Climax resolved, orgasm count now {}", self.orgasm_count);
                self.finish_cycle();
            }
            CoordinatorState::Withdrawing { elapsed } if elapsed >= timing.withdraw_seconds => {
                self.finish_cycle();
            }
            _ => {}
        }
    }

    /// Returns every channel and both accumulators to base, then goes Idle.
    fn finish_cycle(&mut self) {
        let resets = self.channels.reset_all();
        self.record_transitions(resets);
        self.simulator.reset();
        self.intensity = 0;
        self.channels.set_intensity(0);
        self.tick_accumulator = 0.0;
        self.transition_to(CoordinatorState::Idle);
    }

    fn transition_to(&mut self, next: CoordinatorState) {
        let old = self.state;
        self.state = next;
        info!("Interaction phase {} -> {}", old.label(), next.label());
        self.outbox.push(InteractionNotice::CoordinatorChanged { old, new: next });

        match next {
            CoordinatorState::HandJob => {
                if self.channels.contact(ChannelId::RightChest).is_mirrored() {
                    self.change_channel(
                        ChannelId::RightChest,
                        ChannelState::Contact(ContactState::Idle),
                    );
                }
                self.change_channel(Side::Right.hand(), ChannelState::Contact(ContactState::Stroke));
            }
            CoordinatorState::Thrusting => {
                self.change_channel(ChannelId::Body, ChannelState::Contact(ContactState::Grasped));
            }
            CoordinatorState::Withdrawing { .. } => self.broadcast_intensity(0),
            _ => {}
        }

        if let Some(kind) = next.climax_kind() {
            info!("Climax reached: {:?}", kind);
            self.outbox.push(InteractionNotice::Climax { kind });
        }

        self.sync_head_expression();
    }

    fn broadcast_intensity(&mut self, level: u8) {
        self.intensity = level;
        let transitions = self.channels.set_intensity(level);
        self.record_transitions(transitions);
        self.sync_head_expression();
    }

    fn sync_head_expression(&mut self) {
        let head = self.channels.head();
        let expression = self.state.head_expression(self.intensity);
        if head.expression != expression {
            self.apply_plan(vec![(
                ChannelId::Head,
                ChannelState::Head(head.with_expression(expression)),
            )]);
        }
    }

    fn change_channel(&mut self, channel: ChannelId, state: ChannelState) {
        let plan = rules::plan_transition(&self.channels, channel, state);
        self.apply_plan(plan);
    }

    fn apply_plan(&mut self, plan: rules::TransitionPlan) {
        for (channel, state) in plan {
            match self.channels.enter_state(channel, state) {
                Ok(Some(transition)) => self.record_transitions(vec![transition]),
                Ok(None) => {}
                Err(err) => error!("Rejected channel transition: {}", err),
            }
        }
        debug_assert!(rules::is_consistent(&self.channels));
    }

    fn record_transitions(&mut self, transitions: Vec<ChannelTransition>) {
        for transition in transitions {
            debug!(
                "{}: {} -> {}",
                transition.channel, transition.from, transition.to
            );
            self.outbox.push(InteractionNotice::ChannelChanged {
                channel: transition.channel,
                state: transition.to,
            });
        }
    }
}
