//! Systems driving the interaction session lifecycle.
use bevy::prelude::*;

use crate::core::plugin::SimulationClock;

use super::{
    action::{self, ActionId},
    channel::{ChannelController, ChannelId, DisplayCue, Side},
    config::InteractionConfig,
    coordinator::InteractionCoordinator,
    errors::SessionError,
    events::{
        ChannelChangedEvent, ClimaxEvent, CoordinatorStateChangedEvent, InteractionNotice,
        InteractionRequest,
    },
    stats::RelationshipStore,
    telemetry::{InteractionTelemetryEvent, InteractionTelemetryLog, InteractionTelemetryRecord},
};

const ACTION_BINDINGS: [(KeyCode, ActionId); 22] = [
    (KeyCode::KeyH, ActionId::StartHandJob),
    (KeyCode::KeyT, ActionId::StartInsert),
    (KeyCode::Escape, ActionId::Withdraw),
    (KeyCode::KeyK, ActionId::Kiss),
    (KeyCode::KeyJ, ActionId::StopKiss),
    (KeyCode::KeyQ, ActionId::ChestGrasp(Side::Left)),
    (KeyCode::KeyE, ActionId::ChestGrasp(Side::Right)),
    (KeyCode::KeyW, ActionId::ChestPinch(Side::Left)),
    (KeyCode::KeyR, ActionId::ChestPinch(Side::Right)),
    (KeyCode::KeyA, ActionId::ChestSuck(Side::Left)),
    (KeyCode::KeyD, ActionId::ChestSuck(Side::Right)),
    (KeyCode::KeyX, ActionId::ChestLick(Side::Left)),
    (KeyCode::KeyV, ActionId::ChestLick(Side::Right)),
    (KeyCode::KeyZ, ActionId::ChestRelease(Side::Left)),
    (KeyCode::KeyC, ActionId::ChestRelease(Side::Right)),
    (KeyCode::KeyF, ActionId::HandMassage(Side::Left)),
    (KeyCode::KeyG, ActionId::HandRelease(Side::Left)),
    (KeyCode::KeyB, ActionId::HandMassage(Side::Right)),
    (KeyCode::KeyN, ActionId::HandRelease(Side::Right)),
    (KeyCode::KeyP, ActionId::PartnerHandGrasp),
    (KeyCode::KeyO, ActionId::PartnerHandInterlock),
    (KeyCode::KeyU, ActionId::PartnerHandRelease),
];

const INTENSITY_BINDINGS: [(KeyCode, i32); 4] = [
    (KeyCode::Digit0, 0),
    (KeyCode::Digit1, 1),
    (KeyCode::Digit2, 2),
    (KeyCode::Digit3, 3),
];

/// Display snapshot of the running session, refreshed every frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InteractionReadout {
    pub phase: &'static str,
    pub phase_elapsed: Option<f32>,
    pub intensity: u8,
    pub player_ratio: f32,
    pub partner_ratio: f32,
    pub player_stamina: f32,
    pub partner_stamina: f32,
    pub affection: i32,
    pub orgasm_count: u32,
    pub channels: Vec<ChannelReadout>,
    /// Bound actions that would be accepted right now.
    pub legal_actions: Vec<ActionId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReadout {
    pub channel: ChannelId,
    pub cue: DisplayCue,
    pub time_in_state: f32,
}

/// Holds the running session, if one could be wired.
#[derive(Resource, Debug, Default)]
pub struct ActiveInteraction {
    coordinator: Option<InteractionCoordinator>,
}

impl ActiveInteraction {
    pub fn coordinator(&self) -> Option<&InteractionCoordinator> {
        self.coordinator.as_ref()
    }

    pub fn coordinator_mut(&mut self) -> Option<&mut InteractionCoordinator> {
        self.coordinator.as_mut()
    }
}

/// Wires the seven channels and samples the stats store.
pub fn begin_interaction_session(
    config: Res<InteractionConfig>,
    store: Option<Res<RelationshipStore>>,
    mut active: ResMut<ActiveInteraction>,
) {
    let Some(store) = store else {
        error!("Interaction session not started: {}", SessionError::StoreUnavailable);
        return;
    };

    let controllers = ChannelId::ALL
        .iter()
        .copied()
        .map(ChannelController::new)
        .collect();
    match InteractionCoordinator::start((*config).clone(), controllers, store.store()) {
        Ok(coordinator) => active.coordinator = Some(coordinator),
        Err(err) => error!("Interaction session not started: {}", err),
    }
}

/// Maps keyboard shortcuts onto interaction requests.
pub fn handle_interaction_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut requests: MessageWriter<InteractionRequest>,
) {
    for (key, action) in ACTION_BINDINGS {
        if keyboard.just_pressed(key) {
            requests.write(InteractionRequest::Action(action));
        }
    }
    for (key, level) in INTENSITY_BINDINGS {
        if keyboard.just_pressed(key) {
            requests.write(InteractionRequest::SetIntensity(level));
        }
    }
}

pub fn apply_interaction_requests(
    mut requests: MessageReader<InteractionRequest>,
    mut active: ResMut<ActiveInteraction>,
) {
    let Some(coordinator) = active.coordinator_mut() else {
        requests.clear();
        return;
    };

    for request in requests.read() {
        match *request {
            InteractionRequest::Action(action) => {
                coordinator.request_action(action);
            }
            InteractionRequest::SetIntensity(level) => {
                coordinator.set_intensity(level);
            }
            InteractionRequest::SetIntensityControl(value) => {
                coordinator.set_intensity(i32::from(action::intensity_from_control(value)));
            }
        }
    }
}

pub fn advance_interaction_session(
    clock: Res<SimulationClock>,
    mut active: ResMut<ActiveInteraction>,
    store: Option<ResMut<RelationshipStore>>,
) {
    let (Some(coordinator), Some(mut store)) = (active.coordinator_mut(), store) else {
        return;
    };
    let delta_seconds = clock.last_scaled_delta().as_secs_f32();
    coordinator.advance(delta_seconds, store.store_mut());
}

pub fn update_interaction_readout(
    active: Res<ActiveInteraction>,
    mut readout: ResMut<InteractionReadout>,
) {
    let Some(coordinator) = active.coordinator() else {
        return;
    };
    let state = coordinator.current_state();
    let stamina = coordinator.stamina();

    readout.phase = state.label();
    readout.phase_elapsed = state.elapsed();
    readout.intensity = coordinator.intensity();
    readout.player_ratio = coordinator.player_ratio();
    readout.partner_ratio = coordinator.partner_ratio();
    readout.player_stamina = stamina.player;
    readout.partner_stamina = stamina.partner;
    readout.affection = coordinator.simulator().stats().affection;
    readout.orgasm_count = coordinator.orgasm_count();
    readout.channels.clear();
    readout
        .channels
        .extend(coordinator.channels().iter().map(|controller| ChannelReadout {
            channel: controller.id(),
            cue: controller.cue(),
            time_in_state: controller.time_in_state(),
        }));
    readout.legal_actions.clear();
    readout.legal_actions.extend(
        ACTION_BINDINGS
            .iter()
            .map(|(_, action)| *action)
            .filter(|action| coordinator.is_action_legal(*action)),
    );
}

/// Drains coordinator notices into messages and the telemetry log.
pub fn publish_interaction_notices(
    clock: Res<SimulationClock>,
    mut active: ResMut<ActiveInteraction>,
    mut log: ResMut<InteractionTelemetryLog>,
    mut channel_changes: MessageWriter<ChannelChangedEvent>,
    mut phase_changes: MessageWriter<CoordinatorStateChangedEvent>,
    mut climaxes: MessageWriter<ClimaxEvent>,
) {
    let Some(coordinator) = active.coordinator_mut() else {
        return;
    };
    let orgasm_count = coordinator.orgasm_count();
    let now = clock.elapsed().as_secs_f64();

    for notice in coordinator.drain_notices() {
        match notice {
            InteractionNotice::ChannelChanged { channel, state } => {
                channel_changes.write(ChannelChangedEvent { channel, state });
            }
            InteractionNotice::CoordinatorChanged { old, new } => {
                log.push(InteractionTelemetryRecord {
                    occurred_at_seconds: now,
                    event: InteractionTelemetryEvent::PhaseChanged { old, new },
                });
                phase_changes.write(CoordinatorStateChangedEvent { old, new });
            }
            InteractionNotice::Climax { kind } => {
                log.push(InteractionTelemetryRecord {
                    occurred_at_seconds: now,
                    event: InteractionTelemetryEvent::Climax { kind, orgasm_count },
                });
                climaxes.write(ClimaxEvent { kind, orgasm_count });
            }
        }
    }
}
