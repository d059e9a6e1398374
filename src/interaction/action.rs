//! Player actions and the legality rules the UI layer queries before offering them.
use std::fmt;

use serde::Serialize;

use super::{
    channel::{ChannelId, ChannelSet, ChannelState, ContactState, PartnerHandState, Side},
    config::MAX_INTENSITY,
    coordinator::{CoordinatorState, EnterMode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "action", content = "side", rename_all = "snake_case")]
pub enum ActionId {
    StartHandJob,
    StartInsert,
    Kiss,
    StopKiss,
    ChestGrasp(Side),
    ChestPinch(Side),
    ChestSuck(Side),
    ChestLick(Side),
    ChestRelease(Side),
    HandMassage(Side),
    HandRelease(Side),
    PartnerHandGrasp,
    PartnerHandInterlock,
    PartnerHandRelease,
    Withdraw,
}

impl ActionId {
    pub fn start(mode: EnterMode) -> Self {
        match mode {
            EnterMode::Hand => Self::StartHandJob,
            EnterMode::Insert => Self::StartInsert,
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChestGrasp(side)
            | Self::ChestPinch(side)
            | Self::ChestSuck(side)
            | Self::ChestLick(side)
            | Self::ChestRelease(side)
            | Self::HandMassage(side)
            | Self::HandRelease(side) => {
                let name = format!("{:?}", self);
                let base = name.split('(').next().unwrap_or_default();
                write!(f, "{} ({:?})", base, side)
            }
            other => write!(f, "{:?}", other),
        }
    }
}

/// What an accepted action does once the coordinator applies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionEffect {
    StartEnter(EnterMode),
    Channel(ChannelId, ChannelState),
    Withdraw,
}

/// Why an action was refused. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalAction {
    WrongPhase(&'static str),
    InputLocked,
    AlreadyActive,
    ChestsClamped,
    HandsOccupied,
    HandBusy,
}

impl fmt::Display for IllegalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPhase(phase) => write!(f, "not available while {}", phase),
            Self::InputLocked => write!(f, "input is locked until the climax resolves"),
            Self::AlreadyActive => write!(f, "already active"),
            Self::ChestsClamped => write!(f, "chest regions are covered by the partner's hand"),
            Self::HandsOccupied => write!(f, "hands are held by the partner"),
            Self::HandBusy => write!(f, "right hand is busy with the current mode"),
        }
    }
}

/// Decides whether `action` is legal and what it would change.
pub fn evaluate(
    action: ActionId,
    phase: &CoordinatorState,
    channels: &ChannelSet,
) -> Result<ActionEffect, IllegalAction> {
    match action {
        ActionId::StartHandJob | ActionId::StartInsert => {
            if !phase.is_idle() {
                return Err(IllegalAction::WrongPhase(phase.label()));
            }
            if action == ActionId::StartHandJob && channels.partner_hand() != PartnerHandState::Idle {
                return Err(IllegalAction::HandsOccupied);
            }
            let mode = if action == ActionId::StartHandJob {
                EnterMode::Hand
            } else {
                EnterMode::Insert
            };
            Ok(ActionEffect::StartEnter(mode))
        }
        ActionId::Withdraw => {
            if phase.is_idle() {
                return Err(IllegalAction::WrongPhase(phase.label()));
            }
            Ok(ActionEffect::Withdraw)
        }
        _ => {
            if phase.locks_input() {
                return Err(IllegalAction::InputLocked);
            }
            if matches!(phase, CoordinatorState::Withdrawing { .. }) {
                return Err(IllegalAction::WrongPhase(phase.label()));
            }
            let (channel, state) = channel_request(action, phase, channels)?;
            if channels.state(channel) == state {
                return Err(IllegalAction::AlreadyActive);
            }
            Ok(ActionEffect::Channel(channel, state))
        }
    }
}

fn channel_request(
    action: ActionId,
    phase: &CoordinatorState,
    channels: &ChannelSet,
) -> Result<(ChannelId, ChannelState), IllegalAction> {
    let hand_job = phase.is_hand_job();
    let hand_mode = hand_job
        || matches!(
            phase,
            CoordinatorState::Entering {
                mode: EnterMode::Hand,
                ..
            }
        );
    let partner_hand = channels.partner_hand();

    let chest = |side: Side, next: ContactState| {
        if partner_hand != PartnerHandState::Idle {
            return Err(IllegalAction::ChestsClamped);
        }
        if hand_job && side == Side::Right && (next.is_mirrored() || channels.contact(side.chest()).is_mirrored()) {
            return Err(IllegalAction::HandBusy);
        }
        Ok((side.chest(), ChannelState::Contact(next)))
    };

    let hand = |side: Side, next: ContactState| {
        if partner_hand != PartnerHandState::Idle {
            return Err(IllegalAction::HandsOccupied);
        }
        if hand_job && side == Side::Right {
            return Err(IllegalAction::HandBusy);
        }
        Ok((side.hand(), ChannelState::Contact(next)))
    };

    let partner = |next: PartnerHandState| {
        if hand_mode {
            return Err(IllegalAction::HandBusy);
        }
        Ok((ChannelId::PartnerHand, ChannelState::PartnerHand(next)))
    };

    let head = channels.head();
    match action {
        ActionId::Kiss => Ok((ChannelId::Head, ChannelState::Head(head.with_kissing(true)))),
        ActionId::StopKiss => Ok((ChannelId::Head, ChannelState::Head(head.with_kissing(false)))),
        ActionId::ChestGrasp(side) => chest(side, ContactState::Grasp),
        ActionId::ChestPinch(side) => chest(side, ContactState::Pinch),
        ActionId::ChestSuck(side) => chest(side, ContactState::Suck),
        ActionId::ChestLick(side) => chest(side, ContactState::Lick),
        ActionId::ChestRelease(side) => chest(side, ContactState::Idle),
        ActionId::HandMassage(side) => hand(side, ContactState::Massage),
        ActionId::HandRelease(side) => hand(side, ContactState::Idle),
        ActionId::PartnerHandGrasp => partner(PartnerHandState::Grasped),
        ActionId::PartnerHandInterlock => partner(PartnerHandState::Interlocked),
        ActionId::PartnerHandRelease => partner(PartnerHandState::Idle),
        ActionId::StartHandJob | ActionId::StartInsert | ActionId::Withdraw => {
            Err(IllegalAction::WrongPhase(phase.label()))
        }
    }
}

/// Maps a continuous control in `[0, 1]` onto the discrete intensity steps.
pub fn intensity_from_control(value: f32) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * f32::from(MAX_INTENSITY)).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_actions_only_from_idle() {
        let channels = ChannelSet::standard();
        assert_eq!(
            evaluate(ActionId::StartInsert, &CoordinatorState::Idle, &channels),
            Ok(ActionEffect::StartEnter(EnterMode::Insert))
        );
        assert_eq!(
            evaluate(ActionId::StartHandJob, &CoordinatorState::Thrusting, &channels),
            Err(IllegalAction::WrongPhase("thrusting"))
        );
    }

    #[test]
    fn withdraw_legal_in_any_non_idle_phase() {
        let channels = ChannelSet::standard();
        assert_eq!(
            evaluate(ActionId::Withdraw, &CoordinatorState::Idle, &channels),
            Err(IllegalAction::WrongPhase("idle"))
        );
        assert_eq!(
            evaluate(
                ActionId::Withdraw,
                &CoordinatorState::Withdrawing { elapsed: 0.2 },
                &channels
            ),
            Ok(ActionEffect::Withdraw)
        );
        assert_eq!(
            evaluate(
                ActionId::Withdraw,
                &CoordinatorState::ClimaxGirl { elapsed: 3.0 },
                &channels
            ),
            Ok(ActionEffect::Withdraw)
        );
    }

    #[test]
    fn channel_actions_locked_during_climax_sequence() {
        let channels = ChannelSet::standard();
        for phase in [
            CoordinatorState::ReadyClimax { elapsed: 0.0 },
            CoordinatorState::ClimaxBoth { elapsed: 1.0 },
        ] {
            assert_eq!(
                evaluate(ActionId::Kiss, &phase, &channels),
                Err(IllegalAction::InputLocked)
            );
        }
    }

    #[test]
    fn right_side_busy_during_hand_job() {
        let channels = ChannelSet::standard();
        let phase = CoordinatorState::HandJob;
        assert_eq!(
            evaluate(ActionId::ChestGrasp(Side::Right), &phase, &channels),
            Err(IllegalAction::HandBusy)
        );
        assert_eq!(
            evaluate(ActionId::HandMassage(Side::Right), &phase, &channels),
            Err(IllegalAction::HandBusy)
        );
        assert!(evaluate(ActionId::ChestSuck(Side::Right), &phase, &channels).is_ok());
        assert!(evaluate(ActionId::ChestGrasp(Side::Left), &phase, &channels).is_ok());
        assert_eq!(
            evaluate(ActionId::PartnerHandGrasp, &phase, &channels),
            Err(IllegalAction::HandBusy)
        );

        let entering = CoordinatorState::Entering {
            mode: EnterMode::Hand,
            elapsed: 0.5,
        };
        assert_eq!(
            evaluate(ActionId::PartnerHandInterlock, &entering, &channels),
            Err(IllegalAction::HandBusy)
        );
    }

    #[test]
    fn repeating_active_variant_is_illegal() {
        let channels = ChannelSet::standard();
        assert_eq!(
            evaluate(ActionId::StopKiss, &CoordinatorState::Thrusting, &channels),
            Err(IllegalAction::AlreadyActive)
        );
        assert_eq!(
            evaluate(ActionId::ChestRelease(Side::Left), &CoordinatorState::Idle, &channels),
            Err(IllegalAction::AlreadyActive)
        );
    }

    #[test]
    fn maps_continuous_control_to_steps() {
        assert_eq!(intensity_from_control(0.0), 0);
        assert_eq!(intensity_from_control(0.2), 1);
        assert_eq!(intensity_from_control(0.5), 2);
        assert_eq!(intensity_from_control(0.9), 3);
        assert_eq!(intensity_from_control(4.0), 3);
        assert_eq!(intensity_from_control(-1.0), 0);
        assert_eq!(intensity_from_control(f32::NAN), 0);
    }

    #[test]
    fn display_names_side() {
        assert_eq!(ActionId::ChestLick(Side::Left).to_string(), "ChestLick (Left)");
        assert_eq!(ActionId::Kiss.to_string(), "Kiss");
    }
}
