//! Notifications published to UI, audio and animation collaborators.
use bevy::prelude::{Event, Message};

use super::{
    action::ActionId,
    channel::{ChannelId, ChannelState},
    coordinator::{ClimaxKind, CoordinatorState},
};

/// Queued by the coordinator while it runs; drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionNotice {
    ChannelChanged {
        channel: ChannelId,
        state: ChannelState,
    },
    CoordinatorChanged {
        old: CoordinatorState,
        new: CoordinatorState,
    },
    Climax {
        kind: ClimaxKind,
    },
}

/// Fired after a channel finished its exit/enter pair.
#[derive(Event, Message, Debug, Clone)]
pub struct ChannelChangedEvent {
    pub channel: ChannelId,
    pub state: ChannelState,
}

/// Fired when the session moves to a new phase.
#[derive(Event, Message, Debug, Clone)]
pub struct CoordinatorStateChangedEvent {
    pub old: CoordinatorState,
    pub new: CoordinatorState,
}

/// Fired when a climax phase begins. `orgasm_count` is the total before this climax.
#[derive(Event, Message, Debug, Clone)]
pub struct ClimaxEvent {
    pub kind: ClimaxKind,
    pub orgasm_count: u32,
}

/// Player input forwarded from the UI layer.
#[derive(Event, Message, Debug, Clone, Copy)]
pub enum InteractionRequest {
    Action(ActionId),
    SetIntensity(i32),
    /// Analog control in `[0, 1]`, quantised onto the intensity steps.
    SetIntensityControl(f32),
}
