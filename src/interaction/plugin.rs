//! Interaction plugin wiring config, the stats store and session systems.
use bevy::prelude::*;

use crate::core::plugin::update_simulation_clock;

use super::{
    config::InteractionConfig,
    events::{ChannelChangedEvent, ClimaxEvent, CoordinatorStateChangedEvent, InteractionRequest},
    stats::{InMemoryStatsStore, RelationshipStore},
    systems::{
        advance_interaction_session, apply_interaction_requests, begin_interaction_session,
        handle_interaction_input, publish_interaction_notices, update_interaction_readout,
        ActiveInteraction, InteractionReadout,
    },
    telemetry::{flush_interaction_telemetry_log, InteractionTelemetryLog},
};

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        let config = InteractionConfig::load_or_default();
        let store = InMemoryStatsStore::from(config.relationship);

        app.insert_resource(RelationshipStore::new(Box::new(store)))
            .insert_resource(config)
            .init_resource::<ActiveInteraction>()
            .init_resource::<InteractionReadout>()
            .init_resource::<InteractionTelemetryLog>()
            .add_message::<InteractionRequest>()
            .add_message::<ChannelChangedEvent>()
            .add_message::<CoordinatorStateChangedEvent>()
            .add_message::<ClimaxEvent>()
            .add_systems(Startup, begin_interaction_session)
            .add_systems(
                Update,
                (
                    handle_interaction_input,
                    apply_interaction_requests,
                    advance_interaction_session,
                    update_interaction_readout,
                    publish_interaction_notices,
                    flush_interaction_telemetry_log,
                )
                    .chain()
                    .after(update_simulation_clock),
            );
    }
}
