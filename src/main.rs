use bevy::prelude::*;

mod core;
mod interaction;

use crate::{core::CorePlugin, interaction::InteractionPlugin};

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, CorePlugin::default(), InteractionPlugin))
        .run();
}
