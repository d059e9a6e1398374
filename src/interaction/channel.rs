//! Per-region channel state machines and the set that owns all seven of them.
use std::fmt;

use serde::Serialize;

use super::{config::MAX_INTENSITY, errors::SessionError};

/// Body regions animated independently during an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    Head,
    Body,
    LeftHand,
    RightHand,
    LeftChest,
    RightChest,
    PartnerHand,
}

impl ChannelId {
    pub const ALL: [ChannelId; 7] = [
        Self::Head,
        Self::Body,
        Self::LeftHand,
        Self::RightHand,
        Self::LeftChest,
        Self::RightChest,
        Self::PartnerHand,
    ];

    fn index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::Body => 1,
            Self::LeftHand => 2,
            Self::RightHand => 3,
            Self::LeftChest => 4,
            Self::RightChest => 5,
            Self::PartnerHand => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Body => "body",
            Self::LeftHand => "left hand",
            Self::RightHand => "right hand",
            Self::LeftChest => "left chest",
            Self::RightChest => "right chest",
            Self::PartnerHand => "partner hand",
        }
    }

    /// Base variant a channel returns to on reset.
    pub fn base_state(self) -> ChannelState {
        match self {
            Self::Head => ChannelState::Head(HeadState::default()),
            Self::PartnerHand => ChannelState::PartnerHand(PartnerHandState::Idle),
            _ => ChannelState::Contact(ContactState::Idle),
        }
    }

    /// Whether `state` belongs to this channel's vocabulary.
    pub fn accepts(self, state: &ChannelState) -> bool {
        use ContactState::*;
        match (self, state) {
            (Self::Head, ChannelState::Head(_)) => true,
            (Self::PartnerHand, ChannelState::PartnerHand(_)) => true,
            (Self::LeftChest | Self::RightChest, ChannelState::Contact(contact)) => {
                matches!(contact, Idle | Grasp | Pinch | Suck | Lick | Clamped)
            }
            (Self::LeftHand | Self::RightHand, ChannelState::Contact(contact)) => {
                matches!(contact, Idle | Grasp | Pinch | Massage | Stroke | Grasped)
            }
            (Self::Body, ChannelState::Contact(contact)) => matches!(contact, Idle | Grasped),
            _ => false,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Left or right half of the body, pairing a hand with a chest region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn hand(self) -> ChannelId {
        match self {
            Self::Left => ChannelId::LeftHand,
            Self::Right => ChannelId::RightHand,
        }
    }

    pub fn chest(self) -> ChannelId {
        match self {
            Self::Left => ChannelId::LeftChest,
            Self::Right => ChannelId::RightChest,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Shared vocabulary of the hand, chest and body regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactState {
    #[default]
    Idle,
    Grasp,
    Pinch,
    Suck,
    Lick,
    Clamped,
    Massage,
    /// Hand-job variant, only reachable on a hand.
    Stroke,
    Grasped,
}

impl ContactState {
    /// Interactions performed with the mouth.
    pub fn is_mouth(self) -> bool {
        matches!(self, Self::Suck | Self::Lick)
    }

    /// Variants a chest shares with the hand on the same side.
    pub fn is_mirrored(self) -> bool {
        matches!(self, Self::Grasp | Self::Pinch)
    }
}

/// Facial expression of the head channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "expression", content = "level", rename_all = "snake_case")]
pub enum Expression {
    #[default]
    Idle,
    Enduring,
    Blushing(u8),
    Climax,
}

/// Head state: expression plus an independent kissing overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HeadState {
    pub expression: Expression,
    pub kissing: bool,
}

impl HeadState {
    pub fn with_kissing(self, kissing: bool) -> Self {
        Self { kissing, ..self }
    }

    pub fn with_expression(self, expression: Expression) -> Self {
        Self { expression, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerHandState {
    #[default]
    Idle,
    Grasped,
    Interlocked,
}

/// Tagged state of one channel, one variant per channel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "family", content = "state", rename_all = "snake_case")]
pub enum ChannelState {
    Contact(ContactState),
    Head(HeadState),
    PartnerHand(PartnerHandState),
}

impl ChannelState {
    pub fn contact(&self) -> Option<ContactState> {
        match self {
            Self::Contact(contact) => Some(*contact),
            _ => None,
        }
    }

    pub fn head(&self) -> Option<HeadState> {
        match self {
            Self::Head(head) => Some(*head),
            _ => None,
        }
    }

    pub fn partner_hand(&self) -> Option<PartnerHandState> {
        match self {
            Self::PartnerHand(hand) => Some(*hand),
            _ => None,
        }
    }

    /// True when the channel sits in its family's base variant.
    pub fn is_base(&self) -> bool {
        match self {
            Self::Contact(contact) => *contact == ContactState::Idle,
            Self::Head(head) => *head == HeadState::default(),
            Self::PartnerHand(hand) => *hand == PartnerHandState::Idle,
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contact(contact) => write!(f, "{:?}", contact),
            Self::Head(head) if head.kissing => write!(f, "{:?} (kissing)", head.expression),
            Self::Head(head) => write!(f, "{:?}", head.expression),
            Self::PartnerHand(hand) => write!(f, "{:?}", hand),
        }
    }
}

/// Raised when a controller is asked to enter a variant outside its vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    UnsupportedState {
        channel: ChannelId,
        requested: ChannelState,
    },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedState { channel, requested } => {
                write!(f, "{} cannot enter {}", channel, requested)
            }
        }
    }
}

impl std::error::Error for ChannelError {}

/// Animation hint derived from the active variant and the shared intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayCue {
    pub state: ChannelState,
    pub speed: f32,
}

impl DisplayCue {
    fn for_state(state: ChannelState, intensity: u8) -> Self {
        let speed = if state.is_base() {
            0.0
        } else {
            1.0 + f32::from(intensity) * 0.5
        };
        Self { state, speed }
    }
}

/// Completed exit/enter pair on one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelTransition {
    pub channel: ChannelId,
    pub from: ChannelState,
    pub to: ChannelState,
}

/// State machine for one body region.
#[derive(Debug, Clone)]
pub struct ChannelController {
    id: ChannelId,
    state: ChannelState,
    time_in_state: f32,
    intensity: u8,
    cue: DisplayCue,
}

impl ChannelController {
    pub fn new(id: ChannelId) -> Self {
        let state = id.base_state();
        Self {
            id,
            state,
            time_in_state: 0.0,
            intensity: 0,
            cue: DisplayCue::for_state(state, 0),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn cue(&self) -> DisplayCue {
        self.cue
    }

    /// Exits the current variant and enters `new_state`.
    ///
    /// Re-entering the active variant is a no-op and returns `Ok(None)`.
    pub fn enter_state(
        &mut self,
        new_state: ChannelState,
    ) -> Result<Option<ChannelTransition>, ChannelError> {
        if !self.id.accepts(&new_state) {
            return Err(ChannelError::UnsupportedState {
                channel: self.id,
                requested: new_state,
            });
        }
        if new_state == self.state {
            return Ok(None);
        }

        let from = self.state;
        self.time_in_state = 0.0;
        self.state = new_state;
        self.cue = DisplayCue::for_state(new_state, self.intensity);

        Ok(Some(ChannelTransition {
            channel: self.id,
            from,
            to: new_state,
        }))
    }

    /// Stores the broadcast intensity. A blushing head follows the level,
    /// which is reported back as a transition.
    pub fn set_intensity(&mut self, intensity: u8) -> Option<ChannelTransition> {
        self.intensity = intensity.min(MAX_INTENSITY);
        if let ChannelState::Head(head) = self.state {
            if matches!(head.expression, Expression::Blushing(level) if level != self.intensity) {
                let blushing = head.with_expression(Expression::Blushing(self.intensity));
                return self.enter_state(ChannelState::Head(blushing)).ok().flatten();
            }
        }
        self.cue = DisplayCue::for_state(self.state, self.intensity);
        None
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        if delta_seconds > 0.0 {
            self.time_in_state += delta_seconds;
        }
    }

    pub fn reset(&mut self) -> Option<ChannelTransition> {
        self.enter_state(self.id.base_state()).ok().flatten()
    }
}

/// All seven controllers, stored by index.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    channels: [ChannelController; 7],
}

impl ChannelSet {
    /// Wires the provided controllers, failing if any region is missing or doubled.
    pub fn wire(controllers: Vec<ChannelController>) -> Result<Self, SessionError> {
        let mut slots: [Option<ChannelController>; 7] = Default::default();
        for controller in controllers {
            let slot = &mut slots[controller.id().index()];
            if slot.is_some() {
                return Err(SessionError::DuplicateChannel(controller.id()));
            }
            *slot = Some(controller);
        }

        let mut channels = Vec::with_capacity(slots.len());
        for (id, slot) in ChannelId::ALL.into_iter().zip(slots) {
            channels.push(slot.ok_or(SessionError::MissingChannel(id))?);
        }

        let channels: [ChannelController; 7] = channels
            .try_into()
            .map_err(|_| SessionError::MissingChannel(ChannelId::PartnerHand))?;
        Ok(Self { channels })
    }

    /// A fully wired set with every region in its base variant.
    pub fn standard() -> Self {
        Self {
            channels: ChannelId::ALL.map(ChannelController::new),
        }
    }

    pub fn get(&self, id: ChannelId) -> &ChannelController {
        &self.channels[id.index()]
    }

    pub fn state(&self, id: ChannelId) -> ChannelState {
        self.get(id).state()
    }

    pub fn contact(&self, id: ChannelId) -> ContactState {
        self.state(id).contact().unwrap_or_default()
    }

    pub fn head(&self) -> HeadState {
        self.state(ChannelId::Head).head().unwrap_or_default()
    }

    pub fn partner_hand(&self) -> PartnerHandState {
        self.state(ChannelId::PartnerHand)
            .partner_hand()
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelController> {
        self.channels.iter()
    }

    pub fn enter_state(
        &mut self,
        id: ChannelId,
        state: ChannelState,
    ) -> Result<Option<ChannelTransition>, ChannelError> {
        self.channels[id.index()].enter_state(state)
    }

    pub fn set_intensity(&mut self, intensity: u8) -> Vec<ChannelTransition> {
        self.channels
            .iter_mut()
            .filter_map(|channel| channel.set_intensity(intensity))
            .collect()
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        for channel in self.channels.iter_mut() {
            channel.advance(delta_seconds);
        }
    }

    /// Returns every channel to its base variant in one pass.
    pub fn reset_all(&mut self) -> Vec<ChannelTransition> {
        self.channels
            .iter_mut()
            .filter_map(ChannelController::reset)
            .collect()
    }

    pub fn all_base(&self) -> bool {
        self.channels.iter().all(|channel| channel.state().is_base())
    }

    /// Stimulations running alongside the main mode: chest contact, hand
    /// massage and kissing each count once.
    pub fn other_stimulation_count(&self) -> u32 {
        let chests = [ChannelId::LeftChest, ChannelId::RightChest]
            .into_iter()
            .filter(|id| {
                matches!(
                    self.contact(*id),
                    ContactState::Grasp | ContactState::Pinch | ContactState::Suck | ContactState::Lick
                )
            })
            .count();
        let hands = [ChannelId::LeftHand, ChannelId::RightHand]
            .into_iter()
            .filter(|id| self.contact(*id) == ContactState::Massage)
            .count();
        let kissing = usize::from(self.head().kissing);
        (chests + hands + kissing) as u32
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::standard()
    }
}
