//! Cross-channel exclusivity rules.
//!
//! A requested change on one channel expands into an ordered plan of
//! transitions covering every sibling that must move with it. Plans are pure
//! and applied by the coordinator in one pass.
use super::channel::{
    ChannelId, ChannelSet, ChannelState, ContactState, HeadState, PartnerHandState, Side,
};

/// Ordered transitions produced for one request, requested channel first.
pub type TransitionPlan = Vec<(ChannelId, ChannelState)>;

const CHESTS: [ChannelId; 2] = [ChannelId::LeftChest, ChannelId::RightChest];
const HANDS: [ChannelId; 2] = [ChannelId::LeftHand, ChannelId::RightHand];

fn side_of(channel: ChannelId) -> Option<Side> {
    match channel {
        ChannelId::LeftHand | ChannelId::LeftChest => Some(Side::Left),
        ChannelId::RightHand | ChannelId::RightChest => Some(Side::Right),
        _ => None,
    }
}

fn contact(state: ContactState) -> ChannelState {
    ChannelState::Contact(state)
}

/// Expands `requested` on `channel` into the full set of transitions.
pub fn plan_transition(
    channels: &ChannelSet,
    channel: ChannelId,
    requested: ChannelState,
) -> TransitionPlan {
    let mut plan = vec![(channel, requested)];

    match (channel, requested) {
        (ChannelId::Head, ChannelState::Head(head)) => plan_head(channels, head, &mut plan),
        (ChannelId::LeftChest | ChannelId::RightChest, ChannelState::Contact(next)) => {
            if let Some(side) = side_of(channel) {
                plan_chest(channels, side, next, &mut plan);
            }
        }
        (ChannelId::LeftHand | ChannelId::RightHand, ChannelState::Contact(next)) => {
            if let Some(side) = side_of(channel) {
                plan_hand(channels, side, next, &mut plan);
            }
        }
        (ChannelId::PartnerHand, ChannelState::PartnerHand(next)) => {
            plan_partner_hand(channels, next, &mut plan)
        }
        _ => {}
    }

    plan
}

fn plan_head(channels: &ChannelSet, head: HeadState, plan: &mut TransitionPlan) {
    if !head.kissing {
        return;
    }
    for chest in CHESTS {
        if channels.contact(chest).is_mouth() {
            plan.push((chest, contact(ContactState::Idle)));
        }
    }
}

fn plan_chest(channels: &ChannelSet, side: Side, next: ContactState, plan: &mut TransitionPlan) {
    let current = channels.contact(side.chest());
    let hand = side.hand();

    if next.is_mirrored() {
        plan.push((hand, contact(next)));
    } else if current.is_mirrored() && channels.contact(hand) == current {
        plan.push((hand, contact(ContactState::Idle)));
    }

    if next.is_mouth() {
        let head = channels.head();
        if head.kissing {
            plan.push((ChannelId::Head, ChannelState::Head(head.with_kissing(false))));
        }
        let other = side.opposite().chest();
        if channels.contact(other).is_mouth() {
            plan.push((other, contact(ContactState::Idle)));
        }
    }
}

fn plan_hand(channels: &ChannelSet, side: Side, next: ContactState, plan: &mut TransitionPlan) {
    let current = channels.contact(side.hand());
    let chest = side.chest();

    if next.is_mirrored() {
        plan.push((chest, contact(next)));
    } else if current.is_mirrored() && channels.contact(chest) == current {
        plan.push((chest, contact(ContactState::Idle)));
    }
}

fn plan_partner_hand(channels: &ChannelSet, next: PartnerHandState, plan: &mut TransitionPlan) {
    match next {
        PartnerHandState::Interlocked => {
            plan.extend(CHESTS.map(|chest| (chest, contact(ContactState::Clamped))));
            plan.extend(HANDS.map(|hand| (hand, contact(ContactState::Idle))));
        }
        PartnerHandState::Grasped => {
            plan.extend(CHESTS.map(|chest| (chest, contact(ContactState::Clamped))));
            plan.extend(HANDS.map(|hand| (hand, contact(ContactState::Grasped))));
        }
        PartnerHandState::Idle => {
            for chest in CHESTS {
                if channels.contact(chest) == ContactState::Clamped {
                    plan.push((chest, contact(ContactState::Idle)));
                }
            }
            for hand in HANDS {
                if channels.contact(hand) == ContactState::Grasped {
                    plan.push((hand, contact(ContactState::Idle)));
                }
            }
        }
    }
}

/// Checks every exclusivity rule against the current channel states.
pub fn is_consistent(channels: &ChannelSet) -> bool {
    let mouths = CHESTS
        .iter()
        .filter(|chest| channels.contact(**chest).is_mouth())
        .count();
    if mouths > 1 || (mouths == 1 && channels.head().kissing) {
        return false;
    }

    for side in [Side::Left, Side::Right] {
        let chest = channels.contact(side.chest());
        let hand = channels.contact(side.hand());
        if (chest.is_mirrored() || hand.is_mirrored()) && chest != hand {
            return false;
        }
    }

    let chests_clamped = CHESTS
        .iter()
        .all(|chest| channels.contact(*chest) == ContactState::Clamped);
    let any_clamped = CHESTS
        .iter()
        .any(|chest| channels.contact(*chest) == ContactState::Clamped);
    let hands_all = |state: ContactState| HANDS.iter().all(|hand| channels.contact(*hand) == state);
    let any_hand_grasped = HANDS
        .iter()
        .any(|hand| channels.contact(*hand) == ContactState::Grasped);

    match channels.partner_hand() {
        PartnerHandState::Interlocked => chests_clamped && hands_all(ContactState::Idle),
        PartnerHandState::Grasped => chests_clamped && hands_all(ContactState::Grasped),
        PartnerHandState::Idle => !any_clamped && !any_hand_grasped,
    }
}
