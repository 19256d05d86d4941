use tracing::{debug, info};
use zone_engine::{
    Action, HandlerError, Identifier, ListenerKey, ObjectKind, Rearm, ScheduleOutcome, TurnContext,
    TurnListener,
};

pub(crate) const OFFER_ACTION: &str = "offer";
pub(crate) const WITHDRAW_OFFER_ACTION: &str = "withdraw_offer";

/// 1 minute at 300 ms per turn.
const DEFAULT_OFFER_TURNS: u64 = 200;
const WARNING_LEAD_TURNS: u64 = 20;

fn offer_attribute(offer_id: i64) -> String {
    format!("offer:{offer_id}")
}

fn warned_attribute(offer_id: i64) -> String {
    format!("offer:{offer_id}:warned")
}

pub(crate) fn expiry_key(player: &Identifier, offer_id: i64) -> ListenerKey {
    ListenerKey::new(format!("offer_expiry:{player}:{offer_id}"))
}

/// Warns the owner shortly before an offer runs out. Keyed by player and
/// offer id, so posting the same offer again does not stack warnings.
#[derive(Debug, Clone)]
pub(crate) struct OfferExpireWarner {
    player: Identifier,
    offer_id: i64,
}

impl TurnListener for OfferExpireWarner {
    fn on_turn_reached(&mut self, ctx: &mut TurnContext<'_>) -> Result<Rearm, HandlerError> {
        let Ok(owner) = ctx.world.object_mut(&self.player) else {
            debug!(player = %self.player, offer_id = self.offer_id, "offer_owner_gone");
            return Ok(Rearm::Done);
        };
        let Some(item) = owner
            .attributes()
            .text(&offer_attribute(self.offer_id))
            .map(str::to_string)
        else {
            return Ok(Rearm::Done);
        };

        owner
            .attributes_mut()
            .set(warned_attribute(self.offer_id), true);
        info!(
            turn = %ctx.turn,
            player = %self.player,
            offer_id = self.offer_id,
            item = item.as_str(),
            "offer_expiry_warning"
        );
        Ok(Rearm::Done)
    }
}

/// Fields: `offer_id`, `item`, optional `expires_in` turns.
pub(crate) fn handle_offer(
    ctx: &mut TurnContext<'_>,
    player: &Identifier,
    action: &Action,
) -> Result<(), HandlerError> {
    let (Some(offer_id), Some(item)) = (action.int("offer_id"), action.text("item")) else {
        debug!(turn = %ctx.turn, player = %player, "offer_ignored_malformed");
        return Ok(());
    };
    let expires_in = action
        .int("expires_in")
        .and_then(|turns| u64::try_from(turns).ok())
        .filter(|turns| *turns > 0)
        .unwrap_or(DEFAULT_OFFER_TURNS);

    let Ok(owner) = ctx.world.object_mut(player) else {
        return Ok(());
    };
    if owner.kind() != ObjectKind::Player {
        return Ok(());
    }
    owner.attributes_mut().set(offer_attribute(offer_id), item);
    owner.attributes_mut().remove(&warned_attribute(offer_id));

    let key = expiry_key(player, offer_id);
    if let Some(due) = ctx.notifier.next_due(&key) {
        debug!(turn = %ctx.turn, key = %key, due = %due, "offer_warning_already_scheduled");
        return Ok(());
    }
    let warn_in = expires_in.saturating_sub(WARNING_LEAD_TURNS).max(1);
    let warner = OfferExpireWarner {
        player: player.clone(),
        offer_id,
    };
    if let ScheduleOutcome::Scheduled(due) = ctx.notifier.notify_in(warn_in, key, warner) {
        info!(
            turn = %ctx.turn,
            player = %player,
            offer_id,
            item,
            warn_at = %due,
            "offer_posted"
        );
    }
    Ok(())
}

/// Fields: `offer_id`. Drops the offer and its pending warning.
pub(crate) fn handle_withdraw_offer(
    ctx: &mut TurnContext<'_>,
    player: &Identifier,
    action: &Action,
) -> Result<(), HandlerError> {
    let Some(offer_id) = action.int("offer_id") else {
        return Ok(());
    };
    let Ok(owner) = ctx.world.object_mut(player) else {
        return Ok(());
    };
    if owner
        .attributes_mut()
        .remove(&offer_attribute(offer_id))
        .is_none()
    {
        return Ok(());
    }
    owner.attributes_mut().remove(&warned_attribute(offer_id));
    let cancelled = ctx.notifier.cancel(&expiry_key(player, offer_id));
    info!(turn = %ctx.turn, player = %player, offer_id, cancelled, "offer_withdrawn");
    Ok(())
}
