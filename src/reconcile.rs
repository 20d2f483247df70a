use crate::error::DecodeError;
use crate::slots::SlotTable;
use crate::touch::{TouchPoint, TouchSink, TRACKING_ID_NONE};
use tracing::trace;

/// Turns a synchronized batch of slot changes into touch lifecycle events.
///
/// Keeps the tracking ID and position each slot had after the previous
/// pass. Slot numbers get recycled by the kernel, so a transition is
/// classified by comparing tracking IDs, never by slot occupancy alone.
#[derive(Clone, Debug)]
pub struct Reconciler {
    prior: Vec<TouchPoint>,
}

impl Reconciler {
    pub fn new(num_slots: usize) -> Self {
        Self {
            prior: vec![TouchPoint::new(TRACKING_ID_NONE, 0, 0); num_slots],
        }
    }

    /// Tracking ID and position `slot` held after the last pass.
    pub fn prior(&self, slot: usize) -> Option<TouchPoint> {
        self.prior.get(slot).copied()
    }

    /// Contacts present after the last pass, in slot order.
    pub fn active(&self) -> impl Iterator<Item = TouchPoint> + '_ {
        self.prior
            .iter()
            .copied()
            .filter(|t| t.id != TRACKING_ID_NONE)
    }

    fn prior_or_empty(&self, slot: usize) -> TouchPoint {
        self.prior
            .get(slot)
            .copied()
            .unwrap_or(TouchPoint::new(TRACKING_ID_NONE, 0, 0))
    }

    /// Classify every pending slot and report to `sink`: all finished
    /// contacts first, then new and updated ones, each in ascending slot
    /// order. Then take the pending slots as the new snapshot and clear them.
    ///
    /// A batch that leaves one tracking ID live in two slots is rejected
    /// before anything is reported, and the snapshot is left untouched.
    pub fn reconcile<S: TouchSink + ?Sized>(
        &mut self,
        slots: &mut SlotTable,
        sink: &mut S,
    ) -> Result<(), DecodeError> {
        check_unique_ids(slots)?;

        // departures first, so an id that moved to a lower slot is finished
        // before it starts again
        for (index, slot) in slots.pending() {
            let before = self.prior_or_empty(index);
            if before.id != TRACKING_ID_NONE && before.id != slot.tracking_id {
                // prefer where the contact was when it left over where it
                // was at the last report
                let last_seen = slot
                    .departed()
                    .filter(|d| d.id == before.id)
                    .unwrap_or(before);
                trace!(slot = index, id = before.id, "touch finished");
                sink.on_finished(last_seen);
            }
        }

        for (index, slot) in slots.pending() {
            let before = self.prior_or_empty(index);
            let now = slot.touch_point();

            if now.id != TRACKING_ID_NONE {
                if before.id == now.id {
                    sink.on_updated(now);
                } else {
                    trace!(slot = index, id = now.id, "touch started");
                    sink.on_new(now);
                }
            }

            if let Some(entry) = self.prior.get_mut(index) {
                *entry = now;
            }
        }

        slots.clear_pending();
        Ok(())
    }
}

/// Only pending slots can have introduced a clash, so each of them is
/// compared against every other live slot.
fn check_unique_ids(slots: &SlotTable) -> Result<(), DecodeError> {
    for (index, slot) in slots.pending().filter(|(_, s)| s.active()) {
        let clash = slots
            .active()
            .find(|(other, s)| *other != index && s.tracking_id == slot.tracking_id);
        if let Some((other, _)) = clash {
            return Err(DecodeError::DuplicateTrackingId {
                id: slot.tracking_id,
                slots: (index.min(other), index.max(other)),
            });
        }
    }
    Ok(())
}
