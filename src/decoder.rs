use crate::error::DecodeError;
use crate::slots::SlotTable;
use evdev::{AbsoluteAxisType, EventType, InputEvent, Synchronization};
use tracing::{debug, trace};

/// What a single raw event did to the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Not part of the slot protocol, or a marker with nothing to do.
    Ignored,
    /// Slot state changed; nothing is visible until the next report.
    Buffered,
    /// A report marker closed the batch; pending slots are ready to reconcile.
    Synced,
}

/// Feeds type B protocol events into a [`SlotTable`].
///
/// Events between two `SYN_REPORT` markers form one atomic update. The
/// decoder only buffers them in the table's dirty flags; reconciling the
/// batch is left to the caller once [`Decoded::Synced`] comes back.
#[derive(Debug)]
pub struct ProtocolDecoder {
    slots: SlotTable,
    verbose: bool,
}

impl ProtocolDecoder {
    pub fn new(num_slots: usize) -> Self {
        Self {
            slots: SlotTable::new(num_slots),
            verbose: false,
        }
    }

    pub fn with_verbose(num_slots: usize, verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::new(num_slots)
        }
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotTable {
        &mut self.slots
    }

    pub fn process(&mut self, event: &InputEvent) -> Result<Decoded, DecodeError> {
        if self.verbose {
            print_event(event);
        }

        match event.event_type() {
            EventType::ABSOLUTE => self.process_abs(event),
            EventType::SYNCHRONIZATION => Ok(self.process_syn(event)),
            _ => Ok(Decoded::Ignored),
        }
    }

    fn process_abs(&mut self, event: &InputEvent) -> Result<Decoded, DecodeError> {
        let slot = self.slots.current_slot();
        let value = event.value();

        match AbsoluteAxisType(event.code()) {
            AbsoluteAxisType::ABS_MT_SLOT => {
                self.slots.select(value)?;
                Ok(Decoded::Ignored)
            }
            AbsoluteAxisType::ABS_MT_TRACKING_ID => {
                self.slots.set_tracking_id(slot, value)?;
                Ok(Decoded::Buffered)
            }
            AbsoluteAxisType::ABS_MT_POSITION_X => {
                self.slots.set_x(slot, value)?;
                Ok(Decoded::Buffered)
            }
            AbsoluteAxisType::ABS_MT_POSITION_Y => {
                self.slots.set_y(slot, value)?;
                Ok(Decoded::Buffered)
            }
            _ => Ok(Decoded::Ignored),
        }
    }

    fn process_syn(&mut self, event: &InputEvent) -> Decoded {
        match Synchronization(event.code()) {
            Synchronization::SYN_REPORT => Decoded::Synced,
            Synchronization::SYN_DROPPED => {
                // evdev's synced fetch replays the device state diff itself
                debug!(pending = self.slots.pending_count(), "kernel dropped events");
                Decoded::Ignored
            }
            _ => Decoded::Ignored,
        }
    }
}

pub fn print_event(event: &InputEvent) {
    let type_name = match event.event_type() {
        EventType::KEY => "EV_KEY",
        EventType::ABSOLUTE => "EV_ABS",
        EventType::MISC => "EV_MSC",
        EventType::SYNCHRONIZATION => "EV_SYN",
        _ => "EV_???",
    };
    match code_lookup(event.event_type(), event.code()) {
        Some(name) => trace!("{}({}, {})", type_name, name, event.value()),
        None => trace!("{}(0x{:X}, {})", type_name, event.code(), event.value()),
    }
}

fn code_lookup(event_type: EventType, code: u16) -> Option<&'static str> {
    if event_type == EventType::SYNCHRONIZATION {
        return match code {
            0x00 => Some("SYN_REPORT"),
            0x03 => Some("SYN_DROPPED"),
            _ => None,
        };
    }
    match code {
        0x00 => Some("X"),
        0x01 => Some("Y"),
        0x2f => Some("SLOT"),
        0x30 => Some("TOUCH_MAJOR"),
        0x31 => Some("TOUCH_MINOR"),
        0x35 => Some("POSITION_X"),
        0x36 => Some("POSITION_Y"),
        0x39 => Some("TRACKING_ID"),
        0x3a => Some("PRESSURE"),
        0x14a => Some("BTN_TOUCH"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{abs, key, syn, syn_dropped};
    use crate::touch::TRACKING_ID_NONE;

    fn feed(decoder: &mut ProtocolDecoder, events: &[InputEvent]) -> Vec<Decoded> {
        events
            .iter()
            .map(|e| decoder.process(e).unwrap())
            .collect()
    }

    #[test]
    fn contact_is_buffered_until_report() {
        let mut decoder = ProtocolDecoder::new(5);
        let steps = feed(
            &mut decoder,
            &[
                abs(AbsoluteAxisType::ABS_MT_SLOT, 0),
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 5),
                abs(AbsoluteAxisType::ABS_MT_POSITION_X, 10),
                abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 20),
            ],
        );
        assert_eq!(
            steps,
            vec![
                Decoded::Ignored,
                Decoded::Buffered,
                Decoded::Buffered,
                Decoded::Buffered
            ]
        );
        assert_eq!(decoder.slots().pending_count(), 1);

        assert_eq!(decoder.process(&syn()).unwrap(), Decoded::Synced);
        let slot = decoder.slots().get(0).unwrap();
        assert_eq!(slot.tracking_id, 5);
        assert_eq!((slot.position_x, slot.position_y), (10, 20));
    }

    #[test]
    fn slot_select_alone_is_not_dirty() {
        let mut decoder = ProtocolDecoder::new(5);
        decoder
            .process(&abs(AbsoluteAxisType::ABS_MT_SLOT, 3))
            .unwrap();
        assert_eq!(decoder.slots().current_slot(), 3);
        assert_eq!(decoder.slots().pending_count(), 0);
    }

    #[test]
    fn events_without_slot_select_go_to_slot_zero() {
        let mut decoder = ProtocolDecoder::new(2);
        feed(
            &mut decoder,
            &[
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 1),
                abs(AbsoluteAxisType::ABS_MT_POSITION_X, 7),
            ],
        );
        let pending: Vec<usize> = decoder.slots().pending().map(|(i, _)| i).collect();
        assert_eq!(pending, vec![0]);
    }

    #[test]
    fn sentinel_clears_contact() {
        let mut decoder = ProtocolDecoder::new(2);
        feed(
            &mut decoder,
            &[
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 4),
                syn(),
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, TRACKING_ID_NONE),
            ],
        );
        assert!(!decoder.slots().get(0).unwrap().active());
    }

    #[test]
    fn unknown_axes_and_types_are_ignored() {
        let mut decoder = ProtocolDecoder::new(2);
        let steps = feed(
            &mut decoder,
            &[
                abs(AbsoluteAxisType::ABS_MT_PRESSURE, 40),
                abs(AbsoluteAxisType::ABS_X, 100),
                key(evdev::Key::BTN_TOUCH, 1),
                syn_dropped(),
            ],
        );
        assert!(steps.iter().all(|s| *s == Decoded::Ignored));
        assert_eq!(decoder.slots().pending_count(), 0);
    }

    #[test]
    fn out_of_range_slot_is_corruption() {
        let mut decoder = ProtocolDecoder::new(2);
        let err = decoder
            .process(&abs(AbsoluteAxisType::ABS_MT_SLOT, 2))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::SlotOutOfRange {
                slot: 2,
                num_slots: 2
            }
        );
    }
}
