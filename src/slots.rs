use crate::error::DecodeError;
use crate::touch::{TouchPoint, TRACKING_ID_NONE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotData {
    pub tracking_id: i32,
    pub position_x: i32,
    pub position_y: i32,
    dirty: bool,
    /// First contact that left this slot during the current batch, with the
    /// position it had when it left.
    departed: Option<TouchPoint>,
}

impl Default for SlotData {
    fn default() -> Self {
        Self {
            tracking_id: TRACKING_ID_NONE,
            position_x: 0,
            position_y: 0,
            dirty: false,
            departed: None,
        }
    }
}

impl SlotData {
    pub fn active(&self) -> bool {
        self.tracking_id != TRACKING_ID_NONE
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn touch_point(&self) -> TouchPoint {
        TouchPoint::new(self.tracking_id, self.position_x, self.position_y)
    }

    pub fn departed(&self) -> Option<TouchPoint> {
        self.departed
    }
}

/// Per-slot contact state plus the protocol's implicit slot cursor.
///
/// Sized once from the device's slot count and only ever touched from the
/// polling path, so there is no locking.
#[derive(Clone, Debug)]
pub struct SlotTable {
    slots: Vec<SlotData>,
    current: usize,
}

impl SlotTable {
    pub fn new(num_slots: usize) -> Self {
        Self {
            slots: vec![SlotData::default(); num_slots],
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn index(&self, slot: i32) -> Result<usize, DecodeError> {
        if slot >= 0 && (slot as usize) < self.slots.len() {
            Ok(slot as usize)
        } else {
            Err(DecodeError::SlotOutOfRange {
                slot,
                num_slots: self.slots.len(),
            })
        }
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut SlotData, DecodeError> {
        let num_slots = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or(DecodeError::SlotOutOfRange {
                slot: slot as i32,
                num_slots,
            })
    }

    pub fn get(&self, slot: usize) -> Option<&SlotData> {
        self.slots.get(slot)
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Move the slot cursor. Does not mark anything dirty.
    pub fn select(&mut self, slot: i32) -> Result<(), DecodeError> {
        self.current = self.index(slot)?;
        Ok(())
    }

    pub fn set_tracking_id(&mut self, slot: usize, id: i32) -> Result<(), DecodeError> {
        let data = self.slot_mut(slot)?;
        if data.active() && data.tracking_id != id && data.departed.is_none() {
            data.departed = Some(data.touch_point());
        }
        data.tracking_id = id;
        data.dirty = true;
        Ok(())
    }

    pub fn set_x(&mut self, slot: usize, x: i32) -> Result<(), DecodeError> {
        let data = self.slot_mut(slot)?;
        data.position_x = x;
        data.dirty = true;
        Ok(())
    }

    pub fn set_y(&mut self, slot: usize, y: i32) -> Result<(), DecodeError> {
        let data = self.slot_mut(slot)?;
        data.position_y = y;
        data.dirty = true;
        Ok(())
    }

    pub fn set_position(&mut self, slot: usize, x: i32, y: i32) -> Result<(), DecodeError> {
        self.set_x(slot, x)?;
        self.set_y(slot, y)
    }

    /// Slots changed since the last synchronization boundary, ascending.
    pub fn pending(&self) -> impl Iterator<Item = (usize, &SlotData)> + '_ {
        self.slots.iter().enumerate().filter(|(_, s)| s.dirty)
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|s| s.dirty).count()
    }

    pub fn clear_pending(&mut self) {
        for slot in &mut self.slots {
            slot.dirty = false;
            slot.departed = None;
        }
    }

    /// Slots currently holding a contact, ascending.
    pub fn active(&self) -> impl Iterator<Item = (usize, &SlotData)> + '_ {
        self.slots.iter().enumerate().filter(|(_, s)| s.active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_on_slot_zero() {
        let table = SlotTable::new(4);
        assert_eq!(table.len(), 4);
        assert_eq!(table.current_slot(), 0);
        assert_eq!(table.pending_count(), 0);
        assert_eq!(table.active().count(), 0);
        assert_eq!(table.get(3).map(|s| s.tracking_id), Some(TRACKING_ID_NONE));
    }

    #[test]
    fn select_rejects_out_of_range() {
        let mut table = SlotTable::new(2);
        table.select(1).unwrap();
        assert_eq!(table.current_slot(), 1);

        assert_eq!(
            table.select(2),
            Err(DecodeError::SlotOutOfRange {
                slot: 2,
                num_slots: 2
            })
        );
        assert!(table.select(-3).is_err());
        // cursor unchanged after a rejected select
        assert_eq!(table.current_slot(), 1);
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn writes_mark_dirty() {
        let mut table = SlotTable::new(3);
        table.set_tracking_id(2, 9).unwrap();
        table.set_position(0, 4, 5).unwrap();

        let pending: Vec<usize> = table.pending().map(|(i, _)| i).collect();
        assert_eq!(pending, vec![0, 2]);

        let slot0 = table.get(0).unwrap();
        assert_eq!((slot0.position_x, slot0.position_y), (4, 5));
        assert!(!slot0.active());

        table.clear_pending();
        assert_eq!(table.pending_count(), 0);
        assert!(table.get(2).unwrap().active());
    }

    #[test]
    fn replacing_contact_remembers_first_departure() {
        let mut table = SlotTable::new(1);
        table.set_tracking_id(0, 5).unwrap();
        table.set_position(0, 10, 20).unwrap();
        table.clear_pending();

        table.set_x(0, 11).unwrap();
        table.set_tracking_id(0, 6).unwrap();
        table.set_position(0, 90, 90).unwrap();
        table.set_tracking_id(0, TRACKING_ID_NONE).unwrap();

        let slot = table.get(0).unwrap();
        assert_eq!(slot.departed(), Some(TouchPoint::new(5, 11, 20)));

        table.clear_pending();
        assert_eq!(table.get(0).unwrap().departed(), None);
    }

    #[test]
    fn writes_to_missing_slot_fail() {
        let mut table = SlotTable::new(1);
        assert!(table.set_tracking_id(1, 3).is_err());
        assert!(table.set_x(5, 3).is_err());
    }
}
