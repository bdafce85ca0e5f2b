//! Key index translation between panel scan order and logical order
//!
//! The panel numbers its slots column-major from the top-right, 1-based
//! (left table). Callers address keys row-major from the top-left, 0-based
//! (right table, shown 1-based as key numbers).
//!
//! ```text
//!   physical slot                  key number (logical index + 1)
//! | 0d | 0a | 07 | 04 | 01 | 10 |   | 01 | 02 | 03 | 04 | 05 | 06 |
//! | 0e | 0b | 08 | 05 | 02 | 11 |   | 07 | 08 | 09 | 10 | 11 | 12 |
//! | 0f | 0c | 09 | 06 | 03 | 12 |   | 13 | 14 | 15 | 16 | 17 | 18 |
//! ```
//!
//! Indices outside the tables pass through unchanged so panels with more
//! keys than the 6x3 layout keep working with their native numbering.

/// Physical slot (minus one) for each logical index.
const LOGICAL_TO_PHYSICAL: [u8; 18] = [12, 9, 6, 3, 0, 15, 13, 10, 7, 4, 1, 16, 14, 11, 8, 5, 2, 17];

/// Logical index for each physical slot (minus one).
const PHYSICAL_TO_LOGICAL: [u8; 18] = [4, 10, 16, 3, 9, 15, 2, 8, 14, 1, 7, 13, 0, 6, 12, 5, 11, 17];

/// Translate a 0-based logical index to the 1-based physical slot.
pub fn elgato_to_ajazz(index: u8) -> u8 {
    match LOGICAL_TO_PHYSICAL.get(index as usize) {
        Some(&slot) => slot + 1,
        None => index,
    }
}

/// Translate a 1-based physical slot (scan code) to the 0-based logical index.
///
/// Slot 0 is not a key and passes through like any out-of-range value.
pub fn ajazz_to_elgato(slot: u8) -> u8 {
    if slot == 0 {
        return slot;
    }
    match PHYSICAL_TO_LOGICAL.get(slot as usize - 1) {
        Some(&index) => index,
        None => slot,
    }
}

/// Translate a 1-based key number (`index + 1`) to the physical slot.
///
/// Key number 0 has no logical key and passes through.
pub fn key_number_to_slot(key: u8) -> u8 {
    match key.checked_sub(1) {
        Some(index) if (index as usize) < LOGICAL_TO_PHYSICAL.len() => elgato_to_ajazz(index),
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_round_trip() {
        for index in 0..18u8 {
            assert_eq!(ajazz_to_elgato(elgato_to_ajazz(index)), index);
        }
    }

    #[test]
    fn test_physical_round_trip() {
        for slot in 1..=18u8 {
            assert_eq!(elgato_to_ajazz(ajazz_to_elgato(slot)), slot);
        }
    }

    #[test]
    fn test_out_of_range_passthrough() {
        for index in 18..=u8::MAX {
            assert_eq!(elgato_to_ajazz(index), index);
        }
        for slot in 19..=u8::MAX {
            assert_eq!(ajazz_to_elgato(slot), slot);
        }
        assert_eq!(ajazz_to_elgato(0), 0);
    }

    #[test]
    fn test_corners() {
        // Top-left key is physical 0x0d, bottom-right is 0x12
        assert_eq!(elgato_to_ajazz(0), 0x0d);
        assert_eq!(elgato_to_ajazz(17), 0x12);
        assert_eq!(ajazz_to_elgato(0x01), 4);
        assert_eq!(ajazz_to_elgato(0x10), 5);
    }

    #[test]
    fn test_key_number_view() {
        for index in 0..18u8 {
            assert_eq!(key_number_to_slot(index + 1), elgato_to_ajazz(index));
        }
        assert_eq!(key_number_to_slot(0), 0);
        assert_eq!(key_number_to_slot(19), 19);
    }
}
