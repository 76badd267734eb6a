//! Executor index arithmetic
//!
//! The console's execute page lays every executor out over two rows of ten
//! slots, so one 20-slot page holds ten executors. Physical slot indices (as
//! they appear on that page and in OSC addresses) and logical executor numbers
//! (as used by the hub and clients) are converted with two independent
//! transforms. They are **not** inverses of each other.

/// Slots per page on the console's execute page (two rows of ten).
pub const SLOTS_PER_PAGE: u32 = 20;

/// Executors per row.
pub const EXECUTORS_PER_ROW: u32 = 10;

/// Fold a physical slot index into its logical executor number.
///
/// The first and second row of a page fold onto the same column, so slots
/// `1` and `11` both yield executor `1`, `21` and `31` both yield `11`.
pub fn to_logical(physical: u32) -> u32 {
    let slot = physical % SLOTS_PER_PAGE;
    let col = if slot > EXECUTORS_PER_ROW {
        slot - EXECUTORS_PER_ROW
    } else {
        slot
    };
    let row = physical / SLOTS_PER_PAGE;
    col + row * EXECUTORS_PER_ROW
}

/// Spread a logical executor number onto the physical slot layout.
///
/// Each group of ten logical numbers lands on the first row of its page:
/// `10` becomes `20`, `21` becomes `41`.
///
/// Physical indices run up to twice the logical range, so the result is
/// widened to `u64` and every `u32` executor number has a slot.
pub fn to_physical(logical: u32) -> u64 {
    let col = u64::from(logical % EXECUTORS_PER_ROW);
    let row = u64::from(logical / EXECUTORS_PER_ROW);
    col + row * u64::from(SLOTS_PER_PAGE)
}

/// True when a physical slot index sits on the name row of its page.
///
/// The second row of each page carries the `color,type,dotColor` triple.
pub fn is_name_row(physical: u32) -> bool {
    physical % SLOTS_PER_PAGE < EXECUTORS_PER_ROW
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_logical_first_row() {
        assert_eq!(to_logical(0), 0);
        assert_eq!(to_logical(1), 1);
        assert_eq!(to_logical(9), 9);
        assert_eq!(to_logical(10), 10);
    }

    #[test]
    fn test_to_logical_second_row() {
        assert_eq!(to_logical(11), 1);
        assert_eq!(to_logical(12), 2);
        assert_eq!(to_logical(19), 9);
        assert_eq!(to_logical(20), 10);
    }

    #[test]
    fn test_to_logical_next_page() {
        assert_eq!(to_logical(21), 11);
        assert_eq!(to_logical(31), 11);
        assert_eq!(to_logical(30), 20);
        assert_eq!(to_logical(40), 20);
    }

    #[test]
    fn test_to_physical_rows() {
        assert_eq!(to_physical(0), 0);
        assert_eq!(to_physical(1), 1);
        assert_eq!(to_physical(9), 9);
        assert_eq!(to_physical(10), 20);
        assert_eq!(to_physical(11), 21);
        assert_eq!(to_physical(19), 29);
        assert_eq!(to_physical(20), 40);
        assert_eq!(to_physical(21), 41);
        assert_eq!(to_physical(29), 49);
    }

    #[test]
    fn test_to_physical_edge_cases() {
        assert_eq!(to_physical(99), 199);
        assert_eq!(to_physical(100), 200);
    }

    #[test]
    fn test_to_physical_largest_executor() {
        assert_eq!(to_physical(u32::MAX), 8_589_934_585);
        assert_eq!(to_physical(u32::MAX - 5), 8_589_934_580);
    }

    #[test]
    fn test_transforms_are_not_inverse() {
        // Second-row slots fold onto the first row and never come back.
        assert_eq!(to_physical(to_logical(10)), 20);
        assert_eq!(to_physical(to_logical(11)), 1);
        assert_eq!(to_physical(to_logical(31)), 21);
    }

    #[test]
    fn test_name_row() {
        assert!(is_name_row(0));
        assert!(is_name_row(1));
        assert!(is_name_row(9));
        assert!(!is_name_row(10));
        assert!(!is_name_row(11));
        assert!(!is_name_row(19));
        assert!(is_name_row(21));
        assert!(!is_name_row(31));
    }
}
