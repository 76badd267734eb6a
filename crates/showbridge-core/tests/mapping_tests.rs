use proptest::prelude::*;
use showbridge_core::mapping::{is_name_row, to_logical, to_physical};

#[test]
fn test_to_logical_reference_values() {
    let cases = [
        (0, 0),
        (1, 1),
        (9, 9),
        (10, 10),
        (11, 1),
        (19, 9),
        (20, 10),
        (21, 11),
        (31, 11),
        (30, 20),
        (40, 20),
    ];
    for (physical, logical) in cases {
        assert_eq!(to_logical(physical), logical, "to_logical({})", physical);
    }
}

#[test]
fn test_to_physical_reference_values() {
    let cases: [(u32, u64); 12] = [
        (0, 0),
        (1, 1),
        (9, 9),
        (10, 20),
        (11, 21),
        (19, 29),
        (20, 40),
        (21, 41),
        (29, 49),
        (99, 199),
        (100, 200),
        (u32::MAX, 8_589_934_585),
    ];
    for (logical, physical) in cases {
        assert_eq!(to_physical(logical), physical, "to_physical({})", logical);
    }
}

#[test]
fn test_name_and_config_rows_share_an_executor() {
    // Slot 1 carries the name, slot 11 the config of executor 1
    assert!(is_name_row(1));
    assert!(!is_name_row(11));
    assert_eq!(to_logical(1), to_logical(11));

    assert!(is_name_row(25));
    assert!(!is_name_row(35));
    assert_eq!(to_logical(25), to_logical(35));
}

proptest! {
    #[test]
    fn prop_to_logical_is_total(physical in any::<u32>()) {
        let logical = to_logical(physical);
        prop_assert!(logical <= physical);
    }

    #[test]
    fn prop_to_physical_is_total(logical in any::<u32>()) {
        let physical = to_physical(logical);
        prop_assert!(physical >= u64::from(logical));
        prop_assert!(physical % 20 < 10);
        prop_assert_eq!(physical / 20, u64::from(logical / 10));
    }

    #[test]
    fn prop_logical_stays_within_page(physical in 0u32..100_000) {
        let page = physical / 20;
        let logical = to_logical(physical);
        prop_assert!(logical >= page * 10);
        prop_assert!(logical <= page * 10 + 10);
    }
}
