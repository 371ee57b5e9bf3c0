use pdf_arrange::*;

fn loaded(left: usize, right: usize) -> PageCollection {
    let mut pages = PageCollection::new();
    pages.load_slot(SlotId::Left, "left.pdf", vec![1u8, 2, 3], left);
    pages.load_slot(SlotId::Right, "right.pdf", vec![4u8, 5, 6], right);
    pages
}

fn page_numbers(pages: &PageCollection, slot: SlotId) -> Vec<u32> {
    pages.sequence(slot).iter().map(|e| e.source_page()).collect()
}

fn ids(pages: &PageCollection, slot: SlotId) -> Vec<EntryId> {
    pages.sequence(slot).iter().map(|e| e.id()).collect()
}

#[test]
fn test_load_slot_creates_originals_in_order() {
    let pages = loaded(3, 2);

    assert_eq!(page_numbers(&pages, SlotId::Left), vec![1, 2, 3]);
    assert_eq!(page_numbers(&pages, SlotId::Right), vec![1, 2]);
    assert!(pages.sequence(SlotId::Left).iter().all(|e| !e.is_copy()));
    assert!(
        pages
            .sequence(SlotId::Right)
            .iter()
            .all(|e| e.source_slot() == SlotId::Right)
    );
    assert_eq!(pages.document_count(), 2);
}

#[test]
fn test_unloaded_slot() {
    let mut pages = PageCollection::new();
    pages.load_slot(SlotId::Left, "a.pdf", vec![0u8], 1);

    assert!(pages.is_loaded(SlotId::Left));
    assert!(!pages.is_loaded(SlotId::Right));
    assert!(pages.sequence(SlotId::Right).is_empty());
    assert!(pages.slot_source(SlotId::Right).is_none());
}

#[test]
fn test_move_entry_forward_and_back() {
    let mut pages = loaded(4, 1);
    let first = ids(&pages, SlotId::Left)[0];

    pages.move_entry(first, 3).unwrap();
    assert_eq!(page_numbers(&pages, SlotId::Left), vec![2, 3, 4, 1]);
    assert_eq!(pages.index_of(first), Some((SlotId::Left, 3)));

    pages.move_entry(first, 0).unwrap();
    assert_eq!(page_numbers(&pages, SlotId::Left), vec![1, 2, 3, 4]);
}

#[test]
fn test_move_entry_to_own_rank_is_identity() {
    for start in 0..4 {
        let mut pages = loaded(4, 1);
        let before = ids(&pages, SlotId::Left);

        pages.move_entry(before[start], start).unwrap();
        assert_eq!(ids(&pages, SlotId::Left), before);
    }
}

#[test]
fn test_move_entry_out_of_range() {
    let mut pages = loaded(3, 1);
    let first = ids(&pages, SlotId::Left)[0];

    let err = pages.move_entry(first, 3).unwrap_err();
    assert!(matches!(
        err,
        ArrangeError::Invariant(InvariantViolation::IndexOutOfRange { index: 3, len: 2 })
    ));
    assert_eq!(page_numbers(&pages, SlotId::Left), vec![1, 2, 3]);
}

#[test]
fn test_move_unknown_entry() {
    let mut pages = loaded(2, 1);
    let err = pages.move_entry(EntryId(9999), 0).unwrap_err();
    assert!(matches!(
        err,
        ArrangeError::Invariant(InvariantViolation::EntryNotFound(_))
    ));
    assert!(!err.is_user_facing());
}

#[test]
fn test_copy_into_other_slot() {
    let mut pages = loaded(3, 2);
    let third = ids(&pages, SlotId::Left)[2];
    let left_before = ids(&pages, SlotId::Left);

    let copy = pages.copy_into(third, SlotId::Right, 1).unwrap();

    assert_eq!(ids(&pages, SlotId::Left), left_before);
    assert_eq!(pages.index_of(copy), Some((SlotId::Right, 1)));

    let entry = pages.entry(copy).unwrap();
    assert!(entry.is_copy());
    assert_eq!(entry.source_slot(), SlotId::Left);
    assert_eq!(entry.source_page(), 3);
    assert_eq!(entry.label(), "L - P.3");
    assert_ne!(copy, third);
}

#[test]
fn test_duplicate_copies_are_distinct() {
    let mut pages = loaded(1, 1);
    let only = ids(&pages, SlotId::Left)[0];

    let a = pages.copy_into(only, SlotId::Right, 0).unwrap();
    let b = pages.copy_into(only, SlotId::Right, 0).unwrap();

    assert_ne!(a, b);
    assert_eq!(ids(&pages, SlotId::Right)[..2], [b, a]);
}

#[test]
fn test_copy_back_refused() {
    let mut pages = loaded(2, 2);
    let left_page = ids(&pages, SlotId::Left)[0];
    let copy = pages.copy_into(left_page, SlotId::Right, 0).unwrap();

    let err = pages.copy_into(copy, SlotId::Left, 0).unwrap_err();
    assert!(matches!(
        err,
        ArrangeError::Invariant(InvariantViolation::CopyBack {
            slot: SlotId::Left
        })
    ));
    assert_eq!(pages.sequence(SlotId::Left).len(), 2);
}

#[test]
fn test_copy_index_out_of_range() {
    let mut pages = loaded(2, 2);
    let left_page = ids(&pages, SlotId::Left)[0];

    assert!(pages.copy_into(left_page, SlotId::Right, 3).is_err());
    assert!(pages.copy_into(left_page, SlotId::Right, 2).is_ok());
}

#[test]
fn test_remove_last_page_refused() {
    let mut pages = loaded(1, 3);
    let only = ids(&pages, SlotId::Left)[0];

    let err = pages.remove(only).unwrap_err();
    assert!(matches!(
        err,
        ArrangeError::Invariant(InvariantViolation::LastPage)
    ));
    assert!(err.is_user_facing());
    assert_eq!(ids(&pages, SlotId::Left), vec![only]);
}

#[test]
fn test_remove_down_to_one() {
    let mut pages = loaded(3, 1);
    let all = ids(&pages, SlotId::Left);

    pages.remove(all[0]).unwrap();
    pages.remove(all[2]).unwrap();
    assert!(pages.remove(all[1]).is_err());
    assert_eq!(page_numbers(&pages, SlotId::Left), vec![2]);
}

#[test]
fn test_remove_copy() {
    let mut pages = loaded(2, 1);
    let left_page = ids(&pages, SlotId::Left)[1];
    let copy = pages.copy_into(left_page, SlotId::Right, 1).unwrap();

    let removed = pages.remove(copy).unwrap();
    assert!(removed.is_copy());
    assert_eq!(pages.sequence(SlotId::Right).len(), 1);
}

#[test]
fn test_is_displaced() {
    let mut pages = loaded(3, 1);
    let left = ids(&pages, SlotId::Left);
    assert!(left.iter().all(|id| !pages.is_displaced(*id)));

    pages.move_entry(left[0], 2).unwrap();
    assert!(pages.is_displaced(left[0]));
    assert!(pages.is_displaced(left[1]));

    pages.move_entry(left[0], 0).unwrap();
    assert!(left.iter().all(|id| !pages.is_displaced(*id)));

    let copy = pages.copy_into(left[0], SlotId::Right, 0).unwrap();
    assert!(!pages.is_displaced(copy));
}

#[test]
fn test_copies_survive_source_reload() {
    let mut pages = loaded(3, 1);
    let left_page = ids(&pages, SlotId::Left)[1];
    let copy = pages.copy_into(left_page, SlotId::Right, 0).unwrap();
    let old_document = pages.entry(copy).unwrap().document();

    pages.load_slot(SlotId::Left, "other.pdf", vec![7u8], 5);

    let source = pages.source(old_document).unwrap();
    assert_eq!(source.name(), "left.pdf");
    assert_eq!(pages.slot_source(SlotId::Left).unwrap().name(), "other.pdf");
    assert_eq!(pages.document_count(), 3);

    pages.remove(copy).unwrap();
    assert!(pages.source(old_document).is_none());
    assert_eq!(pages.document_count(), 2);
}

#[test]
fn test_display_name_truncated() {
    let mut pages = PageCollection::new();
    let name = "a_really_long_file_name_for_a_scanned_contract.pdf";
    pages.load_slot(SlotId::Left, name, vec![0u8], 1);

    let shown = pages.slot_source(SlotId::Left).unwrap().display_name();
    assert_eq!(shown, "a_really_long_file_name_for...");
    assert_eq!(shown.chars().count(), 30);
}
