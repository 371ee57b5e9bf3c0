use pdf_arrange::*;

const W: f32 = 100.0;
const H: f32 = 140.0;
const GAP: f32 = 10.0;

fn container_top(slot: SlotId) -> f32 {
    match slot {
        SlotId::Left => 0.0,
        SlotId::Right => 500.0,
    }
}

/// Both slots stacked vertically, pages in one row each
fn layouts(controller: &SlotController) -> Vec<SlotLayout> {
    SlotId::ALL
        .into_iter()
        .map(|slot| {
            let top = container_top(slot);
            let container = Rect::new(0.0, top, 1000.0, 400.0);
            controller
                .pages()
                .sequence(slot)
                .iter()
                .enumerate()
                .fold(SlotLayout::new(slot, container), |layout, (rank, entry)| {
                    layout.with_entry(
                        entry.id(),
                        Rect::new(rank as f32 * (W + GAP), top + 20.0, W, H),
                    )
                })
        })
        .collect()
}

fn pointer(slot: SlotId, rank: usize, fraction: f32) -> Point {
    Point::new(
        rank as f32 * (W + GAP) + W * fraction,
        container_top(slot) + 20.0 + H / 2.0,
    )
}

fn setup(left: usize, right: usize) -> SlotController {
    let mut controller = SlotController::new(&EditorOptions::default());
    controller.load_document(SlotId::Left, "left.pdf", vec![1u8], left);
    controller.load_document(SlotId::Right, "right.pdf", vec![2u8], right);
    controller
}

fn entry_at(controller: &SlotController, slot: SlotId, rank: usize) -> EntryId {
    controller.pages().sequence(slot)[rank].id()
}

fn labels(controller: &SlotController, slot: SlotId) -> Vec<String> {
    controller
        .pages()
        .sequence(slot)
        .iter()
        .map(|e| e.label())
        .collect()
}

/// Drag `entry` to `to` and release there
fn drag(controller: &mut SlotController, entry: EntryId, to: Point) -> Vec<DragEffect> {
    let layouts = layouts(controller);
    controller.drag_start(entry).unwrap();
    controller.drag_over(&layouts, to);
    controller.drop_dragged(&layouts, to)
}

#[test]
fn test_load_sets_status() {
    let controller = setup(3, 2);
    let status = controller.status().unwrap();
    assert_eq!(status.kind, StatusKind::Success);
    assert_eq!(status.text, "PDF loaded (2 pages) - Right");
}

#[test]
fn test_move_within_slot() {
    let mut controller = setup(3, 1);
    let first = entry_at(&controller, SlotId::Left, 0);

    let effects = drag(&mut controller, first, pointer(SlotId::Left, 2, 0.9));

    assert_eq!(
        effects,
        vec![DragEffect::Move {
            entry: first,
            to_index: 2
        }]
    );
    assert_eq!(labels(&controller, SlotId::Left), ["L - P.2", "L - P.3", "L - P.1"]);
    assert_eq!(controller.status().unwrap().text, "Page moved");
    assert!(controller.is_displaced(first));
    assert!(controller.dragging().is_none());
}

#[test]
fn test_cross_slot_copy() {
    let mut controller = setup(3, 2);
    let third = entry_at(&controller, SlotId::Left, 2);
    let left_before = labels(&controller, SlotId::Left);

    // Leading edge of Right's second page resolves to index 1
    let effects = drag(&mut controller, third, pointer(SlotId::Right, 1, 0.1));

    assert!(matches!(
        effects[..],
        [DragEffect::Copy {
            target: DropTarget {
                slot: SlotId::Right,
                index: 1
            },
            ..
        }]
    ));
    assert_eq!(labels(&controller, SlotId::Left), left_before);

    let copy = &controller.pages().sequence(SlotId::Right)[1];
    assert_eq!(copy.provenance(), Provenance::Copy);
    assert_eq!(copy.source_slot(), SlotId::Left);
    assert_eq!(copy.source_page(), 3);
    assert_eq!(
        controller.status().unwrap().text,
        "Page copied (original page remains)"
    );
}

#[test]
fn test_drop_on_origin_changes_nothing() {
    for rank in 0..4 {
        let mut controller = setup(4, 1);
        let before: Vec<EntryId> = controller
            .pages()
            .sequence(SlotId::Left)
            .iter()
            .map(|e| e.id())
            .collect();
        let entry = before[rank];

        // Leading edge of the page right after the dragged one, or the
        // trailing edge of the one before it when dragging the last page
        let to = if rank + 1 < before.len() {
            pointer(SlotId::Left, rank + 1, 0.1)
        } else {
            pointer(SlotId::Left, rank - 1, 0.9)
        };
        let effects = drag(&mut controller, entry, to);

        assert_eq!(effects, vec![DragEffect::ReturnedToOrigin]);
        let after: Vec<EntryId> = controller
            .pages()
            .sequence(SlotId::Left)
            .iter()
            .map(|e| e.id())
            .collect();
        assert_eq!(after, before);
        assert_eq!(
            controller.status().unwrap().text,
            "Returned to original position (no change)"
        );
    }
}

#[test]
fn test_copy_cannot_go_back() {
    let mut controller = setup(2, 2);
    let left_page = entry_at(&controller, SlotId::Left, 0);
    drag(&mut controller, left_page, pointer(SlotId::Right, 0, 0.1));
    let copy = entry_at(&controller, SlotId::Right, 0);
    assert!(controller.pages().entry(copy).unwrap().is_copy());

    let layouts = layouts(&controller);
    controller.drag_start(copy).unwrap();
    let to = pointer(SlotId::Left, 1, 0.9);
    assert_eq!(controller.drag_over(&layouts, to), None);
    assert_eq!(controller.drop_target(), None);

    let effects = controller.drop_dragged(&layouts, to);
    assert!(matches!(effects[..], [DragEffect::Rejected(_)]));
    assert_eq!(controller.pages().sequence(SlotId::Left).len(), 2);
    assert_eq!(controller.pages().sequence(SlotId::Right).len(), 3);

    let status = controller.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Cannot return copied page to original PDF");
}

#[test]
fn test_target_kept_between_containers() {
    let mut controller = setup(1, 2);
    let entry = entry_at(&controller, SlotId::Left, 0);
    let layouts = layouts(&controller);

    controller.drag_start(entry).unwrap();
    let target = controller.drag_over(&layouts, pointer(SlotId::Right, 0, 0.9));
    assert_eq!(target, Some(DropTarget::new(SlotId::Right, 1)));

    let between = Point::new(50.0, 450.0);
    assert_eq!(controller.drag_over(&layouts, between), target);
    assert_eq!(controller.drop_target(), target);
}

#[test]
fn test_returning_to_slot_restores_its_target() {
    let mut controller = setup(3, 2);
    let first = entry_at(&controller, SlotId::Left, 0);
    let layouts = layouts(&controller);

    controller.drag_start(first).unwrap();
    assert_eq!(
        controller.drag_over(&layouts, pointer(SlotId::Left, 2, 0.9)),
        Some(DropTarget::new(SlotId::Left, 2))
    );
    assert_eq!(controller.drag_over(&layouts, pointer(SlotId::Right, 0, 0.5)), None);
    assert_eq!(controller.drop_target(), None);

    // Back over the dead zone of the page it last resolved against
    let back = pointer(SlotId::Left, 2, 0.5);
    assert_eq!(
        controller.drag_over(&layouts, back),
        Some(DropTarget::new(SlotId::Left, 2))
    );
    let effects = controller.drop_dragged(&layouts, back);

    assert_eq!(
        effects,
        vec![DragEffect::Move {
            entry: first,
            to_index: 2
        }]
    );
    assert_eq!(labels(&controller, SlotId::Left), ["L - P.2", "L - P.3", "L - P.1"]);
}

#[test]
fn test_release_outside_containers_ends_drag() {
    let mut controller = setup(1, 2);
    let entry = entry_at(&controller, SlotId::Left, 0);
    let layouts = layouts(&controller);

    controller.drag_start(entry).unwrap();
    controller.drag_over(&layouts, pointer(SlotId::Right, 0, 0.9));
    let effects = controller.drop_dragged(&layouts, Point::new(50.0, 450.0));

    assert!(effects.is_empty());
    assert!(controller.dragging().is_none());
    assert_eq!(controller.pages().sequence(SlotId::Right).len(), 2);
}

#[test]
fn test_drag_end_is_idempotent() {
    let mut controller = setup(2, 1);
    let entry = entry_at(&controller, SlotId::Left, 0);

    controller.drag_start(entry).unwrap();
    assert!(controller.dragging().is_some());
    controller.drag_end();
    controller.drag_end();
    assert!(controller.dragging().is_none());
    assert_eq!(controller.drop_target(), None);

    // Events after the end are ignored
    let layouts = layouts(&controller);
    assert_eq!(controller.drag_over(&layouts, pointer(SlotId::Left, 1, 0.9)), None);
    assert!(
        controller
            .drop_dragged(&layouts, pointer(SlotId::Left, 1, 0.9))
            .is_empty()
    );
}

#[test]
fn test_drag_start_unknown_entry() {
    let mut controller = setup(1, 1);
    assert!(controller.drag_start(EntryId(4242)).is_err());
    assert!(controller.dragging().is_none());
}

#[test]
fn test_delete() {
    let mut controller = setup(2, 1);
    let first = entry_at(&controller, SlotId::Left, 0);
    let second = entry_at(&controller, SlotId::Left, 1);

    controller.delete(first).unwrap();
    assert_eq!(controller.status().unwrap().text, "Page deleted");

    let err = controller.delete(second).unwrap_err();
    assert!(matches!(
        err,
        ArrangeError::Invariant(InvariantViolation::LastPage)
    ));
    let status = controller.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Cannot delete the last page");
    assert_eq!(controller.pages().sequence(SlotId::Left).len(), 1);
}

#[test]
fn test_assembly_job_preconditions() {
    let mut controller = SlotController::new(&EditorOptions::default());
    let err = controller.assembly_job(SlotId::Left).unwrap_err();
    assert!(matches!(err, ArrangeError::NotLoaded(SlotId::Left)));
    assert_eq!(
        controller.status().unwrap().text,
        "Left PDF is not uploaded. Please upload a PDF first."
    );

    controller.load_document(SlotId::Right, "right.pdf", vec![0u8], 0);
    let err = controller.assembly_job(SlotId::Right).unwrap_err();
    assert!(matches!(err, ArrangeError::NoPages(SlotId::Right)));
    assert_eq!(controller.status().unwrap().text, "Right PDF has no pages");
}

#[test]
fn test_assembly_job_snapshot() {
    let mut controller = setup(3, 1);
    let right_page = entry_at(&controller, SlotId::Right, 0);
    drag(&mut controller, right_page, pointer(SlotId::Left, 0, 0.1));

    let job = controller.assembly_job(SlotId::Left).unwrap();
    assert_eq!(job.slot(), SlotId::Left);
    assert_eq!(job.page_count(), 4);
    assert_eq!(job.source_count(), 2);
    assert_eq!(job.pages()[0].page_number, 1);
    assert_eq!(controller.status().unwrap().text, "Left PDF generating...");

    // Later edits do not leak into the snapshot
    let first = entry_at(&controller, SlotId::Left, 0);
    controller.delete(first).unwrap();
    assert_eq!(job.page_count(), 4);
}

#[test]
fn test_finish_assembly_status() {
    let mut controller = setup(1, 1);

    controller.finish_assembly(SlotId::Left, &Err(ArrangeError::Cancelled));
    let status = controller.take_status().unwrap();
    assert_eq!(status.kind, StatusKind::Info);
    assert_eq!(status.text, "Left PDF generation cancelled");
    assert!(controller.status().is_none());

    let failure = ArrangeError::AssemblyFailure {
        page: Some(2),
        source: Box::new(ArrangeError::LoadFailure("bad xref".to_string())),
    };
    controller.finish_assembly(SlotId::Right, &Err(failure));
    let status = controller.take_status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.text.starts_with("Right PDF generation failed: "));
    assert!(status.text.contains("bad xref"));

    let done = AssembledDocument {
        slot: SlotId::Left,
        bytes: vec![0u8],
        page_count: 1,
    };
    controller.finish_assembly(SlotId::Left, &Ok(done));
    assert_eq!(controller.status().unwrap().text, "Left PDF downloaded");
}

#[test]
fn test_load_abandons_drag() {
    let mut controller = setup(2, 2);
    let entry = entry_at(&controller, SlotId::Left, 0);
    controller.drag_start(entry).unwrap();

    controller.load_document(SlotId::Left, "again.pdf", vec![3u8], 4);
    assert!(controller.dragging().is_none());
    assert_eq!(controller.pages().sequence(SlotId::Left).len(), 4);
}

#[test]
fn test_load_failure_keeps_slot() {
    let mut controller = setup(2, 2);
    controller.load_failed(SlotId::Left, &ArrangeError::LoadFailure("broken".to_string()));

    assert_eq!(controller.pages().sequence(SlotId::Left).len(), 2);
    assert_eq!(controller.status().unwrap().text, "Failed to load PDF (Left)");

    controller.load_cancelled(SlotId::Right);
    assert_eq!(controller.status().unwrap().text, "PDF loading cancelled (Right)");
}
