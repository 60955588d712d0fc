//! Integration tests for the stack arena

use nebula_stack::prelude::*;
use nebula_stack::{MAX_ALIGNMENT, StackStats};
use pretty_assertions::assert_eq;

fn production(capacity: usize) -> StackArena {
    StackArena::with_config(capacity, StackConfig::production())
        .expect("Failed to create stack arena")
}

fn offset(arena: &StackArena, ptr: std::ptr::NonNull<u8>) -> usize {
    ptr.as_ptr() as usize - arena.as_ptr() as usize
}

#[test]
fn test_stack_arena_basic() {
    let mut arena = production(4096);

    let ptr = arena.allocate(128, 8).expect("Allocation failed");
    // SAFETY: `ptr` is a live 128-byte block.
    unsafe {
        std::ptr::write_bytes(ptr.as_ptr(), 0x55, 128);
        assert_eq!(*ptr.as_ptr(), 0x55);
        assert_eq!(*ptr.as_ptr().add(127), 0x55);
    }
    assert_eq!(arena.used(), 136);
}

#[test]
fn test_stack_arena_blocks_do_not_overlap() {
    let mut arena = production(4096);

    let a = arena.allocate(64, 8).expect("Allocation A failed");
    let b = arena.allocate(64, 8).expect("Allocation B failed");
    let c = arena.allocate(64, 8).expect("Allocation C failed");

    // SAFETY: each block is a live 64-byte allocation.
    unsafe {
        std::ptr::write_bytes(a.as_ptr(), 0xAA, 64);
        std::ptr::write_bytes(b.as_ptr(), 0xBB, 64);
        std::ptr::write_bytes(c.as_ptr(), 0xCC, 64);

        assert_eq!(*a.as_ptr().add(63), 0xAA);
        assert_eq!(*b.as_ptr().add(63), 0xBB);
        assert_eq!(*c.as_ptr(), 0xCC);
    }
    assert!(offset(&arena, b) >= offset(&arena, a) + 64);
    assert!(offset(&arena, c) >= offset(&arena, b) + 64);
}

#[test]
fn test_stack_arena_walkthrough() {
    let mut arena = production(1024);
    assert_eq!(arena.marker(), StackMarker::ZERO);

    let first = arena.allocate(100, 16).expect("first allocation");
    assert_eq!(first.as_ptr() as usize % 16, 0);
    assert_eq!(arena.marker().offset(), 116);

    let marker = arena.marker();
    let second = arena.allocate_default(200).expect("second allocation");
    assert_eq!(offset(&arena, second), 128);
    assert_eq!(arena.marker().offset(), 328);

    arena.free_to_marker(marker).expect("rewind");
    assert_eq!(arena.marker().offset(), 116);

    let third = arena.allocate_default(50).expect("third allocation");
    assert_eq!(third, second);

    arena.clear();
    assert_eq!(arena.marker().offset(), 0);
}

#[test]
fn test_stack_arena_marker_round_trip() {
    let mut arena = production(4096);
    arena.allocate(33, 1).expect("prefix");

    let marker = arena.marker();
    for size in [1, 7, 64, 300] {
        arena.allocate(size, 32).expect("inner allocation");
    }
    assert!(arena.marker() > marker);

    arena.free_to_marker(marker).expect("rewind");
    assert_eq!(arena.marker(), marker);
    assert_eq!(arena.used(), 34);
}

#[test]
fn test_stack_arena_nested_markers() {
    let mut arena = production(4096);

    let m0 = arena.marker();
    arena.allocate(64, 8).expect("level 0");
    let m1 = arena.marker();
    arena.allocate(64, 8).expect("level 1");
    let m2 = arena.marker();
    arena.allocate(64, 8).expect("level 2");

    arena.free_to_marker(m2).expect("rewind to m2");
    assert_eq!(arena.marker(), m2);
    arena.free_to_marker(m1).expect("rewind to m1");
    assert_eq!(arena.marker(), m1);
    arena.free_to_marker(m0).expect("rewind to m0");
    assert!(arena.is_empty());
}

#[test]
fn test_stack_arena_every_alignment() {
    let mut arena = production(64 * 1024);
    let mut align = 1;
    while align <= MAX_ALIGNMENT {
        let ptr = arena.allocate(3, align).expect("aligned allocation");
        assert_eq!(ptr.as_ptr() as usize % align, 0, "alignment {align}");
        // SAFETY: `ptr` was just returned by `arena`.
        unsafe {
            assert_eq!(arena.padding_of(ptr).map(|p| p >= 1), Some(true));
        }
        align *= 2;
    }
}

#[test]
fn test_stack_arena_rejects_bad_alignment() {
    let mut arena = production(256);
    for align in [0, 3] {
        let err = arena.allocate(8, align).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.code(), "STACK:ALLOC:ALIGN");
    }
    assert!(arena.is_empty());
}

#[test]
fn test_stack_arena_exhaustion() {
    let mut arena = production(64);
    arena.allocate(48, 16).expect("exact fit");
    assert_eq!(arena.available(), 0);
    assert!(arena.allocate(1, 1).unwrap_err().is_out_of_memory());

    let mut arena = production(64);
    let err = arena.allocate(49, 16).unwrap_err();
    assert_eq!(err.code(), "STACK:ALLOC:OOM");
    assert!(arena.is_empty());

    let err = arena.allocate(100, 8).unwrap_err();
    assert!(matches!(err, StackError::OutOfMemory { requested: 100, .. }));
    assert_eq!(arena.marker(), StackMarker::ZERO);
}

#[test]
fn test_stack_arena_recovers_after_exhaustion() {
    let mut arena = production(128);
    let marker = arena.marker();
    while arena.allocate(16, 8).is_ok() {}
    assert!(arena.available() < 24);

    arena.free_to_marker(marker).expect("rewind");
    arena.allocate(100, 8).expect("space available again");
}

#[test]
fn test_stack_arena_stale_marker_is_reported() {
    let mut arena = production(256);
    arena.allocate(100, 8).expect("allocation");
    let stale = arena.marker();
    arena.clear();

    let err = arena.free_to_marker(stale).unwrap_err();
    assert_eq!(
        err,
        StackError::InvalidMarker {
            marker: 108,
            top: 0
        }
    );
    assert!(arena.is_empty());
}

#[test]
fn test_stack_arena_guard_restores_on_error() {
    fn build(arena: &mut StackArena) -> StackResult<()> {
        let mut frame = arena.guard();
        frame.allocate(128, 16)?;
        frame.allocate(4096, 16)?;
        Ok(())
    }

    let mut arena = production(1024);
    arena.allocate(10, 16).expect("prefix");
    let before = arena.marker();

    assert!(build(&mut arena).is_err());
    assert_eq!(arena.marker(), before);
}

#[test]
fn test_stack_arena_scoped_with_question_mark() {
    let mut arena = production(1024);
    let result: StackResult<()> = arena.scoped(|scope| {
        scope.allocate(64, 8)?;
        scope.allocate(0, 8)?;
        Ok(())
    });
    assert_eq!(result, Err(StackError::ZeroSize));
    assert!(arena.is_empty());
}

#[test]
fn test_stack_arena_stats() {
    let config = StackConfig::production().with_stats(true);
    let mut arena = StackArena::with_config(1024, config).expect("arena");

    {
        let mut frame = arena.guard();
        frame.allocate(300, 8).expect("allocation");
    }
    arena.allocate(10, 8).expect("allocation");
    let _ = arena.allocate(4096, 8);

    let stats = arena.stats();
    assert_eq!(
        stats,
        StackStats {
            allocations: 2,
            failed_allocations: 1,
            rewinds: 1,
            clears: 0,
            peak_used: 308,
            used: 18,
            capacity: 1024,
        }
    );
}

#[test]
fn test_stack_arena_take() {
    let mut arena = production(512);
    arena.allocate(64, 8).expect("allocation");

    let mut moved = arena.take();
    assert_eq!(moved.used(), 72);
    moved.allocate(64, 8).expect("moved arena keeps working");

    assert_eq!(arena.capacity(), 0);
    assert!(arena.allocate(1, 1).is_err());
}

#[test]
fn test_stack_arena_moves_to_another_thread() {
    let mut arena = production(256);
    arena.allocate(16, 8).expect("allocation");

    let used = std::thread::spawn(move || {
        arena.allocate(16, 8).expect("allocation on worker");
        arena.used()
    })
    .join()
    .expect("worker panicked");

    assert_eq!(used, 48);
}

#[test]
fn test_stack_arena_guard_is_bound_to_its_arena() {
    let mut arena = production(1024);
    let mut other = production(1024);
    other.allocate(500, 8).expect("other arena prefix");

    {
        let mut frame = arena.guard();
        frame.allocate(100, 8).expect("guarded allocation");
        {
            let mut inner = frame.guard();
            inner.allocate(32, 8).expect("nested allocation");
        }
        assert_eq!(frame.allocated_since(), 108);
    }

    assert!(arena.is_empty());
    assert_eq!(other.used(), 508);
}
