mod common;

use common::setup;
use ksem::SysError;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Up,
    Down,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Up), Just(Op::Down)]
}

proptest! {
    #[test]
    fn value_tracks_non_blocking_sequences(
        initial in 0isize..8,
        ops in proptest::collection::vec(op(), 0..64),
    ) {
        let (scheduler, registry) = setup();
        let id = registry.create(initial).unwrap();
        let mut model = initial;
        for op in ops {
            match op {
                Op::Up => {
                    registry.up(id).unwrap();
                    model += 1;
                }
                // a down on an empty semaphore would block this thread
                Op::Down if model > 0 => {
                    registry.down(id).unwrap();
                    model -= 1;
                }
                Op::Down => {}
            }
            let stat = registry.stat(id).unwrap();
            prop_assert_eq!(stat.value, model);
            prop_assert_eq!(stat.waiters, 0);
        }
        prop_assert!(scheduler.events().is_empty());
    }

    #[test]
    fn created_ids_strictly_increase(values in proptest::collection::vec(-4isize..16, 1..32)) {
        let (_scheduler, registry) = setup();
        let mut last = None;
        let mut live = 0;
        for value in values {
            match registry.create(value) {
                Ok(id) => {
                    prop_assert!(value >= 0);
                    if let Some(prev) = last {
                        prop_assert!(id > prev);
                    }
                    last = Some(id);
                    live += 1;
                }
                Err(err) => {
                    prop_assert!(value < 0);
                    prop_assert_eq!(err, SysError::InvalidArgument);
                }
            }
            prop_assert_eq!(registry.len(), live);
        }
    }
}
