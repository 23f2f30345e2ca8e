use proptest::prelude::*;
use shop_api::services::cart::next_quantity;
use shop_api::services::CartAction;

fn action() -> impl Strategy<Value = CartAction> {
    prop_oneof![
        Just(CartAction::Add),
        Just(CartAction::Reduce),
        Just(CartAction::Delete),
    ]
}

proptest! {
    /// A line either does not exist or holds a strictly positive
    /// quantity; no action sequence can produce a zero or negative row.
    #[test]
    fn quantity_is_always_positive(actions in proptest::collection::vec(action(), 0..64)) {
        let mut line: Option<i32> = None;
        for a in actions {
            line = next_quantity(line, a);
            if let Some(q) = line {
                prop_assert!(q >= 1);
            }
        }
    }

    /// The quantity tracks adds minus reduces exactly, floored at
    /// line deletion.
    #[test]
    fn adds_accumulate_one_by_one(n in 1..100i32) {
        let mut line: Option<i32> = None;
        for _ in 0..n {
            line = next_quantity(line, CartAction::Add);
        }
        prop_assert_eq!(line, Some(n));
    }

    /// Reducing as many times as was added always lands back on an
    /// empty line, never below.
    #[test]
    fn full_reduction_empties_the_line(n in 1..100i32) {
        let mut line: Option<i32> = None;
        for _ in 0..n {
            line = next_quantity(line, CartAction::Add);
        }
        for _ in 0..n {
            line = next_quantity(line, CartAction::Reduce);
        }
        prop_assert_eq!(line, None);

        // One more reduce stays a no-op.
        prop_assert_eq!(next_quantity(line, CartAction::Reduce), None);
    }

    /// Delete is absorbing: whatever the state, it clears the line.
    #[test]
    fn delete_always_clears(actions in proptest::collection::vec(action(), 0..32)) {
        let mut line: Option<i32> = None;
        for a in actions {
            line = next_quantity(line, a);
        }
        prop_assert_eq!(next_quantity(line, CartAction::Delete), None);
    }
}
