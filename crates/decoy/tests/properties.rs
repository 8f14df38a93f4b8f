// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests for call recording and resolution.

use decoy::{spy, stub};
use proptest::prelude::*;

proptest! {
    #[test]
    fn call_count_matches_invocations(inputs in prop::collection::vec(any::<i32>(), 0..64)) {
        let s = spy::<(i32,), ()>();
        for x in &inputs {
            s.call((*x,));
        }

        prop_assert_eq!(s.call_count(), inputs.len());
        prop_assert_eq!(s.called(), !inputs.is_empty());
        let recorded: Vec<i32> = s.calls().iter().map(|c| c.args().0).collect();
        prop_assert_eq!(&recorded, &inputs);
        prop_assert!(s.get_call(inputs.len()).is_none());
    }

    #[test]
    fn called_with_iff_some_call_matches(
        inputs in prop::collection::vec((any::<u8>(), any::<u8>()), 0..16),
        probe in (any::<u8>(), any::<u8>()),
    ) {
        let s = spy::<(u8, u8), ()>();
        for args in &inputs {
            s.call(*args);
        }
        prop_assert_eq!(s.called_with(&probe), inputs.contains(&probe));
    }

    #[test]
    fn fixed_value_returned_until_reconfigured(value in any::<i64>(), calls in 1usize..16) {
        let s = spy::<(), i64>();
        s.returns(value);
        for _ in 0..calls {
            prop_assert_eq!(s.call(()), Some(value));
        }
        prop_assert!(s.calls().iter().all(|c| c.return_value() == Some(&value)));

        s.calls_fake(|()| 0);
        prop_assert_eq!(s.call(()), Some(0));
    }

    #[test]
    fn pass_through_matches_original(xs in prop::collection::vec(-1000i32..1000, 1..32)) {
        let s = stub(|(x,): (i32,)| x * 3 - 1);
        s.pass_through();
        for x in &xs {
            prop_assert_eq!(s.call((*x,)), Some(x * 3 - 1));
        }
        for x in &xs {
            prop_assert!(s.returned(&(x * 3 - 1)));
        }
    }

    #[test]
    fn reset_restarts_count_but_keeps_mode(value in any::<u16>(), before in 1usize..8) {
        let s = spy::<(), u16>();
        s.returns(value);
        for _ in 0..before {
            s.call(());
        }
        s.reset();
        prop_assert_eq!(s.call_count(), 0);
        prop_assert_eq!(s.call(()), Some(value));
        prop_assert_eq!(s.call_count(), 1);
    }
}
