// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handlers invoked from many threads at once.

use decoy::{spy, PatchRegistry};
use decoy_dry_tests::Calculator;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const CALLS_PER_THREAD: usize = 250;

#[test]
fn concurrent_calls_are_all_recorded() {
    let s = spy::<(usize, usize), ()>();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let handler = s.handler().clone();
            scope.spawn(move || {
                for i in 0..CALLS_PER_THREAD {
                    handler.call((t, i));
                }
            });
        }
    });

    assert_eq!(s.call_count(), THREADS * CALLS_PER_THREAD);
    let seen: BTreeSet<(usize, usize)> = s.calls().iter().map(|c| *c.args()).collect();
    assert_eq!(seen.len(), THREADS * CALLS_PER_THREAD);

    // Per-thread order survives interleaving.
    for t in 0..THREADS {
        let order: Vec<usize> = s
            .calls()
            .iter()
            .filter(|c| c.args().0 == t)
            .map(|c| c.args().1)
            .collect();
        assert_eq!(order, (0..CALLS_PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn patched_slot_shared_across_threads() {
    let registry = PatchRegistry::scoped();
    let calc = Arc::new(Calculator::new());
    let add = registry.spy_method(&calc.add);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let calc = Arc::clone(&calc);
            scope.spawn(move || {
                let t = i64::try_from(t).unwrap();
                assert_eq!(calc.add(t, 1), Some(t + 1));
            });
        }
    });

    assert_eq!(add.call_count(), THREADS);
    assert!(add.calls().iter().all(|c| c.context().is_some_and(|ctx| ctx.is(&*calc))));
}
