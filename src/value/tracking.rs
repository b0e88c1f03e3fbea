//! Live-value accounting for leak checks.

use std::cell::Cell;

thread_local! {
    static LIVE_VALUES: Cell<i64> = const { Cell::new(0) };
}

pub(super) fn value_created() {
    LIVE_VALUES.with(|live| live.set(live.get() + 1));
}

pub(super) fn value_destroyed() {
    LIVE_VALUES.with(|live| live.set(live.get() - 1));
}

/// Values constructed minus values destroyed on the current thread.
///
/// The thread's shared constants are included once they have been materialized.
pub fn live_value_count() -> i64 {
    LIVE_VALUES.with(Cell::get)
}
