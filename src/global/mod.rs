//! Process-wide state: the string registry, reserved IDs, named colors and warm-up.

pub mod color;
pub mod ids;
pub mod registry;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RuntimeConfig;
use crate::error::{set_print_backtrace, set_termination_mode};

pub use color::{color_components, color_components_u8, color_string, NamedColor, NAMED_COLORS};
pub use registry::{
    global_string_id_for, lookup_global_string_id, register_string_for_global_id,
    registered_string_count, string_for_global_id, try_string_for_global_id, GlobalStringId,
};

static WARMED_UP: AtomicBool = AtomicBool::new(false);

/// Prepares the runtime for script execution.
///
/// Applies `config` to the termination channel, registers every reserved
/// global string, builds the built-in class tables and materializes the
/// constant values of the calling thread. Must run before any value or class
/// is constructed; calling it again only re-applies the configuration.
pub fn warm_up(config: RuntimeConfig) {
    set_termination_mode(config.termination_mode);
    set_print_backtrace(config.print_backtrace);

    // Constants are per thread, so every calling thread materializes its own
    crate::value::statics::materialize();

    if WARMED_UP.swap(true, Ordering::AcqRel) {
        tracing::debug!(mode = ?config.termination_mode, "runtime already warmed up; configuration re-applied");
        return;
    }

    for &(id, text) in ids::RESERVED {
        debug_assert_eq!(global_string_id_for(text), id);
    }
    crate::object::warm_up_classes();

    tracing::debug!(
        mode = ?config.termination_mode,
        backtrace = config.print_backtrace,
        strings = registered_string_count(),
        "runtime warmed up"
    );
}

pub fn is_warmed_up() -> bool {
    WARMED_UP.load(Ordering::Acquire)
}
