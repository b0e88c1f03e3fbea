//! The termination channel: the one place every runtime error passes through.
//!
//! The mode is process-wide. In [`TerminationMode::Exit`] a raise prints the
//! diagnostic to stderr and ends the process; in [`TerminationMode::Unwind`] it
//! records the diagnostic and hands the error back so the host can catch it.
//! The last diagnostic and the current script belong to the runtime instance,
//! which is the current thread.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{PoisonError, RwLock};

use colored::Colorize;
use lazy_static::lazy_static;
use serde::Serialize;

use super::{EidosError, ErrorCategory, RuntimeResult};
use crate::span::Span;

/// What a raise does once the diagnostic has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TerminationMode {
    /// Print to stderr and exit with a failure status.
    Exit,
    /// Return the error to the caller; the host catches it.
    #[default]
    Unwind,
}

#[derive(Debug, Clone, Copy, Default)]
struct TerminationState {
    mode: TerminationMode,
    print_backtrace: bool,
}

lazy_static! {
    static ref TERMINATION: RwLock<TerminationState> = RwLock::new(TerminationState::default());
}

thread_local! {
    static LAST_RAISE: RefCell<Option<Diagnostic>> = const { RefCell::new(None) };
    static CURRENT_SCRIPT: RefCell<Option<Rc<str>>> = const { RefCell::new(None) };
    static BLAME: Cell<Option<Span>> = const { Cell::new(None) };
}

pub fn set_termination_mode(mode: TerminationMode) {
    TERMINATION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .mode = mode;
}

pub fn termination_mode() -> TerminationMode {
    TERMINATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .mode
}

pub fn set_print_backtrace(enabled: bool) {
    TERMINATION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .print_backtrace = enabled;
}

/// Registers the script being executed so diagnostics can quote the offending line.
pub fn set_current_script(source: Option<&str>) {
    CURRENT_SCRIPT.with(|script| *script.borrow_mut() = source.map(Rc::from));
}

struct BlameGuard(Option<Span>);

impl Drop for BlameGuard {
    fn drop(&mut self) {
        BLAME.with(|blame| blame.set(self.0));
    }
}

/// Runs `f` with `span` blamed for every raise inside it that carries no span.
///
/// Host elements raise without knowing which script expression called them;
/// the runtime wraps those calls with the span of the calling expression.
pub fn with_blame<T>(span: Option<Span>, f: impl FnOnce() -> RuntimeResult<T>) -> RuntimeResult<T> {
    if span.is_none() {
        return f();
    }
    let _restore = BlameGuard(BLAME.with(|blame| blame.replace(span)));
    f()
}

/// Where the last error happened, in script coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorPosition {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

/// A rendered report of one raise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub context: &'static str,
    pub message: String,
    pub position: Option<ErrorPosition>,
    pub script_excerpt: Option<String>,
    pub backtrace: Option<String>,
}

impl Diagnostic {
    fn build(error: &EidosError, script: Option<&str>, print_backtrace: bool) -> Self {
        let position = error.span().map(|span| position_in(span, script));
        let script_excerpt = match (script, position) {
            (Some(source), Some(position)) => excerpt(source, position),
            _ => None,
        };
        let backtrace = print_backtrace.then(|| Backtrace::force_capture().to_string());

        Self {
            category: error.category(),
            context: error.context(),
            message: error.to_string(),
            position,
            script_excerpt,
            backtrace,
        }
    }

    /// The full diagnostic text, newline-terminated sections included.
    pub fn render(&self) -> String {
        let mut text = format!("ERROR ({}): {}\n", self.context, self.message);
        if let Some(backtrace) = &self.backtrace {
            text.push_str("\nstack backtrace:\n");
            text.push_str(backtrace);
            text.push('\n');
        }
        if let Some(excerpt) = &self.script_excerpt {
            text.push('\n');
            text.push_str(excerpt);
        }
        text
    }
}

fn position_in(span: Span, script: Option<&str>) -> ErrorPosition {
    let located = match script {
        Some(source) => Span::locate(source, span.start, span.end),
        None => span,
    };
    ErrorPosition {
        start: span.start,
        end: span.end.max(span.start),
        line: located.line,
        column: located.column,
    }
}

fn excerpt(source: &str, position: ErrorPosition) -> Option<String> {
    let line_text = source.lines().nth(position.line.checked_sub(1)?)?;
    let line_chars = line_text.chars().count();
    let column = position.column.saturating_sub(1).min(line_chars);
    let width = position.end.saturating_sub(position.start).clamp(1, (line_chars - column).max(1));

    Some(format!(
        "Error on script line {}, character {}:\n\n{}\n{}{}\n",
        position.line,
        column,
        line_text,
        " ".repeat(column),
        "^".repeat(width)
    ))
}

/// Reports `error` through the termination channel.
///
/// An error without a span picks up the one installed by [`with_blame`].
/// In exit mode this does not return. In unwind mode it returns `Err(error)`,
/// so call sites read `return raise(EidosError::...)` or use it inside
/// `map_err`/`?` chains.
#[cold]
pub fn raise<T>(error: EidosError) -> RuntimeResult<T> {
    let error = match (error.span(), BLAME.with(Cell::get)) {
        (None, Some(blame)) => error.with_span(Some(blame)),
        _ => error,
    };
    let state = *TERMINATION.read().unwrap_or_else(PoisonError::into_inner);
    let script = CURRENT_SCRIPT.with(|script| script.borrow().clone());
    let diagnostic = Diagnostic::build(&error, script.as_deref(), state.print_backtrace);

    match state.mode {
        TerminationMode::Exit => {
            tracing::error!(context = error.context(), category = ?error.category(), "{}", error);
            let text = diagnostic.render();
            eprint!("{}", text.replacen("ERROR", &"ERROR".red().bold().to_string(), 1));
            std::process::exit(1);
        }
        TerminationMode::Unwind => {
            tracing::warn!(context = error.context(), category = ?error.category(), "{}", error);
            LAST_RAISE.with(|last| *last.borrow_mut() = Some(diagnostic));
            Err(error)
        }
    }
}

pub fn untrimmed_raise_message() -> String {
    LAST_RAISE.with(|last| {
        last.borrow()
            .as_ref()
            .map(Diagnostic::render)
            .unwrap_or_default()
    })
}

/// The last diagnostic with leading and trailing newlines removed.
pub fn trimmed_raise_message() -> String {
    untrimmed_raise_message().trim_matches('\n').to_string()
}

pub fn last_error_position() -> Option<ErrorPosition> {
    LAST_RAISE.with(|last| last.borrow().as_ref().and_then(|d| d.position))
}

pub fn last_diagnostic() -> Option<Diagnostic> {
    LAST_RAISE.with(|last| last.borrow().clone())
}

pub fn last_diagnostic_json() -> Option<String> {
    last_diagnostic().and_then(|diagnostic| serde_json::to_string(&diagnostic).ok())
}

pub fn clear_raise_message() {
    LAST_RAISE.with(|last| *last.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unwind_records_message() {
        clear_raise_message();
        let result: RuntimeResult<()> =
            raise(EidosError::index_out_of_range("Value::int_at", 4, 2));
        assert!(result.is_err());
        assert_eq!(
            trimmed_raise_message(),
            "ERROR (Value::int_at): subscript 4 out of range for a value of size 2"
        );
        assert!(untrimmed_raise_message().ends_with('\n'));
        assert_eq!(last_error_position(), None);
    }

    #[test]
    fn test_excerpt_points_at_span() {
        clear_raise_message();
        let script = "x = 1;\ny = x + \"a\";";
        set_current_script(Some(script));
        let _: RuntimeResult<()> = raise(
            EidosError::type_error("compare", "cannot compare").with_span(Some(Span::new(11, 18, 0, 0))),
        );
        set_current_script(None);

        let position = last_error_position().unwrap();
        assert_eq!((position.line, position.column), (2, 5));

        let text = untrimmed_raise_message();
        assert!(text.contains("Error on script line 2, character 4:"));
        assert!(text.contains("y = x + \"a\";\n    ^^^^^^^\n"));
    }

    #[test]
    fn test_json_rendering() {
        clear_raise_message();
        let _: RuntimeResult<()> = raise(EidosError::contract("registry", "conflict"));
        let json = last_diagnostic_json().unwrap();
        assert!(json.contains("\"category\":\"Contract\""));
        assert!(json.contains("\"context\":\"registry\""));
    }

    #[test]
    fn test_clear_resets_message() {
        let _: RuntimeResult<()> = raise(EidosError::contract("registry", "conflict"));
        clear_raise_message();
        assert_eq!(untrimmed_raise_message(), "");
        assert!(last_diagnostic().is_none());
    }

    #[test]
    fn test_reversed_span_does_not_panic() {
        clear_raise_message();
        set_current_script(Some("abcdef"));
        let _: RuntimeResult<()> = raise(
            EidosError::type_error("compare", "cannot compare").with_span(Some(Span::new(4, 1, 1, 5))),
        );
        set_current_script(None);

        let position = last_error_position().unwrap();
        assert_eq!((position.start, position.end), (4, 4));
        assert!(untrimmed_raise_message().contains("abcdef\n    ^\n"));
    }

    #[test]
    fn test_blame_fills_missing_span() {
        clear_raise_message();
        let blamed = Span::new(3, 7, 1, 4);
        let result: RuntimeResult<()> = with_blame(Some(blamed), || {
            raise(EidosError::contract("host", "no span here"))
        });
        assert_eq!(result.unwrap_err().span(), Some(blamed));
        assert_eq!(last_error_position().map(|p| (p.start, p.end)), Some((3, 7)));

        // An explicit span wins, and the blame does not outlive the call
        let own = Span::new(0, 1, 1, 1);
        let result: RuntimeResult<()> = with_blame(Some(blamed), || {
            raise(EidosError::contract("host", "spanned").with_span(Some(own)))
        });
        assert_eq!(result.unwrap_err().span(), Some(own));
        let result: RuntimeResult<()> = raise(EidosError::contract("host", "after"));
        assert_eq!(result.unwrap_err().span(), None);
    }
}
