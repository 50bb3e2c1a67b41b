//! Attaching a logger to the current call context.
//!
//! Synchronous code attaches a logger for the duration of a closure with
//! [`scope`]; async code attaches one to a future with [`scope_async`],
//! which follows the future across worker threads. [`current`] returns the
//! innermost attached logger and falls back to a logger that discards
//! everything.
//!
//! Inside a [`scope_async`] future, [`scope`] pushes onto the future's own
//! stack, so nesting works in both directions.

use std::cell::RefCell;
use std::future::Future;

use crate::logger::Logger;

thread_local! {
    static SCOPED: RefCell<Vec<Logger>> = const { RefCell::new(Vec::new()) };
}

tokio::task_local! {
    static TASK_SCOPED: RefCell<Vec<Logger>>;
}

/// Pops the innermost logger from the stack it was pushed on, also when the
/// closure unwinds.
enum ScopeGuard {
    Task,
    Thread,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        match self {
            ScopeGuard::Task => {
                let _ = TASK_SCOPED.try_with(|stack| stack.borrow_mut().pop());
            }
            ScopeGuard::Thread => {
                let _ = SCOPED.try_with(|stack| stack.borrow_mut().pop());
            }
        }
    }
}

/// Run `f` with `logger` attached to the current context: the enclosing
/// [`scope_async`] future if there is one, otherwise the current thread.
pub fn scope<R>(logger: Logger, f: impl FnOnce() -> R) -> R {
    let _guard = match TASK_SCOPED.try_with(|stack| stack.borrow_mut().push(logger.clone())) {
        Ok(()) => ScopeGuard::Task,
        Err(_) => {
            SCOPED.with(|stack| stack.borrow_mut().push(logger));
            ScopeGuard::Thread
        }
    };
    f()
}

/// Run `fut` with `logger` attached to it.
pub async fn scope_async<F: Future>(logger: Logger, fut: F) -> F::Output {
    TASK_SCOPED.scope(RefCell::new(vec![logger]), fut).await
}

/// The innermost attached logger, or [`Logger::discard`] if there is none.
pub fn current() -> Logger {
    if let Ok(Some(logger)) = TASK_SCOPED.try_with(|stack| stack.borrow().last().cloned()) {
        return logger;
    }
    SCOPED
        .try_with(|stack| stack.borrow().last().cloned())
        .ok()
        .flatten()
        .unwrap_or_else(Logger::discard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;

    #[test]
    fn falls_back_to_discard() {
        let logger = current();
        assert!(logger.fields().is_empty());
        logger.write("goes nowhere", &[&"k", &1]);
    }

    #[test]
    fn nested_scopes_restore_outer() {
        let outer = Logger::discard().with(&[&"level", &"outer"]);
        let inner = Logger::discard().with(&[&"level", &"inner"]);

        scope(outer, || {
            assert_eq!(current().fields().get("level"), Some(r#""outer""#));
            scope(inner, || {
                assert_eq!(current().fields().get("level"), Some(r#""inner""#));
            });
            assert_eq!(current().fields().get("level"), Some(r#""outer""#));
        });
        assert!(current().fields().is_empty());
    }

    #[test]
    fn scope_pops_on_panic() {
        let logger = Logger::discard().with(&[&"k", &1]);
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            scope(logger, || panic!("inside scope"));
        }));
        assert!(result.is_err());
        assert!(current().fields().is_empty());
    }

    #[tokio::test]
    async fn task_scope_follows_future() {
        let logger = Logger::discard().with(&[&"request_id", &7]);
        let seen = scope_async(logger, async {
            tokio::task::yield_now().await;
            current().fields().get("request_id").map(str::to_owned)
        })
        .await;
        assert_eq!(seen.as_deref(), Some("7"));
        assert!(current().fields().is_empty());
    }

    #[tokio::test]
    async fn thread_scope_nests_inside_task_scope() {
        let outer = Logger::discard().with(&[&"level", &"task"]);
        let inner = Logger::discard().with(&[&"level", &"closure"]);
        let seen = scope_async(outer, async {
            let nested = scope(inner, || current().fields().get("level").map(str::to_owned));
            tokio::task::yield_now().await;
            let after = current().fields().get("level").map(str::to_owned);
            (nested, after)
        })
        .await;
        assert_eq!(seen.0.as_deref(), Some(r#""closure""#));
        assert_eq!(seen.1.as_deref(), Some(r#""task""#));
    }

    #[test]
    fn task_scope_nests_inside_thread_scope() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let outer = Logger::discard().with(&[&"level", &"thread"]);
        let inner = Logger::discard().with(&[&"level", &"task"]);
        let seen = scope(outer, || {
            let nested = runtime.block_on(scope_async(inner, async {
                current().fields().get("level").map(str::to_owned)
            }));
            (nested, current().fields().get("level").map(str::to_owned))
        });
        assert_eq!(seen.0.as_deref(), Some(r#""task""#));
        assert_eq!(seen.1.as_deref(), Some(r#""thread""#));
    }
}
