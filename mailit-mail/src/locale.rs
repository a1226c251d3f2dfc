//! Active language for rendering.
//!
//! Two layers, innermost first:
//!
//! - the forced language of the render in progress, set by
//!   [`force_language`] and restored when its guard drops, on every exit
//!   path. Rendering is synchronous, so the guard never spans an `.await`.
//! - the language of the current task, set by [`with_language`] for the
//!   duration of a future. It follows the task across worker threads and is
//!   invisible to every other task.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;

tokio::task_local! {
    static TASK_LANGUAGE: String;
}

thread_local! {
    static FORCED: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// The active language, if any.
pub fn get_language() -> Option<String> {
    FORCED
        .with(|forced| forced.borrow().clone())
        .or_else(|| TASK_LANGUAGE.try_with(Clone::clone).ok())
}

/// Run `future` with `language` as the language of the current task.
///
/// ```rust,ignore
/// locale::with_language("de", mailer.send_mail(request)).await?;
/// ```
pub async fn with_language<F: Future>(language: impl Into<String>, future: F) -> F::Output {
    TASK_LANGUAGE.scope(language.into(), future).await
}

/// Make `language` active until the returned guard is dropped.
#[must_use = "the previous language is restored as soon as the guard drops"]
pub fn force_language(language: impl Into<String>) -> LanguageGuard {
    let language = language.into();
    let previous = FORCED.with(|forced| forced.replace(Some(language)));
    LanguageGuard {
        previous,
        _not_send: PhantomData,
    }
}

/// Restores the previously forced language on drop.
///
/// Not `Send`: the forced language lives in a thread-local, so the guard
/// must not cross an `.await` that could resume on another thread.
#[derive(Debug)]
pub struct LanguageGuard {
    previous: Option<String>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for LanguageGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        FORCED.with(|forced| *forced.borrow_mut() = previous);
    }
}
