//! Loading-state union for feed consumers.
//!
//! Combination precedence: the first `Failed` wins, then `Loading`, then
//! `Idle`; only all-`Ready` inputs produce `Ready`.

/// State of a value that arrives asynchronously (a query, a feed snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncState<T, E> {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready(T),
    Failed(E),
}

impl<T, E> AsyncState<T, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, AsyncState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AsyncState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AsyncState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AsyncState::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            AsyncState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            AsyncState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> AsyncState<&T, &E> {
        match self {
            AsyncState::Idle => AsyncState::Idle,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(v) => AsyncState::Ready(v),
            AsyncState::Failed(e) => AsyncState::Failed(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AsyncState<U, E> {
        match self {
            AsyncState::Idle => AsyncState::Idle,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(v) => AsyncState::Ready(f(v)),
            AsyncState::Failed(e) => AsyncState::Failed(e),
        }
    }

    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> AsyncState<T, F> {
        match self {
            AsyncState::Idle => AsyncState::Idle,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(v) => AsyncState::Ready(v),
            AsyncState::Failed(e) => AsyncState::Failed(f(e)),
        }
    }

    /// Chain a fallible step onto a ready value.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, E>) -> AsyncState<U, E> {
        match self {
            AsyncState::Idle => AsyncState::Idle,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(v) => f(v).into(),
            AsyncState::Failed(e) => AsyncState::Failed(e),
        }
    }

    /// Ready value or `default` for every other state.
    pub fn ready_or(self, default: T) -> T {
        match self {
            AsyncState::Ready(v) => v,
            _ => default,
        }
    }

    /// Combine two states into a state of the pair.
    pub fn zip<U>(self, other: AsyncState<U, E>) -> AsyncState<(T, U), E> {
        match (self, other) {
            (AsyncState::Failed(e), _) | (_, AsyncState::Failed(e)) => AsyncState::Failed(e),
            (AsyncState::Loading, _) | (_, AsyncState::Loading) => AsyncState::Loading,
            (AsyncState::Idle, _) | (_, AsyncState::Idle) => AsyncState::Idle,
            (AsyncState::Ready(a), AsyncState::Ready(b)) => AsyncState::Ready((a, b)),
        }
    }
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        AsyncState::Idle
    }
}

impl<T, E> From<Result<T, E>> for AsyncState<T, E> {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(v) => AsyncState::Ready(v),
            Err(e) => AsyncState::Failed(e),
        }
    }
}

/// Combine any number of same-typed states.
///
/// An empty input is `Ready(vec![])`.
pub fn collect<T, E, I>(states: I) -> AsyncState<Vec<T>, E>
where
    I: IntoIterator<Item = AsyncState<T, E>>,
{
    let mut values = Vec::new();
    let mut loading = false;
    let mut idle = false;

    for s in states {
        match s {
            AsyncState::Failed(e) => return AsyncState::Failed(e),
            AsyncState::Loading => loading = true,
            AsyncState::Idle => idle = true,
            AsyncState::Ready(v) => values.push(v),
        }
    }

    if loading {
        AsyncState::Loading
    } else if idle {
        AsyncState::Idle
    } else {
        AsyncState::Ready(values)
    }
}
