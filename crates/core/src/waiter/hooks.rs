//! Poll loop hooks
//!
//! Hooks are closures over the 1-indexed attempt number. They run in
//! registration order on the loop's task and answer with a [`HookAction`].
//! A `Succeed` or `Fail` answer short-circuits the remaining hooks of the
//! phase and ends the session.

use std::fmt;
use std::time::Duration;

use waitline_common::time::Clock;
use waitline_common::PacedBackoff;
use waitline_domain::ProbeResponse;

/// What a hook asks the poll loop to do
#[derive(Debug, Clone, PartialEq)]
pub enum HookAction {
    /// Carry on with the cycle
    Continue,
    /// Suspend for this long once the phase's hooks have run
    ///
    /// In the before-wait phase this replaces the waiter interval for the
    /// current cycle.
    Delay(Duration),
    /// End the session successfully, optionally with a response
    Succeed(Option<ProbeResponse>),
    /// End the session with a forced failure
    Fail(String),
}

/// A hook installed on a waiter
pub type Hook = Box<dyn FnMut(u32) -> HookAction + Send>;

/// Combined answer of every hook in one phase
#[derive(Debug, PartialEq)]
pub(crate) enum Dispatch {
    Proceed { delay: Option<Duration> },
    Succeed(Option<ProbeResponse>),
    Fail(String),
}

/// Run `hooks` in order for `attempt`
///
/// When several hooks ask for a delay, the longest one wins.
pub(crate) fn dispatch(hooks: &mut [Hook], attempt: u32) -> Dispatch {
    let mut delay: Option<Duration> = None;
    for hook in hooks.iter_mut() {
        match hook(attempt) {
            HookAction::Continue => {}
            HookAction::Delay(requested) => {
                delay = Some(delay.map_or(requested, |current| current.max(requested)));
            }
            HookAction::Succeed(response) => return Dispatch::Succeed(response),
            HookAction::Fail(reason) => return Dispatch::Fail(reason),
        }
    }
    Dispatch::Proceed { delay }
}

/// Before-attempt hook that fails the session once `max_wait` has elapsed
///
/// The clock is read when the hook is created, so build it right before the
/// session starts.
pub fn deadline<C>(clock: C, max_wait: Duration) -> impl FnMut(u32) -> HookAction + Send + 'static
where
    C: Clock + 'static,
{
    let started = clock.now();
    move |attempt| {
        let elapsed = clock.now().saturating_duration_since(started);
        if elapsed > max_wait {
            HookAction::Fail(format!(
                "deadline of {} exceeded after {} before attempt {attempt}",
                DisplayDuration(max_wait),
                DisplayDuration(elapsed)
            ))
        } else {
            HookAction::Continue
        }
    }
}

/// Before-wait hook that paces attempts with a backoff strategy
///
/// Pair it with a zero interval; the delay after attempt `n` is
/// `backoff.delay_for_attempt(n)`.
pub fn backoff(backoff: PacedBackoff) -> impl FnMut(u32) -> HookAction + Send + 'static {
    move |attempt| HookAction::Delay(backoff.delay_for_attempt(attempt))
}

struct DisplayDuration(Duration);

impl fmt::Display for DisplayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis % 1000 == 0 {
            write!(f, "{}s", millis / 1000)
        } else {
            write!(f, "{millis}ms")
        }
    }
}
