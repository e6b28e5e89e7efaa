use tokio::time::sleep;
use tracing::debug;

use crate::error::Result;
use crate::scrapers::traits::PageSession;
use crate::scrapers::types::{QuiescencePolicy, ScrapeSettings};

/// Wait for `selector`, retrying with backoff. `Ok(false)` once the budget is spent.
pub async fn wait_with_retry<S>(session: &S, selector: &str, settings: &ScrapeSettings) -> Result<bool>
where
    S: PageSession + ?Sized,
{
    let attempts = settings.retry.attempts.max(1);

    for attempt in 0..attempts {
        if session.wait_for(selector, settings.element_timeout()).await? {
            return Ok(true);
        }
        if attempt + 1 < attempts {
            let delay = settings.retry.backoff(attempt);
            debug!(
                "'{}' not present (attempt {}/{}), retrying in {:?}",
                selector,
                attempt + 1,
                attempts,
                delay
            );
            sleep(delay).await;
        }
    }

    Ok(false)
}

/// Outcome of polling a page region until it stops changing
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// Two consecutive samples agreed and were accepted
    Stable(T),
    /// Sample budget ran out; carries the last sample
    Unsettled(T),
}

impl<T> Settled<T> {
    pub fn is_stable(&self) -> bool {
        matches!(self, Settled::Stable(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Settled::Stable(value) | Settled::Unsettled(value) => value,
        }
    }
}

/// Poll the page until `probe` yields the same value twice in a row,
/// `interval` apart, and `accept` agrees with it.
///
/// `accept` lets callers reject a stable-but-stale sample, e.g. content that
/// still equals what was there before a click.
pub async fn settle<S, T, P, A>(
    session: &S,
    policy: &QuiescencePolicy,
    probe: P,
    accept: A,
) -> Result<Settled<T>>
where
    S: PageSession + ?Sized,
    T: PartialEq + std::fmt::Debug,
    P: Fn(&str) -> T,
    A: Fn(&T) -> bool,
{
    let mut previous = probe(&session.content().await?);

    for sample in 0..policy.max_samples {
        sleep(policy.interval()).await;
        let current = probe(&session.content().await?);

        if current == previous && accept(&current) {
            debug!("Content settled after {} samples", sample + 2);
            return Ok(Settled::Stable(current));
        }
        previous = current;
    }

    debug!("Content still changing after {} samples: {:?}", policy.max_samples + 1, previous);
    Ok(Settled::Unsettled(previous))
}
