//! Ordered producer strategies with typed outcomes.
//!
//! A [`FallbackChain`] tries its strategies in order and stops at the
//! first [`Attempt::Success`]. Soft failures and upstream errors are logged
//! and the next strategy runs; caller-input errors stop the chain at once.
//! Strategies are boxed futures, so nothing runs until the chain reaches
//! them.

use futures::future::BoxFuture;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::Produced;
use crate::error::Result;

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Success(T),
    /// The strategy ran but produced nothing usable.
    SoftFailure(String),
}

impl<I> Attempt<Vec<I>> {
    /// `Success` for a non-empty list, `SoftFailure` otherwise.
    pub fn non_empty(items: Vec<I>) -> Self {
        if items.is_empty() {
            Attempt::SoftFailure("sin resultados".to_string())
        } else {
            Attempt::Success(items)
        }
    }
}

pub struct FallbackChain<'a, T> {
    operation: &'static str,
    strategies: Vec<(&'static str, BoxFuture<'a, Result<Attempt<T>>>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            strategies: Vec::new(),
        }
    }

    /// Appends a named strategy.
    pub fn then<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: Future<Output = Result<Attempt<T>>> + Send + 'a,
    {
        self.strategies.push((name, Box::pin(strategy)));
        self
    }

    /// Runs the strategies in order. Returns the winning strategy's name and
    /// value, or `None` once every strategy failed softly.
    pub async fn run(self) -> Result<Option<(&'static str, T)>> {
        let started = Instant::now();
        info!("🎯 {}: {} estrategias", self.operation, self.strategies.len());

        for (name, strategy) in self.strategies {
            debug!("🔍 {}: intentando {}", self.operation, name);
            match strategy.await {
                Ok(Attempt::Success(value)) => {
                    info!(
                        "✅ {}: éxito con {} en {:?}",
                        self.operation,
                        name,
                        started.elapsed()
                    );
                    return Ok(Some((name, value)));
                }
                Ok(Attempt::SoftFailure(reason)) => {
                    warn!("⚠️ {}: {} sin éxito: {}", self.operation, name, reason);
                }
                Err(e) if e.is_client_error() => return Err(e),
                Err(e) => {
                    warn!("❌ {}: {} falló: {}", self.operation, name, e);
                }
            }
        }

        error!(
            "❌ {}: todas las estrategias fallaron después de {:?}",
            self.operation,
            started.elapsed()
        );
        Ok(None)
    }

    /// Runs the chain and falls back to `fallback` when every strategy
    /// failed. The fallback value is reported as degraded.
    pub async fn run_or_else<F>(self, fallback: F) -> Result<Produced<T>>
    where
        F: FnOnce() -> T,
    {
        Ok(match self.run().await? {
            Some((_, value)) => Produced::Live(value),
            None => Produced::Degraded(fallback()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_first_success_wins_and_later_strategies_never_run() {
        let later = AtomicUsize::new(0);

        let outcome = FallbackChain::new("search")
            .then("empty", async { Ok(Attempt::non_empty(Vec::<u32>::new())) })
            .then("broken", async { Err(CatalogError::upstream("search", "timeout")) })
            .then("live", async { Ok(Attempt::Success(vec![1, 2])) })
            .then("never", async {
                later.fetch_add(1, Ordering::SeqCst);
                Ok(Attempt::Success(vec![9]))
            })
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, Some(("live", vec![1, 2])));
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failures_yield_degraded_fallback() {
        let outcome = FallbackChain::new("charts")
            .then("live", async { Ok(Attempt::SoftFailure("vacío".into())) })
            .run_or_else(|| vec!["synthetic"])
            .await
            .unwrap();

        assert_eq!(outcome, Produced::Degraded(vec!["synthetic"]));
    }

    #[tokio::test]
    async fn test_client_error_stops_the_chain() {
        let result = FallbackChain::<Vec<u32>>::new("lyrics")
            .then("bad", async { Err(CatalogError::InvalidInput("browse_id".into())) })
            .then("good", async { Ok(Attempt::Success(vec![1])) })
            .run()
            .await;

        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
    }
}
