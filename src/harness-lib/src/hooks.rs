use crate::client::{RequestRecord, ResponseRecord};
use crate::config::ResolvedConfig;
use crate::error::HookError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type HookResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Lifecycle callbacks around a run and around every request.
/// Every method defaults to doing nothing.
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    fn initialize(&self, _config: &ResolvedConfig) -> HookResult {
        Ok(())
    }

    /// May edit the request before it is sent.
    fn before_request(&self, _request: &mut RequestRecord) -> HookResult {
        Ok(())
    }

    fn after_request(&self, _request: &RequestRecord, _response: &ResponseRecord) -> HookResult {
        Ok(())
    }

    fn teardown(&self) -> HookResult {
        Ok(())
    }
}

/// What a failing hook does to the operation it runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookFailurePolicy {
    /// Fail the run or request with a [`HookError`].
    Abort,
    /// Log a warning and carry on.
    #[default]
    Continue,
}

/// Hooks in registration order, each with its failure policy.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<(Arc<dyn Hook>, HookFailurePolicy)>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn Hook>, policy: HookFailurePolicy) {
        log::debug!("Registered hook '{}' ({:?})", hook.name(), policy);
        self.hooks.push((hook, policy));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn initialize(&self, config: &ResolvedConfig) -> Result<(), HookError> {
        for (hook, policy) in &self.hooks {
            settle(hook.as_ref(), *policy, "initialize", hook.initialize(config))?;
        }
        Ok(())
    }

    pub fn before_request(&self, request: &mut RequestRecord) -> Result<(), HookError> {
        for (hook, policy) in &self.hooks {
            settle(
                hook.as_ref(),
                *policy,
                "before_request",
                hook.before_request(request),
            )?;
        }
        Ok(())
    }

    pub fn after_request(
        &self,
        request: &RequestRecord,
        response: &ResponseRecord,
    ) -> Result<(), HookError> {
        for (hook, policy) in &self.hooks {
            settle(
                hook.as_ref(),
                *policy,
                "after_request",
                hook.after_request(request, response),
            )?;
        }
        Ok(())
    }

    /// Tears down every hook, even after an aborting failure; the first such
    /// failure is returned.
    pub fn teardown(&self) -> Result<(), HookError> {
        let mut first_error = None;
        for (hook, policy) in &self.hooks {
            if let Err(e) = settle(hook.as_ref(), *policy, "teardown", hook.teardown()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn settle(
    hook: &dyn Hook,
    policy: HookFailurePolicy,
    stage: &'static str,
    result: HookResult,
) -> Result<(), HookError> {
    let Err(error) = result else {
        return Ok(());
    };

    let error = HookError {
        hook: hook.name().to_string(),
        stage,
        message: error.to_string(),
    };
    match policy {
        HookFailurePolicy::Abort => Err(error),
        HookFailurePolicy::Continue => {
            log::warn!("{error}");
            Ok(())
        }
    }
}

/// Warns about responses slower than a threshold and counts them.
pub struct SlowResponseHook {
    threshold: Duration,
    slow: AtomicUsize,
}

impl SlowResponseHook {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            slow: AtomicUsize::new(0),
        }
    }

    pub fn slow_count(&self) -> usize {
        self.slow.load(Ordering::Relaxed)
    }
}

impl Hook for SlowResponseHook {
    fn name(&self) -> &str {
        "slow_response"
    }

    fn after_request(&self, _request: &RequestRecord, response: &ResponseRecord) -> HookResult {
        if response.elapsed > self.threshold {
            self.slow.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Slow response: {} {} took {} ms (threshold {} ms)",
                response.method,
                response.url,
                response.elapsed.as_millis(),
                self.threshold.as_millis()
            );
        }
        Ok(())
    }

    fn teardown(&self) -> HookResult {
        let slow = self.slow_count();
        if slow > 0 {
            log::info!("{slow} response(s) exceeded {} ms", self.threshold.as_millis());
        }
        Ok(())
    }
}
