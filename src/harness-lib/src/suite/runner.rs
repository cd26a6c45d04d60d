use super::model::{CaseSpec, CaseSuite};
use crate::assertion::{evaluate_response, AssertionReport, Operator, ValidationRule};
use crate::client::{ApiClient, ClientFactory};
use crate::error::HookError;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
    /// The request could not be made: auth, transport, hook or setup failure.
    Error,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub suite: String,
    pub service: String,
    pub name: String,
    pub status: CaseStatus,
    pub http_status: Option<u16>,
    pub duration_ms: u64,
    /// Failed rules or the error, one entry each.
    pub messages: Vec<String>,
}

impl CaseResult {
    fn new(suite: &CaseSuite, case: &CaseSpec, status: CaseStatus) -> Self {
        Self {
            suite: suite.name.clone(),
            service: suite.service.clone(),
            name: case.name.clone(),
            status,
            http_status: None,
            duration_ms: 0,
            messages: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, CaseStatus::Failed | CaseStatus::Error)
    }
}

/// Runs case suites with at most `workers` requests in flight. Each failure stays
/// scoped to its case.
pub struct SuiteRunner {
    factory: Arc<ClientFactory>,
    workers: usize,
}

impl SuiteRunner {
    pub fn new(factory: Arc<ClientFactory>, workers: usize) -> Self {
        Self {
            factory,
            workers: workers.max(1),
        }
    }

    /// Results come back in suite and case order. Only an aborting hook failure
    /// during initialize or teardown fails the whole run.
    pub async fn run(&self, suites: &[CaseSuite]) -> Result<Vec<CaseResult>, HookError> {
        self.factory.hooks().initialize(self.factory.config())?;

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut clients: HashMap<String, Arc<ApiClient>> = HashMap::new();
        let mut tasks = JoinSet::new();
        let mut results: Vec<CaseResult> = Vec::new();

        for suite in suites {
            let client = match clients.get(&suite.service) {
                Some(client) => Ok(Arc::clone(client)),
                None => self.factory.client(&suite.service).map(|client| {
                    let client = Arc::new(client);
                    clients.insert(suite.service.clone(), Arc::clone(&client));
                    client
                }),
            };

            for case in &suite.cases {
                let index = results.len();
                let mut placeholder = CaseResult::new(suite, case, CaseStatus::Error);

                if case.skip {
                    log::info!("Skipping case '{}'", case.name);
                    placeholder.status = CaseStatus::Skipped;
                    results.push(placeholder);
                    continue;
                }

                let client = match &client {
                    Ok(client) => Arc::clone(client),
                    Err(e) => {
                        placeholder.messages.push(e.to_string());
                        results.push(placeholder);
                        continue;
                    }
                };

                placeholder.messages.push("case did not complete".to_string());
                let result = CaseResult {
                    status: CaseStatus::Passed,
                    messages: Vec::new(),
                    ..placeholder.clone()
                };
                results.push(placeholder);

                let semaphore = Arc::clone(&semaphore);
                let case = case.clone();
                tasks.spawn(async move {
                    // The semaphore is never closed.
                    let _permit = semaphore.acquire_owned().await.ok();
                    (index, run_case(&client, &case, result).await)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = result,
                Err(e) => log::error!("Case task failed: {e}"),
            }
        }

        self.factory.hooks().teardown()?;
        Ok(results)
    }
}

async fn run_case(client: &ApiClient, case: &CaseSpec, mut result: CaseResult) -> CaseResult {
    let start = Instant::now();

    match client.send(case.to_request()).await {
        Ok(response) => {
            result.http_status = Some(response.status);
            let report = AssertionReport::new(evaluate_response(&response, &rules_for(case)));
            if let Err(failure) = report.into_result() {
                result.status = CaseStatus::Failed;
                result.messages = failure.failures;
            }
        }
        Err(e) => {
            result.status = CaseStatus::Error;
            result.messages.push(e.to_string());
        }
    }

    result.duration_ms = millis(start.elapsed());
    match result.status {
        CaseStatus::Passed => log::info!("PASS {} ({} ms)", case.name, result.duration_ms),
        _ => log::warn!("FAIL {}: {}", case.name, result.messages.join("; ")),
    }
    result
}

/// The expected status becomes the first rule.
fn rules_for(case: &CaseSpec) -> Vec<ValidationRule> {
    let mut rules = Vec::with_capacity(case.expect.rules.len() + 1);
    if let Some(status) = case.expect.status {
        rules.push(ValidationRule::new("status_code", Operator::Eq, json!(status)));
    }
    rules.extend(case.expect.rules.iter().cloned());
    rules
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
