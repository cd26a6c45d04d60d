use crate::commands::shared::{ConfigDirArgs, EnvArgs, OutputArgs};
use crate::commands::validators;
use crate::core::error::HarnessError;
use crate::core::logger;
use apiharness_lib::client::ClientFactory;
use apiharness_lib::config::{ConfigLoader, ResolvedConfig};
use apiharness_lib::hooks::{HookChain, HookFailurePolicy, SlowResponseHook};
use apiharness_lib::report::{ReportHook, ReportWriter};
use apiharness_lib::suite::{load_suites, CaseResult, CaseStatus, SuiteRunner};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(
        value_name = "ENV",
        help = "Environment name, same as --env",
        value_parser = validators::validate_env_name,
        conflicts_with = "environment"
    )]
    pub env_positional: Option<String>,

    #[command(flatten)]
    pub env_args: EnvArgs,

    #[command(flatten)]
    pub config: ConfigDirArgs,

    #[arg(
        long = "cases",
        default_value = "cases",
        help = "Case suite file or directory of *.yml suites"
    )]
    pub cases: PathBuf,

    #[arg(
        long = "report-dir",
        help = "Write step records here (overrides report.dir and enables reporting)"
    )]
    pub report_dir: Option<PathBuf>,

    #[arg(
        short = 'w',
        long = "workers",
        help = "Cases in flight at once (overrides test.parallel_workers)"
    )]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl RunArgs {
    pub fn environment(&self) -> &str {
        match &self.env_positional {
            Some(name) => name,
            None => self.env_args.name(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    environment: &'a str,
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    cases: &'a [CaseResult],
}

impl<'a> RunSummary<'a> {
    fn new(environment: &'a str, cases: &'a [CaseResult]) -> Self {
        let count = |status: CaseStatus| cases.iter().filter(|c| c.status == status).count();
        Self {
            environment,
            total: cases.len(),
            passed: count(CaseStatus::Passed),
            failed: cases.iter().filter(|c| c.is_failure()).count(),
            skipped: count(CaseStatus::Skipped),
            cases,
        }
    }
}

pub async fn execute_run(args: &RunArgs, debug: bool) -> Result<(), HarnessError> {
    let environment = args.environment();
    let config = ConfigLoader::new(&args.config.config_dir).resolve(environment)?;
    logger::init(config.logging_settings()?.level_filter()?, debug);
    log::info!(
        "Resolved environment '{environment}' from {}",
        args.config.config_dir.display()
    );

    let suites = load_suites(&args.cases)?;
    log::debug!("Loaded {} suite(s) from {}", suites.len(), args.cases.display());

    let config = Arc::new(config);
    let hooks = build_hooks(&config, args.report_dir.as_deref())?;
    let factory = ClientFactory::new(Arc::clone(&config))?.with_hooks(hooks);
    let workers = match args.workers {
        Some(workers) => workers,
        None => config.test_settings()?.parallel_workers,
    };

    let results = SuiteRunner::new(Arc::new(factory), workers)
        .run(&suites)
        .await?;

    let summary = RunSummary::new(environment, &results);
    let formatter = crate::core::formatter::get_formatter(&args.output.output);
    print!("{}", formatter.format(&summary));

    if summary.failed > 0 {
        return Err(HarnessError::CasesFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

/// Step reports abort the request when they cannot be written; the slow-response
/// warning never does.
fn build_hooks(
    config: &ResolvedConfig,
    report_dir: Option<&Path>,
) -> Result<HookChain, HarnessError> {
    let mut hooks = HookChain::new();

    let report = config.report_settings()?;
    let dir = match report_dir {
        Some(dir) => Some(dir.to_path_buf()),
        None if report.enabled => Some(report.dir),
        None => None,
    };
    if let Some(dir) = dir {
        log::debug!("Writing step records to {}", dir.display());
        let body_limit = config.logging_settings()?.body_limit;
        hooks.register(
            Arc::new(ReportHook::new(ReportWriter::new(dir), body_limit)),
            HookFailurePolicy::Abort,
        );
    }

    let threshold = config.test_settings()?.slow_threshold()?;
    hooks.register(
        Arc::new(SlowResponseHook::new(threshold)),
        HookFailurePolicy::Continue,
    );
    Ok(hooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_hooks_respects_report_settings() {
        let enabled = ResolvedConfig::new("t", json!({}));
        assert_eq!(build_hooks(&enabled, None).unwrap().len(), 2);

        let disabled = ResolvedConfig::new("t", json!({"report": {"enabled": false}}));
        assert_eq!(build_hooks(&disabled, None).unwrap().len(), 1);
        assert_eq!(
            build_hooks(&disabled, Some(Path::new("out"))).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_summary_counts() {
        let case = |name: &str, status| CaseResult {
            suite: "s".to_string(),
            service: "svc".to_string(),
            name: name.to_string(),
            status,
            http_status: None,
            duration_ms: 0,
            messages: Vec::new(),
        };
        let results = vec![
            case("a", CaseStatus::Passed),
            case("b", CaseStatus::Failed),
            case("c", CaseStatus::Error),
            case("d", CaseStatus::Skipped),
        ];
        let summary = RunSummary::new("local", &results);
        assert_eq!(
            (summary.total, summary.passed, summary.failed, summary.skipped),
            (4, 1, 2, 1)
        );
    }
}
