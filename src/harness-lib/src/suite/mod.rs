mod model;
mod runner;

pub use model::{load_suites, CaseSpec, CaseSuite, Expectation, RequestSpec};
pub use runner::{CaseResult, CaseStatus, SuiteRunner};
