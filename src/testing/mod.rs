//! Test orchestration engine
//!
//! Registration, isolated timeout-bounded execution, result aggregation,
//! selection and reporting. The engine is generic over the context type
//! handed to each test body and knows nothing about what the bodies check.

mod category;
pub mod check;
mod filter;
mod registry;
mod report;
mod reporter;
mod runner;

pub use category::CategoryOrder;
pub use check::{CheckError, CheckResult, Failure};
pub use filter::select;
pub use registry::{Registry, TestBody, TestCase, TestFuture};
pub use report::{RunReport, Summary};
pub use reporter::{
    catalog_json, render_catalog, render_json, ConsoleReporter, JsonReport, JsonResult,
    JsonSummary, RunInfo,
};
pub use runner::{Outcome, Runner, TestResult};
