//! CLI command handling
//!
//! Lists the catalog or runs a selection of it, then renders the outcome to
//! stdout. Logs never go to stdout, so `--json` output stays parseable.

use std::io::{self, Write};
use std::sync::Arc;

use crate::commands::Args;
use crate::common::config::{Config, Settings};
use crate::common::Result;
use crate::suite::{self, Context};
use crate::testing::{
    self, render_catalog, render_json, CategoryOrder, ConsoleReporter, Registry, RunInfo,
    RunReport, Runner, TestResult,
};

/// Run the command line; returns the process exit code
pub async fn dispatch(args: Args) -> Result<i32> {
    let registry = suite::registry()?;
    let order = suite::category_order();

    if args.list {
        list(&registry, &order, args.json)?;
        return Ok(0);
    }

    let config = Config::load(args.config.as_deref())?;
    let settings = Settings::resolve(&config, args.overrides())?;
    tracing::debug!(
        server = %settings.server,
        provider = settings.provider.id,
        model = %settings.model,
        timeout = ?settings.timeout,
        "Resolved settings"
    );

    let report = run(&args, settings, &registry, &order).await?;
    Ok(report.exit_code())
}

/// Print the catalog
fn list(registry: &Registry<Context>, order: &CategoryOrder, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let catalog = testing::catalog_json(registry, order);
        writeln!(out, "{}", serde_json::to_string_pretty(&catalog)?)?;
    } else {
        render_catalog(registry, order, &mut out)?;
    }
    Ok(())
}

async fn run(
    args: &Args,
    settings: Settings,
    registry: &Registry<Context>,
    order: &CategoryOrder,
) -> Result<RunReport> {
    let selected = testing::select(registry, args.test.as_deref(), &args.categories);
    let runner = Runner::new(settings.timeout);
    let reporter = ConsoleReporter::new(settings.max_got_len);
    let info = RunInfo {
        server: settings.server.clone(),
        provider: settings.provider.id.to_string(),
        model: settings.model.clone(),
    };
    let ctx = Arc::new(Context::new(settings)?);

    if args.json {
        let report = runner.run(selected, ctx, order).await;
        println!("{}", render_json(&info, &report)?);
        return Ok(report);
    }

    if selected.is_empty() {
        let report = RunReport::default();
        reporter.render(&info, &report, &mut io::stdout().lock())?;
        return Ok(report);
    }

    reporter.header(&info, &mut io::stdout().lock())?;
    let mut live = LiveConsole::new(&reporter);
    let report = runner
        .run_with(selected, ctx, order, |result| live.result(result))
        .await;
    live.finish()?;

    reporter.summary(&report, &mut io::stdout().lock())?;
    Ok(report)
}

/// Writes console results as they arrive
///
/// Results come in category order, so a heading is printed whenever the
/// category changes. The first write error is kept and reported at the end.
struct LiveConsole<'a> {
    reporter: &'a ConsoleReporter,
    current: Option<String>,
    error: Option<io::Error>,
}

impl<'a> LiveConsole<'a> {
    fn new(reporter: &'a ConsoleReporter) -> Self {
        Self {
            reporter,
            current: None,
            error: None,
        }
    }

    fn result(&mut self, result: &TestResult) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write(result) {
            self.error = Some(e);
        }
    }

    fn write(&mut self, result: &TestResult) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if self.current.as_deref() != Some(result.category.as_str()) {
            if self.current.is_some() {
                writeln!(out)?;
            }
            self.reporter.category_heading(&result.category, &mut out)?;
            self.current = Some(result.category.clone());
        }
        self.reporter.result_line(result, &mut out)?;
        out.flush()
    }

    fn finish(self) -> io::Result<()> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.current.is_some() {
            writeln!(io::stdout().lock())?;
        }
        Ok(())
    }
}
