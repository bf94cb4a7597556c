//! page-router demo driver.
//!
//! Builds a router over the in-memory host, registers an auth guard driven
//! by route `meta.requiresAuth`, replays navigation steps and prints the
//! resulting page stack.
//!
//! ```text
//! page-router run push:/pages/detail/index?id=1 tab:/pages/home/index back:1
//! page-router --config router.toml run --logged-in push:/pages/mine/index
//! page-router --config router.toml check-config
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use page_router::config::{self, RouterConfig};
use page_router::observability::logging::init_logging;
use page_router::router::RouteRecord;
use page_router::{
    create_router, GuardResult, MemoryHost, NavigationError, NavigationHost, PendingNavigation,
    RouteLocation, Router, RouterOptions,
};

#[derive(Parser)]
#[command(name = "page-router")]
#[command(about = "Replay guarded page navigations against an in-memory host", long_about = None)]
struct Cli {
    /// Router configuration file (TOML). A demo configuration is used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit JSON logs regardless of the configuration.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run navigation steps such as `push:/pages/a?id=1`, `tab:/pages/home/index`, `back:2`
    Run {
        /// Treat the user as signed in; pages marked `requiresAuth` become reachable.
        #[arg(long)]
        logged_in: bool,

        #[arg(value_parser = parse_step, required = true)]
        steps: Vec<Step>,
    },
    /// Validate the configuration and print it
    CheckConfig,
}

#[derive(Debug, Clone)]
enum Step {
    Push(String),
    Tab(String),
    Replace(String),
    Relaunch(String),
    Back(u32),
}

fn parse_step(raw: &str) -> Result<Step, String> {
    let (verb, arg) = raw.split_once(':').unwrap_or((raw, ""));
    match verb {
        "push" if !arg.is_empty() => Ok(Step::Push(arg.to_string())),
        "tab" if !arg.is_empty() => Ok(Step::Tab(arg.to_string())),
        "replace" if !arg.is_empty() => Ok(Step::Replace(arg.to_string())),
        "relaunch" if !arg.is_empty() => Ok(Step::Relaunch(arg.to_string())),
        "back" if arg.is_empty() => Ok(Step::Back(1)),
        "back" => arg
            .parse()
            .map(Step::Back)
            .map_err(|e| format!("invalid back delta `{arg}`: {e}")),
        _ => Err(format!(
            "unknown step `{raw}`; expected push:, tab:, replace:, relaunch: or back[:n]"
        )),
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Push(target) => write!(f, "push:{target}"),
            Step::Tab(target) => write!(f, "tab:{target}"),
            Step::Replace(target) => write!(f, "replace:{target}"),
            Step::Relaunch(target) => write!(f, "relaunch:{target}"),
            Step::Back(delta) => write!(f, "back:{delta}"),
        }
    }
}

#[derive(Serialize)]
struct StepReport {
    step: String,
    outcome: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    steps: Vec<StepReport>,
    pages: Vec<String>,
    current_route: RouteLocation,
    errors_seen: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => demo_config(),
    };
    if cli.json_logs {
        config.logging.json = true;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run { logged_in, steps } => {
            let report = run(&config, logged_in, &steps).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

async fn run(config: &RouterConfig, logged_in: bool, steps: &[Step]) -> RunReport {
    let host = Arc::new(MemoryHost::new(config.host.clone()));
    let router = create_router(RouterOptions::from_config(config), host.clone());

    let errors_seen = Arc::new(AtomicUsize::new(0));
    let counter = errors_seen.clone();
    router.on_error(move |err| {
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(error = %err, "navigation error");
    });
    register_auth_guard(&router, logged_in);
    router.after_each(|to, from| -> GuardResult {
        tracing::info!(to = %to.full_path, from = %from.full_path, "navigated");
        Ok(())
    });
    router.is_ready().await;

    let mut reports = Vec::with_capacity(steps.len());
    for step in steps {
        let started = match step {
            Step::Push(target) => router.push(target),
            Step::Tab(target) => router.push_tab(target),
            Step::Replace(target) => router.replace(target),
            Step::Relaunch(target) => router.replace_all(target),
            Step::Back(delta) => router.back(*delta),
        };
        host.run_until_idle();
        let outcome = settle(started).await;
        reports.push(StepReport {
            step: step.to_string(),
            outcome,
        });
    }

    RunReport {
        steps: reports,
        pages: host
            .current_pages()
            .into_iter()
            .map(|page| page.route)
            .collect(),
        current_route: router.current_route(),
        errors_seen: errors_seen.load(Ordering::Relaxed),
    }
}

async fn settle(started: Result<PendingNavigation, NavigationError>) -> String {
    match started {
        Ok(pending) => match pending.await {
            Ok(response) => response.message,
            Err(err) => err.to_string(),
        },
        Err(err) => err.to_string(),
    }
}

/// Abort navigations to pages whose route record sets `requiresAuth`.
fn register_auth_guard(router: &Router, logged_in: bool) {
    let routes = router.routes().clone();
    router.before_each(move |to, _from, next| {
        let requires_auth = routes
            .find_by_path(&to.path)
            .and_then(|record| record.meta.get("requiresAuth").and_then(Value::as_bool))
            .unwrap_or(false);
        if requires_auth && !logged_in {
            tracing::info!(to = %to.path, "not signed in; navigation blocked");
            next.abort();
        } else {
            next.proceed();
        }
        Ok(())
    });
}

fn demo_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.host.pages = [
        "pages/index/index",
        "pages/detail/index",
        "pages/login/index",
        "pages/home/index",
        "pages/mine/index",
    ]
    .iter()
    .map(|page| page.to_string())
    .collect();
    config.host.tab_pages = vec!["pages/home/index".into(), "pages/mine/index".into()];
    config.routes = vec![
        RouteRecord::new("/pages/index/index", "index"),
        RouteRecord::new("/pages/detail/index", "detail"),
        RouteRecord::new("/pages/login/index", "login"),
        RouteRecord::new("/pages/home/index", "home"),
        RouteRecord::new("/pages/mine/index", "mine").with_meta("requiresAuth", true),
    ];
    config
}
