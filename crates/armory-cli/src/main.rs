// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use armory_app::{
    AppCommand, AppState, FormKind, ResponseOutcome, Role, RouteTarget, resolve_route,
};
use armory_client::Client;
use config::Config;
use env_logger::Target;
use log::{info, warn};
use runtime::HttpRuntime;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `armory --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = Client::new(config.base_url(), config.timeout()?, config.data_field())
        .with_context(|| {
            format!(
                "invalid [server] config in {}; fix base_url/timeout/data_field values",
                options.config_path.display()
            )
        })?;
    let log_path = config.log_file()?;
    if options.check_only {
        return Ok(());
    }

    init_logging(&config, &log_path)?;
    info!("armory starting against {}", client.base_url());

    let mut state = initial_state(&config, &client);
    let mut runtime = HttpRuntime::new(client);
    armory_tui::run_app(&mut state, &mut runtime)
}

fn init_logging(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })?;

    env_logger::Builder::new()
        .filter_level(config.log_level()?)
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("initialize logger")
}

/// Logs in when credentials are configured. The landing redirect decides the
/// role; without a session the UI opens on the login form.
fn initial_state(config: &Config, client: &Client) -> AppState {
    let start = config.start_page();
    let Some((personal_id, password)) = config.credentials() else {
        let mut state = AppState::for_role(Role::Master, start);
        state.dispatch(AppCommand::OpenForm(FormKind::Login));
        return state;
    };

    let outcome = match client.login(personal_id, &password) {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!("login failed: {error:#}");
            ResponseOutcome::UnexpectedError(format!("{error:#}"))
        }
    };
    if let ResponseOutcome::Redirect(url) = &outcome
        && let RouteTarget::Landing(role) = resolve_route(url)
    {
        info!("logged in as {}", role.label());
        return AppState::for_role(role, start);
    }

    let mut state = AppState::for_role(Role::Master, start);
    if outcome.is_failure() {
        warn!("login rejected: {outcome:?}");
        state.dispatch(AppCommand::OpenForm(FormKind::Login));
    }
    state.dispatch(AppCommand::ApplyOutcome(outcome));
    state
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("armory");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and server settings, then exit");
    println!("  --help                   Show this help");
    println!();
    println!("  Set {} to log in on start with [auth].personal_id", config::PASSWORD_ENV);
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, initial_state, parse_cli_args};
    use anyhow::Result;
    use armory_app::{AlertTone, AppMode, FormKind, PageKind, Role};
    use armory_client::Client;
    use armory_testkit::{MockBackend, ScriptedResponse};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::config::{Config, PASSWORD_ENV, env_lock};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/armory-config.toml")
    }

    fn config_with_auth(backend: &MockBackend, start_page: &str) -> Result<Config> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            format!(
                "version = 1\n[server]\nbase_url = \"{}\"\n[auth]\npersonal_id = 1234567\n[ui]\nstart_page = \"{start_page}\"\n",
                backend.base_url()
            ),
        )?;
        Config::load(&path)
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--demo"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn without_credentials_the_login_form_opens() {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(PASSWORD_ENV);
        }
        let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50), "data")
            .expect("client should initialize");
        let state = initial_state(&Config::default(), &client);
        assert_eq!(state.mode, AppMode::Form(FormKind::Login));
    }

    #[test]
    fn auto_login_takes_role_from_landing_redirect() -> Result<()> {
        let _guard = env_lock();
        let backend = MockBackend::start()?;
        backend.route(
            "/token",
            ScriptedResponse::json(200, json!({"redirect_url": "/client_landing_page"})),
        );
        let config = config_with_auth(&backend, "requests")?;
        let client = Client::new(config.base_url(), Duration::from_secs(2), "data")?;

        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(PASSWORD_ENV, "secret");
        }
        let state = initial_state(&config, &client);
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(PASSWORD_ENV);
        }

        assert_eq!(state.role, Role::Client);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(state.active.page, PageKind::ClientSwitchRequests);
        Ok(())
    }

    #[test]
    fn rejected_auto_login_shows_banner_over_login_form() -> Result<()> {
        let _guard = env_lock();
        let backend = MockBackend::start()?;
        backend.route(
            "/token",
            ScriptedResponse::json(401, json!({"detail": "Incorrect username or password"})),
        );
        let config = config_with_auth(&backend, "inventory")?;
        let client = Client::new(config.base_url(), Duration::from_secs(2), "data")?;

        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(PASSWORD_ENV, "wrong");
        }
        let state = initial_state(&config, &client);
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(PASSWORD_ENV);
        }

        assert_eq!(state.mode, AppMode::Form(FormKind::Login));
        assert!(state.alert.visible);
        assert_eq!(state.alert.tone, AlertTone::Failure);
        assert_eq!(state.alert.text, "Incorrect username or password");
        Ok(())
    }
}
