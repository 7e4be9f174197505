//! MySQL: `.env` settings, client, service, credentials and database.
//!
//! Probes are ordered from configuration to connectivity to the existence of
//! the game database, so a wrong password is not misreported as a missing
//! database.

use super::{ComponentSpec, DiagnosisRule};
use crate::config::{is_placeholder, EnvFile, MysqlSettings};
use crate::error::Result;
use crate::host::{CheckResult, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use crate::shell::{CommandOptions, CommandResult, Platform};
use crate::ui::Prompt;
use regex::Regex;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::LazyLock;
use tracing::debug;

pub const SPEC: ComponentSpec = ComponentSpec {
    name: "mysql",
    title: "MySQL database",
    description: "Database settings in .env, the MySQL server and the game database",
    probes: &[
        ProbeSpec {
            id: "mysql.config",
            label: "Database settings (.env)",
            run: check_config,
        },
        ProbeSpec {
            id: "mysql.client",
            label: "MySQL client",
            run: check_client,
        },
        ProbeSpec {
            id: "mysql.service",
            label: "MySQL service",
            run: check_service,
        },
        ProbeSpec {
            id: "mysql.credentials",
            label: "Login",
            run: check_credentials,
        },
        ProbeSpec {
            id: "mysql.database",
            label: "Game database",
            run: check_database,
        },
    ],
    diagnoses: &[
        DiagnosisRule {
            probe: "mysql.config",
            pattern: Some(r"placeholder"),
            message_key: "mysql.env_placeholder",
            remedies: &["configure"],
        },
        DiagnosisRule {
            probe: "mysql.config",
            pattern: None,
            message_key: "mysql.env_missing",
            remedies: &["configure"],
        },
        DiagnosisRule {
            probe: "mysql.client",
            pattern: None,
            message_key: "mysql.client_missing",
            remedies: &[],
        },
        DiagnosisRule {
            probe: "mysql.service",
            pattern: Some(r"\bstopped\b"),
            message_key: "mysql.service_stopped",
            remedies: &["start_service"],
        },
        DiagnosisRule {
            probe: "mysql.service",
            pattern: None,
            message_key: "mysql.service_absent",
            remedies: &[],
        },
        DiagnosisRule {
            probe: "mysql.credentials",
            pattern: Some(r"access denied"),
            message_key: "mysql.access_denied",
            remedies: &["update_password", "configure"],
        },
        DiagnosisRule {
            probe: "mysql.credentials",
            pattern: Some(r"not configured"),
            message_key: "mysql.env_missing",
            remedies: &["configure"],
        },
        DiagnosisRule {
            probe: "mysql.credentials",
            pattern: None,
            message_key: "mysql.unreachable",
            remedies: &["start_service", "configure"],
        },
        DiagnosisRule {
            probe: "mysql.database",
            pattern: Some(r"does not exist"),
            message_key: "mysql.database_missing",
            remedies: &["create_database"],
        },
        DiagnosisRule {
            probe: "mysql.database",
            pattern: None,
            message_key: "mysql.unreachable",
            remedies: &["start_service", "configure"],
        },
    ],
    remedies: &[
        RemedySpec {
            tag: "configure",
            label: "Enter database settings and save them to .env",
            fixes: &["mysql.config", "mysql.credentials"],
            run: configure,
        },
        RemedySpec {
            tag: "start_service",
            label: "Start the MySQL service",
            fixes: &["mysql.service"],
            run: start_service,
        },
        RemedySpec {
            tag: "update_password",
            label: "Enter the correct MySQL password",
            fixes: &["mysql.credentials"],
            run: update_password,
        },
        RemedySpec {
            tag: "create_database",
            label: "Create the game database",
            fixes: &["mysql.database"],
            run: create_database,
        },
    ],
    install_hint: "Install MySQL Community Server from https://dev.mysql.com/downloads/",
};

const REQUIRED_KEYS: &[&str] = &["DB_USER", "DB_PASSWORD", "DB_NAME"];

static DB_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_$]{1,64}$").unwrap());

/// Connection parameters read from `.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Connection {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
}

impl Connection {
    /// `None` when no usable user is configured.
    fn from_env(env: &EnvFile, defaults: &MysqlSettings) -> Option<Self> {
        let user = env.get("DB_USER").filter(|u| !u.is_empty() && !is_placeholder(u))?;
        let host = env
            .get("DB_HOST")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| defaults.default_host.clone());
        let port = env
            .get("DB_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.default_port);
        let database = env
            .get("DB_NAME")
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| defaults.default_database.clone());

        Some(Self {
            host,
            port,
            user,
            password: env.get("DB_PASSWORD").unwrap_or_default(),
            database,
        })
    }

    /// Run one statement through the mysql client.
    ///
    /// The password travels in `MYSQL_PWD` so it never shows up in a
    /// process listing.
    fn query(&self, ctx: &HostContext, sql: &str) -> Result<CommandResult> {
        let port = self.port.to_string();
        let args = [
            "--protocol=TCP",
            "-h",
            self.host.as_str(),
            "-P",
            port.as_str(),
            "-u",
            self.user.as_str(),
            "-N",
            "-B",
            "-e",
            sql,
        ];
        let mut options = CommandOptions {
            cwd: Some(ctx.project_root.clone()),
            timeout: Some(ctx.settings.timeouts.probe()),
            ..Default::default()
        };
        options
            .env
            .insert("MYSQL_PWD".to_string(), self.password.clone());
        ctx.run_with(&ctx.settings.mysql.client, &args, &options)
    }
}

fn check_config(ctx: &HostContext) -> Result<CheckResult> {
    let env = ctx.env()?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| match env.get(key) {
            None => true,
            Some(value) => value.is_empty() && *key != "DB_PASSWORD",
        })
        .collect();
    if !missing.is_empty() {
        return Ok(CheckResult::fail(format!(
            "not configured: {}",
            missing.join(", ")
        )));
    }

    let placeholders: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| env.get(key).is_some_and(|v| is_placeholder(&v)))
        .collect();
    if !placeholders.is_empty() {
        return Ok(CheckResult::fail(format!(
            "placeholder values: {}",
            placeholders.join(", ")
        )));
    }

    Ok(CheckResult::pass("DB_USER, DB_PASSWORD and DB_NAME are set"))
}

fn check_client(ctx: &HostContext) -> Result<CheckResult> {
    let out = ctx.run(
        &ctx.settings.mysql.client,
        &["--version"],
        ctx.settings.timeouts.probe(),
    )?;
    if out.success {
        Ok(CheckResult::pass(out.first_line()))
    } else {
        Ok(CheckResult::fail(format!(
            "mysql --version failed: {}",
            out.error_summary()
        )))
    }
}

/// State of an installed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Running,
    Stopped,
}

/// Parse `sc query <name>` output. `None` means not installed.
fn parse_sc_query(output: &str) -> Option<ServiceState> {
    let state = output
        .lines()
        .find(|l| l.trim_start().starts_with("STATE"))?;
    if state.contains("RUNNING") || state.contains("START_PENDING") {
        Some(ServiceState::Running)
    } else {
        Some(ServiceState::Stopped)
    }
}

/// Parse `systemctl show -p LoadState -p ActiveState <unit>` output.
fn parse_systemctl_show(output: &str) -> Option<ServiceState> {
    let field = |name: &str| {
        output
            .lines()
            .find_map(|l| l.strip_prefix(name)?.strip_prefix('='))
            .map(str::trim)
    };
    if field("LoadState")? != "loaded" {
        return None;
    }
    match field("ActiveState") {
        Some("active") | Some("activating") | Some("reloading") => Some(ServiceState::Running),
        _ => Some(ServiceState::Stopped),
    }
}

/// The first configured service that is installed, with its state.
fn find_service(ctx: &HostContext) -> Option<(String, ServiceState)> {
    let timeout = ctx.settings.timeouts.quick();
    for name in &ctx.settings.mysql.service_names {
        let state = match Platform::current() {
            Platform::Windows => ctx
                .run("sc", &["query", name.as_str()], timeout)
                .ok()
                .and_then(|out| parse_sc_query(&out.stdout)),
            Platform::Linux => ctx
                .run(
                    "systemctl",
                    &["show", "-p", "LoadState", "-p", "ActiveState", name.as_str()],
                    timeout,
                )
                .ok()
                .and_then(|out| parse_systemctl_show(&out.stdout)),
            Platform::MacOS => None,
        };
        if let Some(state) = state {
            debug!(service = %name, ?state, "found mysql service");
            return Some((name.clone(), state));
        }
    }
    None
}

fn server_address(ctx: &HostContext) -> Result<(String, u16)> {
    let env = ctx.env()?;
    let defaults = &ctx.settings.mysql;
    let host = env
        .get("DB_HOST")
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| defaults.default_host.clone());
    let port = env
        .get("DB_PORT")
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(defaults.default_port);
    Ok((host, port))
}

fn accepts_connections(host: &str, port: u16, ctx: &HostContext) -> bool {
    let Ok(addrs) = (host, port).to_socket_addrs() else {
        return false;
    };
    addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, ctx.settings.timeouts.quick()).is_ok())
}

fn check_service(ctx: &HostContext) -> Result<CheckResult> {
    match find_service(ctx) {
        Some((name, ServiceState::Running)) => {
            Ok(CheckResult::pass(format!("{} is running", name)))
        }
        Some((name, ServiceState::Stopped)) => {
            Ok(CheckResult::fail(format!("{} is stopped", name)))
        }
        None => {
            // Servers in containers or started by hand have no service entry.
            let (host, port) = server_address(ctx)?;
            if accepts_connections(&host, port, ctx) {
                Ok(CheckResult::pass(format!(
                    "server accepting connections on {}:{}",
                    host, port
                )))
            } else {
                Ok(CheckResult::fail(format!(
                    "no MySQL service found (tried {})",
                    ctx.settings.mysql.service_names.join(", ")
                )))
            }
        }
    }
}

fn check_credentials(ctx: &HostContext) -> Result<CheckResult> {
    let env = ctx.env()?;
    let Some(conn) = Connection::from_env(&env, &ctx.settings.mysql) else {
        return Ok(CheckResult::fail("credentials not configured in .env"));
    };

    let out = conn.query(ctx, "SELECT 1")?;
    if out.success {
        Ok(CheckResult::pass(format!(
            "connected as {}@{}",
            conn.user, conn.host
        )))
    } else {
        Ok(CheckResult::fail(out.error_summary()))
    }
}

fn check_database(ctx: &HostContext) -> Result<CheckResult> {
    let env = ctx.env()?;
    let Some(conn) = Connection::from_env(&env, &ctx.settings.mysql) else {
        return Ok(CheckResult::fail("credentials not configured in .env"));
    };
    if !DB_NAME_RE.is_match(&conn.database) {
        return Ok(CheckResult::fail(format!(
            "invalid database name: {}",
            conn.database
        )));
    }

    let sql = format!(
        "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = '{}'",
        conn.database
    );
    let out = conn.query(ctx, &sql)?;
    if !out.success {
        return Ok(CheckResult::fail(out.error_summary()));
    }
    if out.stdout.lines().any(|l| l.trim() == conn.database) {
        Ok(CheckResult::pass(format!("database '{}' exists", conn.database)))
    } else {
        Ok(CheckResult::fail(format!(
            "database '{}' does not exist",
            conn.database
        )))
    }
}

fn configure(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let mut env = rc.host.env()?;
    let defaults = &rc.host.settings.mysql;

    let current = |key: &str, fallback: &str| {
        env.get(key)
            .filter(|v| !v.is_empty() && !is_placeholder(v))
            .unwrap_or_else(|| fallback.to_string())
    };
    let host_default = current("DB_HOST", &defaults.default_host);
    let port_default = current("DB_PORT", &defaults.default_port.to_string());
    let user_default = current("DB_USER", &defaults.default_user);
    let name_default = current("DB_NAME", &defaults.default_database);

    let host = rc
        .ui
        .prompt(&Prompt::input("db_host", "MySQL host", Some(&host_default)))?
        .as_string();
    let port = rc
        .ui
        .prompt(&Prompt::input("db_port", "MySQL port", Some(&port_default)))?
        .as_string();
    if port.trim().parse::<u16>().is_err() {
        return Ok(CheckResult::fail(format!("invalid port: {}", port)));
    }
    let user = rc
        .ui
        .prompt(&Prompt::input("db_user", "MySQL user", Some(&user_default)))?
        .as_string();
    let password = rc
        .ui
        .prompt(&Prompt::password("db_password", "MySQL password"))?
        .as_string();
    let name = rc
        .ui
        .prompt(&Prompt::input("db_name", "Database name", Some(&name_default)))?
        .as_string();
    if !DB_NAME_RE.is_match(name.trim()) {
        return Ok(CheckResult::fail(format!("invalid database name: {}", name)));
    }

    for (key, value) in [
        ("DB_HOST", host.trim()),
        ("DB_PORT", port.trim()),
        ("DB_USER", user.trim()),
        ("DB_PASSWORD", password.as_str()),
        ("DB_NAME", name.trim()),
    ] {
        env.set(key, value);
    }
    env.save()?;

    Ok(CheckResult::pass(format!(
        "saved database settings to {}",
        rc.host.env_path().display()
    )))
}

fn start_service(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let (program, args): (&str, Vec<String>) = match Platform::current() {
        Platform::MacOS => ("brew", vec!["services".into(), "start".into(), "mysql".into()]),
        platform => {
            let Some((name, _)) = find_service(rc.host) else {
                return Ok(CheckResult::fail("no installed MySQL service to start"));
            };
            if platform == Platform::Windows {
                ("net", vec!["start".into(), name])
            } else {
                ("systemctl", vec!["start".into(), name])
            }
        }
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let label = "Starting MySQL";
    let mut spinner = rc.ui.start_spinner(label);
    let out = rc
        .host
        .run(program, &args, rc.host.settings.timeouts.probe())?;
    if out.success {
        spinner.finish_success("MySQL started");
        return Ok(CheckResult::pass("MySQL service started"));
    }

    spinner.finish_error(label);
    let summary = out.error_summary();
    let lowered = summary.to_lowercase();
    if lowered.contains("access is denied")
        || lowered.contains("access denied")
        || lowered.contains("authentication")
        || lowered.contains("interactive authentication required")
    {
        rc.ui.show_hint(match Platform::current() {
            Platform::Windows => "Run the terminal as Administrator and try again",
            _ => "Run `sudo systemctl start mysql` yourself, then choose Continue",
        });
    }
    Ok(CheckResult::fail(format!(
        "could not start MySQL: {}",
        summary
    )))
}

/// Ask for the password until it works or the user gives up.
///
/// `.env` is only written once a password has been verified.
fn update_password(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let env = rc.host.env()?;
    let Some(mut conn) = Connection::from_env(&env, &rc.host.settings.mysql) else {
        return Ok(CheckResult::fail(
            "DB_USER is not configured; choose the configure option first",
        ));
    };

    let max_attempts = rc.host.settings.max_password_attempts;
    let mut last_error = String::from("no attempt made");

    for attempt in 1..=max_attempts {
        conn.password = rc
            .ui
            .prompt(&Prompt::password(
                "db_password",
                &format!("MySQL password for {}", conn.user),
            ))?
            .as_string();

        let out = conn.query(rc.host, "SELECT 1")?;
        if out.success {
            let mut env = rc.host.env()?;
            env.set("DB_PASSWORD", &conn.password);
            env.save()?;
            return Ok(CheckResult::pass("password verified and saved to .env"));
        }

        last_error = out.error_summary();
        rc.ui.error(&format!(
            "Attempt {}/{}: {}",
            attempt, max_attempts, last_error
        ));
        if attempt == max_attempts {
            break;
        }
        let retry = rc
            .ui
            .prompt(&Prompt::confirm(
                "retry_password",
                "Try another password?",
                true,
            ))?
            .as_bool()
            .unwrap_or(false);
        if !retry {
            break;
        }
    }

    Ok(CheckResult::fail(format!(
        "password not updated: {}",
        last_error
    )))
}

fn create_database(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
    let env = rc.host.env()?;
    let Some(conn) = Connection::from_env(&env, &rc.host.settings.mysql) else {
        return Ok(CheckResult::fail("credentials not configured in .env"));
    };
    if !DB_NAME_RE.is_match(&conn.database) {
        return Ok(CheckResult::fail(format!(
            "invalid database name: {}",
            conn.database
        )));
    }

    let sql = format!(
        "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET utf8mb4",
        conn.database
    );
    let out = conn.query(rc.host, &sql)?;
    if out.success {
        Ok(CheckResult::pass(format!(
            "created database '{}'",
            conn.database
        )))
    } else {
        Ok(CheckResult::fail(format!(
            "could not create database '{}': {}",
            conn.database,
            out.error_summary()
        )))
    }
}
