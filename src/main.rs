//! Terminal host for the dashboard session core.
//!
//! Each invocation rebuilds its session from the token jar, runs one command
//! and exits. Results go to stdout as JSON; navigation and logs go to stderr.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dashboard::clock::SystemClock;
use dashboard::config::{ClientConfig, ConfigError};
use dashboard::manager::Identity;
use dashboard::nav::Navigator;
use dashboard::net::api::{Acknowledgement, Credentials, PasswordUpdate};
use dashboard::net::{HttpRequest, Method, NetworkError, ReqwestClient};
use dashboard::route::{Route, UnknownRoute};
use dashboard::store::{FileTokenStore, MemoryTokenStore, TokenStore};
use dashboard::{AuthError, ErrorCode, GuardDecision, LoginOutcome, SessionContext, SessionManager};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Route(#[from] UnknownRoute),
    #[error("{0}")]
    InvalidMethod(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Auth(e) => e.error_code(),
            Self::Network(e) => e.error_code(),
            Self::Route(_) => "E_UNKNOWN_ROUTE",
            Self::InvalidMethod(_) => "E_INVALID_METHOD",
            Self::InvalidJson(_) => "E_INVALID_JSON",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Auth(e) => e.retryable(),
            Self::Network(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Dashboard session client")]
struct Cli {
    #[arg(long, env = "DASHBOARD_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "DASHBOARD_TOKEN_FILE")]
    token_file: Option<std::path::PathBuf>,

    /// Keep the session in memory only; nothing is read from or written to disk.
    #[arg(long, default_value_t = false)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a session.
    Login(LoginArgs),
    /// Create an account. Does not log in.
    Register(LoginArgs),
    /// Change the password, e.g. after a refused login.
    UpdatePassword(UpdatePasswordArgs),
    /// Delete the stored credential.
    Logout,
    /// Show the identity held in the stored credential.
    Whoami,
    /// Run the navigation guard for a route.
    Visit { route: String },
    /// Trade the stored credential for a fresh one.
    Refresh,
    /// Send an authenticated request to the backend.
    Request {
        method: String,
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
    password: String,

    /// Route to enter on success.
    #[arg(long)]
    redirect: Option<String>,
}

#[derive(Args, Debug)]
struct UpdatePasswordArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
    current_password: String,

    #[arg(long, env = "DASHBOARD_NEW_PASSWORD", hide_env_values = true)]
    new_password: String,

    /// Defaults to the new password.
    #[arg(long)]
    verify_password: Option<String>,

    #[arg(long, default_value = "login")]
    redirect: String,
}

/// Navigator for a one-shot process: there is no view to rebuild, so
/// navigation is reported on stderr.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate_to(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        eprintln!("-> {route}");
    }

    fn force_reload(&self) {
        tracing::debug!("reload");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = dashboard::config::parse_api_url(api_url)?;
    }
    if let Some(token_file) = cli.token_file {
        config.token_file = token_file;
    }

    let clock = Arc::new(SystemClock);
    let store: Box<dyn TokenStore> = if cli.ephemeral {
        Box::new(MemoryTokenStore::new(clock.clone()))
    } else {
        Box::new(FileTokenStore::new(config.token_file.clone(), clock.clone()))
    };
    let http = Arc::new(ReqwestClient::from_config(&config)?);
    let manager = SessionManager::new(http, Arc::new(TerminalNavigator)).with_token_ttl(config.token_ttl);
    let mut ctx = SessionContext::new(store, clock);

    let result = run(&manager, &mut ctx, cli.command).await;
    if let Err(e) = &result {
        tracing::error!(code = e.error_code(), retryable = e.retryable(), error = %e, "command failed");
    }
    result
}

async fn run(manager: &SessionManager, ctx: &mut SessionContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login(args) => {
            let redirect = parse_route(args.redirect.as_deref())?;
            let credentials = Credentials::new(args.username, args.password);
            match manager.login(ctx, &credentials, redirect).await? {
                LoginOutcome::Authenticated(identity) => print_json(&identity_json(Some(&identity))),
                LoginOutcome::PasswordResetRequired => print_json(&json!({
                    "authenticated": false,
                    "password_reset_required": true,
                })),
            }
        }
        Command::Register(args) => {
            let redirect = parse_route(args.redirect.as_deref())?;
            let credentials = Credentials::new(args.username, args.password);
            let ack = manager.register(ctx, &credentials, redirect).await?;
            print_json(&ack_json(&ack))
        }
        Command::UpdatePassword(args) => {
            let redirect = parse_route(Some(&args.redirect))?;
            let update = PasswordUpdate {
                verify_password: args.verify_password.unwrap_or_else(|| args.new_password.clone()),
                username: args.username,
                current_password: args.current_password,
                new_password: args.new_password,
            };
            manager.restore(ctx);
            let ack = manager.update_password(ctx, &update, redirect).await?;
            print_json(&ack_json(&ack))
        }
        Command::Logout => {
            manager.logout(ctx)?;
            print_json(&identity_json(None))
        }
        Command::Whoami => {
            let identity = manager.restore(ctx);
            print_json(&identity_json(identity.as_ref()))
        }
        Command::Visit { route } => {
            let route: Route = route.parse()?;
            let decision = manager.navigate(ctx, route);
            print_json(&json!({
                "route": route.name(),
                "decision": decision_name(decision),
                "entered": decision.allows_entry(),
                "current": ctx.current_route().map(Route::name),
            }))
        }
        Command::Refresh => {
            manager.restore(ctx);
            let identity = manager.refresh(ctx).await?;
            print_json(&identity_json(Some(&identity)))
        }
        Command::Request { method, path, data } => {
            let method: Method = method.parse().map_err(CliError::InvalidMethod)?;
            let mut request = HttpRequest::new(method, path);
            if let Some(data) = data {
                request = request.json(serde_json::from_str(&data)?);
            }
            manager.restore(ctx);
            let response = manager.authorized_request(ctx, request).await?;
            print_json(&response.body)
        }
    }
}

fn parse_route(raw: Option<&str>) -> Result<Option<Route>, CliError> {
    raw.map(str::parse::<Route>).transpose().map_err(CliError::from)
}

fn decision_name(decision: GuardDecision) -> &'static str {
    match decision {
        GuardDecision::Exempt => "exempt",
        GuardDecision::Authenticated => "authenticated",
        GuardDecision::Anonymous => "anonymous",
        GuardDecision::RedirectedToLogin => "redirected_to_login",
    }
}

fn identity_json(identity: Option<&Identity>) -> Value {
    match identity {
        Some(identity) => json!({
            "authenticated": true,
            "username": identity.username,
            "role": identity.role,
        }),
        None => json!({ "authenticated": false }),
    }
}

fn ack_json(ack: &Acknowledgement) -> Value {
    json!({ "user": ack.user, "message": ack.message })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
