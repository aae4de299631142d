//! Command handlers. Each one drives a core view and prints the outcome.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::warn;

use reply_core::oauth::{self, CallbackListener, CallbackParams, DEFAULT_CALLBACK_TIMEOUT_SECS};
use reply_core::utils::truncate_string;
use reply_core::views::{
    CallbackState, CallbackView, DashboardState, DashboardView, LoginStatus, LoginView,
};
use reply_core::{ApiClient, Config, SessionStore};

use crate::{LoginArgs, WebsitesCommand};

/// Column width for domains in `websites list`
const DOMAIN_COLUMN_WIDTH: usize = 40;

/// Wrong codes allowed before `login --otp` gives up
const MAX_CODE_ATTEMPTS: usize = 3;

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn email_or_prompt(email: Option<&str>) -> Result<String> {
    match email {
        Some(email) => Ok(email.to_string()),
        None => prompt("Email: "),
    }
}

// ===== Authentication =====

pub async fn login(config: &Config, api: ApiClient, store: SessionStore, args: &LoginArgs) -> Result<()> {
    let mut view = LoginView::new(api.clone(), store.clone());
    if view.already_authenticated() {
        println!("Already signed in. Run `reply logout` to switch accounts.");
        return Ok(());
    }

    if args.google {
        return login_google(config, api, store, args.no_listen).await;
    }

    let email = email_or_prompt(args.email.as_deref())?;
    let status = if args.otp {
        login_one_time_code(&mut view, &email).await?
    } else {
        let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
        eprintln!("{}", view.pending_label());
        view.submit_password(&email, &password).await.clone()
    };

    report_login(status)
}

async fn login_one_time_code(view: &mut LoginView, email: &str) -> Result<LoginStatus> {
    view.toggle_mode();
    eprintln!("{}", view.pending_label());
    if let LoginStatus::Error(message) = view.request_code(email).await {
        bail!("{}", message);
    }
    eprintln!("OTP code has been sent to {}", view.email());

    let mut attempts = 0;
    loop {
        let code = prompt("Enter 6-digit code (blank to resend): ")?;
        if code.is_empty() {
            if let LoginStatus::Error(message) = view.request_code(email).await {
                bail!("{}", message);
            }
            eprintln!("Code resent");
            continue;
        }

        eprintln!("{}", view.pending_label());
        match view.verify_code(&code).await.clone() {
            LoginStatus::Error(message) => {
                attempts += 1;
                if attempts >= MAX_CODE_ATTEMPTS {
                    bail!("{}", message);
                }
                eprintln!("{}", message);
            }
            status => return Ok(status),
        }
    }
}

async fn login_google(config: &Config, api: ApiClient, store: SessionStore, no_listen: bool) -> Result<()> {
    if config.oauth_client_id.is_empty() {
        warn!("No Google client id configured; set REPLY_GOOGLE_CLIENT_ID");
    }
    let url = oauth::authorization_url(config)?;

    let params = if no_listen {
        println!("Open this URL in your browser and sign in:\n\n  {}\n", url);
        let pasted = prompt("Paste the URL you were redirected to: ")?;
        CallbackParams::from_url(&pasted)?
    } else {
        let listener = CallbackListener::bind(&config.oauth_redirect_uri).await?;
        println!("Open this URL in your browser and sign in:\n\n  {}\n", url);
        eprintln!("Waiting for the redirect to {} ...", config.oauth_redirect_uri);
        listener
            .wait(Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS))
            .await?
    };

    let mut view = CallbackView::new(api, store, config.oauth_redirect_uri.clone());
    match view.complete(&params).await {
        CallbackState::Authenticated(user) => {
            println!("Signed in as {}", user.display_name());
            Ok(())
        }
        CallbackState::Failed(message) => bail!("{}", message),
        CallbackState::Pending => bail!("Authentication did not complete"),
    }
}

fn report_login(status: LoginStatus) -> Result<()> {
    match status {
        LoginStatus::Authenticated(user) => {
            println!("Signed in as {}", user.display_name());
            Ok(())
        }
        LoginStatus::Error(message) => bail!("{}", message),
        LoginStatus::Idle | LoginStatus::Loading => bail!("Login did not complete"),
    }
}

pub fn logout(store: &SessionStore) -> Result<()> {
    store.clear_credential();
    println!("Signed out");
    Ok(())
}

pub async fn whoami(api: &ApiClient, store: &SessionStore) -> Result<()> {
    let Some(token) = store.get_credential() else {
        bail!("Not signed in. Run `reply login`.");
    };
    match api.fetch_current_user(&token).await {
        Ok(user) => {
            println!("{}", user.display_name());
            println!("  email: {}", user.email);
            println!("  id:    {}", user.id);
            if let Some(ref picture) = user.picture {
                println!("  photo: {}", picture);
            }
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            store.clear_credential();
            bail!("Session expired ({}). Run `reply login` again.", e);
        }
        Err(e) => Err(e.into()),
    }
}

pub fn status(config: &Config, store: &SessionStore) -> Result<()> {
    println!("Backend:  {}", config.api_url);
    println!("Session:  {} store", store.backend_name());
    if store.is_authenticated() {
        println!("Status:   signed in");
    } else {
        println!("Status:   signed out");
    }
    Ok(())
}

pub fn show_config(config: &Config, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        config.save()?;
        println!("Saved to {}", Config::config_path()?.display());
    }
    Ok(())
}

// ===== Websites =====

pub async fn websites(api: ApiClient, store: SessionStore, cmd: WebsitesCommand) -> Result<()> {
    let had_session = store.is_authenticated();
    let mut dashboard = DashboardView::new(api, store);
    match dashboard.load().await {
        DashboardState::LoggedOut if had_session => {
            bail!("Session expired. Run `reply login` again.");
        }
        DashboardState::LoggedOut => bail!("Not signed in. Run `reply login`."),
        DashboardState::Failed(message) => bail!("Could not load your websites: {}", message),
        DashboardState::Loading | DashboardState::Ready { .. } => {}
    }

    match cmd {
        WebsitesCommand::List => {
            if dashboard.websites().is_empty() {
                println!("No websites yet. Add one with `reply websites add <domain>`.");
                return Ok(());
            }
            println!("{:<38} {:<width$} ADDED", "ID", "DOMAIN", width = DOMAIN_COLUMN_WIDTH);
            for site in dashboard.websites() {
                println!(
                    "{:<38} {:<width$} {}",
                    site.id,
                    truncate_string(&site.domain, DOMAIN_COLUMN_WIDTH),
                    site.created_date(),
                    width = DOMAIN_COLUMN_WIDTH
                );
            }
        }
        WebsitesCommand::Add { domain } => {
            let site = dashboard.add_website(&domain).await?;
            println!("Added {} ({})", site.domain, site.id);
            println!();
            println!("Paste this code before the closing </body> tag on your website:");
            println!();
            println!("{}", reply_core::snippet::embed_snippet(&site.id));
        }
        WebsitesCommand::Delete { id } => {
            dashboard.delete_website(&id).await?;
            println!("Deleted {}", id);
        }
        WebsitesCommand::Snippet { id } => match dashboard.snippet(&id) {
            Some(snippet) => println!("{}", snippet),
            None => bail!("No website with id {}", id),
        },
    }
    Ok(())
}
