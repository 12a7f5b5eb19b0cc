//! Committed gate CLI - diagnostics for deep-link classification, route
//! resolution, and manual link exchange against the configured provider.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use committed_core::{init_logging, Config, LegalAcceptanceStatus};
use route_gate::{resolve, RouteInput, UserGates};

/// Committed gate command-line interface.
#[derive(Parser)]
#[command(name = "committed-gate")]
#[command(about = "Diagnostics for the Committed auth-link and routing engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a raw URL and print the parsed intent as JSON
    Parse {
        /// The URL to classify
        url: String,
    },
    /// Resolve the canonical route for a given auth state
    Resolve {
        /// A session exists
        #[arg(long)]
        session: bool,
        /// The user record has loaded
        #[arg(long)]
        user_loaded: bool,
        /// The user's email is verified
        #[arg(long)]
        email_verified: bool,
        /// All required legal documents are accepted
        #[arg(long)]
        legal_accepted: bool,
        /// Onboarding completion (omit while still being determined)
        #[arg(long)]
        onboarding_complete: Option<bool>,
        /// A password-recovery flow is in progress
        #[arg(long)]
        recovery: bool,
    },
    /// Exchange an auth link against the configured identity provider
    Exchange {
        /// The auth-callback URL to exchange
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);
    let config = Config::new();

    match cli.command {
        Commands::Parse { url } => {
            match deep_link::parse(&url) {
                Some(link) => println!("{}", serde_json::to_string_pretty(&link)?),
                None => println!("null"),
            }
        }
        Commands::Resolve {
            session,
            user_loaded,
            email_verified,
            legal_accepted,
            onboarding_complete,
            recovery,
        } => {
            let input = RouteInput {
                has_session: session,
                user: user_loaded.then_some(UserGates {
                    email_verified,
                    legal: if legal_accepted {
                        LegalAcceptanceStatus::Accepted
                    } else {
                        LegalAcceptanceStatus::Required
                    },
                    onboarding_complete,
                }),
                password_recovery: recovery,
            };
            match resolve(&input) {
                Some(route) => println!("{}", route.as_str()),
                None => println!("undecided"),
            }
        }
        Commands::Exchange { url } => {
            run_exchange(&config, &url).await?;
        }
    }

    Ok(())
}

/// Prints the navigation the gate would issue.
struct PrintNavigator;

impl route_gate::Navigator for PrintNavigator {
    fn replace(&self, route: &str) {
        println!("gate redirect -> {route}");
    }
}

/// Run one link exchange end to end and report where the gate would land.
async fn run_exchange(config: &Config, url: &str) -> anyhow::Result<()> {
    use auth_link::{
        AuthApiClient, AuthLinkStore, AuthStateEvent, IdentityProvider, LinkExchanger,
        LinkOutcome, SessionState,
    };
    use route_gate::{AppGate, GateSnapshot};
    use token_store::{CallbackGuard, TokenStore};

    config.validate()?;
    tracing::info!(url = %url, api_url = %config.api_url, "Manual link exchange");

    let provider = AuthApiClient::new(&config.api_url, &config.publishable_key);
    let store = Arc::new(TokenStore::new());
    let guard = Arc::new(CallbackGuard::new());
    let links = Arc::new(AuthLinkStore::new());
    let exchanger =
        LinkExchanger::new(provider.clone(), store.clone(), guard.clone(), links.clone());

    let outcome = exchanger
        .handle_incoming_url(url)
        .await
        .with_context(|| format!("exchange failed: {:?}", links.snapshot()))?;

    match outcome {
        LinkOutcome::SignedIn(session) => {
            println!(
                "signed in as {} (expires {})",
                session.user_id, session.expires_at
            );

            let state = SessionState::new();
            state.finish_hydration();
            let access_token = session.access_token.clone();
            state.apply(AuthStateEvent::SignedIn(session));
            let user = provider
                .get_user(&access_token)
                .await
                .context("user fetch failed")?;
            state.set_current_user(user);

            let gate = AppGate::new(PrintNavigator, store.clone(), guard, links);
            let session = state.session();
            let user = state.current_user();
            let render = gate.evaluate(&GateSnapshot {
                hydrating: state.is_hydrating(),
                session: session.as_ref(),
                current_user: user.as_ref(),
                current_route: "/",
            });
            println!("gate render: {render:?}");
        }
        LinkOutcome::Skipped => println!("skipped: URL already exchanged"),
        LinkOutcome::Recorded => {
            if let Some(route) = store.peek_pending_route() {
                println!("recorded pending route {route}");
            } else if let Some(code) = store.peek_pending_referral_code() {
                println!("recorded referral code {code}");
            }
        }
        LinkOutcome::Ignored => println!("ignored: not a recognized deep link"),
    }

    Ok(())
}
