// Feed Client - main.rs
// feed-client/src/main.rs
use actix::Actor;
use clap::{Parser, Subcommand};
use common::{setup_tracing, Config};
use feed_client::auth::{authorize_url, RedirectLocation};
use feed_client::bootstrap::{Outcome, SessionBootstrap};
use feed_client::identity::HelixIdentityResolver;
use feed_client::realtime::{RealtimeClient, TungsteniteConnector};
use feed_client::store::{FileStore, StoreError, TokenStore};
use feed_client::view::ViewActor;

#[derive(Debug, Parser)]
#[command(name = "feed-client", version, about = "Live Twitch channel subscription events")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Print the Twitch login URL
    Login,
    /// Connect and show events until Ctrl-C
    Run {
        /// Full URL Twitch redirected to after login, including its #access_token fragment
        #[arg(long, env = "FEED_REDIRECT_URL")]
        redirect: Option<String>,
    },
    /// Forget the stored token
    Logout,
}

#[actix::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    setup_tracing();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env();

    match cli.command {
        CliCommand::Login => {
            println!("Open this URL to log in:\n{}", authorize_url(&config.twitch)?);
        },
        CliCommand::Logout => {
            build_bootstrap(&config)?.logout()?;
            tracing::info!("Stored credentials removed");
        },
        CliCommand::Run { redirect } => {
            let mut location = redirect.as_deref().map(RedirectLocation::parse).transpose()?;
            let mut bootstrap = build_bootstrap(&config)?;

            match bootstrap.run(location.as_mut()).await? {
                Outcome::Authenticated(session) => {
                    tracing::info!("Logged in as user {}", session.user_id.as_deref().unwrap_or_default());
                    tokio::signal::ctrl_c().await?;
                    tracing::info!("Shutting down");
                },
                Outcome::LoggedOut => {
                    println!("Not logged in. Open this URL, then pass the redirect with --redirect:\n{}", authorize_url(&config.twitch)?);
                },
            }
        },
    }

    Ok(())
}

/// Open the token store and start the view and realtime actors
fn build_bootstrap(config: &Config) -> Result<SessionBootstrap<FileStore, HelixIdentityResolver>, StoreError> {
    let tokens = TokenStore::new(FileStore::open(&config.store_path)?);
    let view = ViewActor::new(config.timing.overlay_duration()).with_echo().start();
    let realtime = RealtimeClient::from_config(config, Box::new(TungsteniteConnector), view.clone().recipient()).start();
    let resolver = HelixIdentityResolver::new(&config.twitch);

    Ok(SessionBootstrap::new(tokens, resolver, view.recipient(), realtime, config.timing.token_ttl()))
}
