//! Staybook - session-gated place booking CLI
//!
#![doc = "Staybook - session-gated place booking CLI"]
#![doc = "Main entry point for the Staybook application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use staybook::app::App;
use staybook::cli::{BookingCommand, Cli, Commands, PlaceCommand};
use staybook::commands;
use staybook::config::Config;
use staybook::resources::places::{NewPlace, PlaceFilter, PlaceLocation, PlacePatch};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let app = App::from_config(&config)?;

    // Every command starts from the persisted session, if any
    match app.session.auto_login().await {
        Ok(restored) => tracing::debug!(restored, "auto login finished"),
        Err(e) => tracing::warn!("Could not restore persisted session: {}", e),
    }

    match cli.command {
        Commands::Login { email, password } => {
            tracing::info!("Signing in");
            commands::account::login(&app, &email, &password).await
        }
        Commands::Signup { email, password } => {
            tracing::info!("Creating account");
            commands::account::signup(&app, &email, &password).await
        }
        Commands::Logout => commands::account::logout(&app),
        Commands::Whoami => commands::account::whoami(&app),
        Commands::Places { command } => match command {
            PlaceCommand::List { bookable } => {
                let filter = if bookable {
                    PlaceFilter::Bookable
                } else {
                    PlaceFilter::All
                };
                commands::places::list(&app, filter).await
            }
            PlaceCommand::Show { id } => commands::places::show(&app, &id).await,
            PlaceCommand::Add {
                title,
                description,
                price,
                from,
                to,
                image_url,
                image,
                address,
                lat,
                lng,
            } => {
                // clap enforces lat/lng whenever an address is given
                let location = match (address, lat, lng) {
                    (Some(address), Some(lat), Some(lng)) => Some(PlaceLocation {
                        lat,
                        lng,
                        address,
                        static_map_image_url: String::new(),
                    }),
                    _ => None,
                };
                let place = NewPlace {
                    title,
                    description,
                    image_url,
                    price,
                    available_from: from,
                    available_to: to,
                    location,
                };
                commands::places::add(&app, place, image).await
            }
            PlaceCommand::Edit {
                id,
                title,
                description,
            } => commands::places::edit(&app, &id, PlacePatch { title, description }).await,
        },
        Commands::Bookings { command } => match command {
            BookingCommand::List => commands::bookings::list(&app).await,
            BookingCommand::Add {
                place,
                first_name,
                last_name,
                guests,
                from,
                to,
            } => {
                commands::bookings::add(&app, &place, first_name, last_name, guests, from, to)
                    .await
            }
            BookingCommand::Cancel { id } => commands::bookings::cancel(&app, &id).await,
        },
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "staybook=debug"
    } else {
        "staybook=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
