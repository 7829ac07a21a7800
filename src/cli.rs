//! Command-line interface definition for Staybook
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the session, offered places and bookings.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Staybook - book places and manage your own offers
#[derive(Parser, Debug, Clone)]
#[command(name = "staybook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the document store URL from config
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Staybook
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in with an existing account
    Login {
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "STAYBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        email: String,

        /// Password, at least six characters
        #[arg(short, long, env = "STAYBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session and forget the stored credentials
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse and offer places
    Places {
        #[command(subcommand)]
        command: PlaceCommand,
    },

    /// Manage your bookings
    Bookings {
        #[command(subcommand)]
        command: BookingCommand,
    },
}

/// Place subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PlaceCommand {
    /// List offered places
    List {
        /// Only places you can book (hides your own offers)
        #[arg(long)]
        bookable: bool,
    },

    /// Show a single place
    Show {
        /// Place id
        #[arg(allow_hyphen_values = true)]
        id: String,
    },

    /// Offer a new place
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Price per night
        #[arg(long)]
        price: f64,

        /// First available day (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,

        /// Last available day (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,

        #[arg(long, default_value = "", conflicts_with = "image")]
        image_url: String,

        /// Image file to upload and show with the place
        #[arg(long)]
        image: Option<PathBuf>,

        /// Street address shown with the map
        #[arg(long, requires_all = ["lat", "lng"])]
        address: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
    },

    /// Edit the title and description of a place
    Edit {
        /// Place id
        #[arg(allow_hyphen_values = true)]
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,
    },
}

/// Booking subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum BookingCommand {
    /// List your bookings
    List,

    /// Book a place
    Add {
        /// Id of the place to book
        #[arg(long, allow_hyphen_values = true)]
        place: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, default_value_t = 1)]
        guests: u32,

        /// Arrival (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,

        /// Departure (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,
    },

    /// Cancel a booking
    Cancel {
        /// Booking id
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
