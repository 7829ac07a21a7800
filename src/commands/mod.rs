/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `account`  -- Sign in, sign up, sign out and identity
- `places`   -- Browse, show, offer and edit places
- `bookings` -- List, make and cancel bookings

Every handler receives an [`App`] whose session has already been through
`auto_login`.
*/

use crate::app::App;
use crate::error::{Result, StaybookError};
use colored::Colorize;
use prettytable::{format, row, Table};

fn require_user(app: &App) -> Result<String> {
    app.session
        .current_user_id()
        .ok_or_else(|| StaybookError::NoActiveSession.into())
}

fn day(date: &chrono::DateTime<chrono::Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

// Session commands
pub mod account {
    //! Session commands.
    //!
    //! Failed credential exchanges print the classified message before the
    //! error is returned.

    use super::*;
    use crate::auth::session::SessionState;

    fn report_auth_failure(err: &anyhow::Error) {
        if let Some(StaybookError::Auth(auth)) = err.downcast_ref::<StaybookError>() {
            eprintln!("{}", auth.user_message().red());
        }
    }

    /// Sign in with an existing account
    pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
        match app.session.login(email, password).await {
            Ok(session) => {
                println!("{}", format!("Signed in as {}", session.user_id).green());
                Ok(())
            }
            Err(e) => {
                report_auth_failure(&e);
                Err(e)
            }
        }
    }

    /// Create an account and sign in
    pub async fn signup(app: &App, email: &str, password: &str) -> Result<()> {
        match app.session.signup(email, password).await {
            Ok(session) => {
                println!("{}", format!("Account created, signed in as {}", session.user_id).green());
                Ok(())
            }
            Err(e) => {
                report_auth_failure(&e);
                Err(e)
            }
        }
    }

    pub fn logout(app: &App) -> Result<()> {
        app.session.logout()?;
        println!("Signed out.");
        Ok(())
    }

    pub fn whoami(app: &App) -> Result<()> {
        match app.session.state() {
            SessionState::Authenticated(session) => {
                println!("User:    {}", session.user_id.cyan());
                println!(
                    "Expires: {}",
                    session.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            _ => println!("{}", "Not signed in.".yellow()),
        }
        Ok(())
    }
}

// Offered places commands
pub mod places {
    //! Offered places commands.

    use super::*;
    use std::path::Path;

    use crate::gateway::ImageUpload;
    use crate::resources::places::{NewPlace, Place, PlaceFilter, PlacePatch};

    /// Builds the listing table for `places`.
    pub fn places_table(places: &[Place]) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(row!["ID", "Title", "Price", "Available", "Owner"]);

        for place in places {
            table.add_row(row![
                place.id,
                place.title,
                format!("{:.2}", place.price),
                format!("{} .. {}", day(&place.available_from), day(&place.available_to)),
                place.owner_id
            ]);
        }
        table
    }

    /// List offered places
    pub async fn list(app: &App, filter: PlaceFilter) -> Result<()> {
        let user_id = require_user(app)?;
        let fetched = app.places.fetch_places().await?;
        let shown = filter.apply(&fetched, &user_id);

        if shown.is_empty() {
            println!("{}", "No places found.".yellow());
            return Ok(());
        }

        println!("\nOffered places:");
        places_table(&shown).printstd();
        println!();
        Ok(())
    }

    /// Show a single place
    pub async fn show(app: &App, id: &str) -> Result<()> {
        let user_id = require_user(app)?;
        let place = app.places.get_place(id).await?;

        println!("{}", place.title.bold());
        println!("{}", place.description);
        println!("Price:     {:.2}", place.price);
        println!(
            "Available: {} .. {}",
            day(&place.available_from),
            day(&place.available_to)
        );
        if let Some(location) = &place.location {
            println!("Address:   {} ({}, {})", location.address, location.lat, location.lng);
        }
        if !place.image_url.is_empty() {
            println!("Image:     {}", place.image_url);
        }
        if place.is_bookable_by(&user_id) {
            println!(
                "Book it with {}",
                format!("staybook bookings add --place {} ...", place.id).cyan()
            );
        } else {
            println!("{}", "This is one of your offers.".yellow());
        }
        Ok(())
    }

    /// Offer a new place, uploading `image` first when given
    pub async fn add(app: &App, mut place: NewPlace, image: Option<impl AsRef<Path>>) -> Result<()> {
        require_user(app)?;
        if let Some(path) = image {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path).await.map_err(StaybookError::Io)?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let stored = app
                .places
                .upload_image(ImageUpload { file_name, bytes })
                .await?;
            println!("Uploaded image to {}", stored.image_url.cyan());
            place.image_url = stored.image_url;
        }
        let created = app.places.add_place(place).await?;
        println!("{}", format!("Offered place {}", created.id).green());
        Ok(())
    }

    /// Edit the title and description of a place
    pub async fn edit(app: &App, id: &str, patch: PlacePatch) -> Result<()> {
        let updated = app.places.update_place(id, patch).await?;
        println!("{}", format!("Updated place {}", updated.id).green());
        Ok(())
    }
}

// Bookings commands
pub mod bookings {
    //! Bookings commands.

    use super::*;
    use crate::resources::bookings::{Booking, NewBooking};
    use chrono::{DateTime, Utc};

    /// Builds the listing table for `bookings`.
    pub fn bookings_table(bookings: &[Booking]) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(row!["ID", "Place", "Guest", "Guests", "Stay"]);

        for booking in bookings {
            table.add_row(row![
                booking.id,
                booking.place_title,
                format!("{} {}", booking.first_name, booking.last_name),
                booking.guest_number,
                format!("{} .. {}", day(&booking.booked_from), day(&booking.booked_to))
            ]);
        }
        table
    }

    pub async fn list(app: &App) -> Result<()> {
        let bookings = app.bookings.fetch_bookings().await?;
        if bookings.is_empty() {
            println!("{}", "No bookings yet.".yellow());
            return Ok(());
        }

        println!("\nYour bookings:");
        bookings_table(&bookings).printstd();
        println!();
        Ok(())
    }

    /// Book the place `place_id`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the place belongs to the current user
    pub async fn add(
        app: &App,
        place_id: &str,
        first_name: String,
        last_name: String,
        guests: u32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<()> {
        let user_id = require_user(app)?;
        let place = app.places.get_place(place_id).await?;
        if !place.is_bookable_by(&user_id) {
            return Err(StaybookError::InvalidInput("you cannot book your own place".to_string()).into());
        }

        let booking = NewBooking::for_place(&place, first_name, last_name, guests, from, to);
        let created = app.bookings.add_booking(booking).await?;
        println!(
            "{}",
            format!("Booked {} ({})", created.place_title, created.id).green()
        );
        Ok(())
    }

    pub async fn cancel(app: &App, id: &str) -> Result<()> {
        app.bookings.cancel_booking(id).await?;
        println!("{}", format!("Cancelled booking {}", id).green());
        Ok(())
    }
}
