use clap::Subcommand;
use prayermute_core::provider::TimeTableProvider;
use prayermute_core::{Location, Settings};

use super::describe;
use crate::host::Context;

#[derive(Subcommand)]
pub enum LocationAction {
    /// Search locations by name
    Search {
        /// Free-text query (e.g. "istanbul")
        query: String,
    },
    /// List locations of a country, optionally narrowed to a city
    List {
        /// Country name (defaults to provider.default_country)
        #[arg(long)]
        country: Option<String>,
        /// City name
        #[arg(long)]
        city: Option<String>,
    },
    /// Select the location used for prayer times
    Select {
        /// Location id from search or list
        id: u32,
        #[arg(long, default_value = "")]
        country: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long)]
        region: Option<String>,
    },
    /// Show the selected location
    Show,
}

fn print_locations(locations: &[Location]) {
    if locations.is_empty() {
        println!("no locations found");
        return;
    }
    for location in locations {
        println!("{:>6}  {location}", location.id);
    }
}

pub async fn run(action: LocationAction, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    match action {
        LocationAction::Search { query } => {
            let locations = ctx.provider.search_locations(&query).await?;
            print_locations(&locations);
        }
        LocationAction::List { country, city } => {
            let country = country.unwrap_or_else(|| ctx.settings.provider.default_country.clone());
            let locations = ctx
                .provider
                .list_locations(&country, city.as_deref())
                .await?;
            print_locations(&locations);
        }
        LocationAction::Select {
            id,
            country,
            city,
            region,
        } => {
            let location = Location {
                id,
                country,
                city,
                region,
            };
            let outcome = ctx.coordinator.select_location(&location).await?;
            println!("selected {location}: {}", describe(outcome));
        }
        LocationAction::Show => match ctx.coordinator.prefs().location()? {
            Some(location) => println!("{:>6}  {location}", location.id),
            None => println!("no location selected"),
        },
    }
    Ok(())
}
