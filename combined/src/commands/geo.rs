//! Geo command - country, state and city names.

use tokio_util::sync::CancellationToken;

use admin_client::GeoLookup;
use common::{AppConfig, AppResult};

use super::print_json;
use crate::cli::{GeoAction, GeoArgs};

/// Runs without the database; the lookup only needs the geo endpoints
pub async fn execute(args: GeoArgs, config: AppConfig, cancel: &CancellationToken) -> AppResult<()> {
    let geo = GeoLookup::new(config.geo)?;

    match args.action {
        GeoAction::Countries => print_json(&geo.countries(cancel).await?),
        GeoAction::States { country } => print_json(&geo.states(&country, cancel).await?),
        GeoAction::Cities { country, state } => {
            print_json(&geo.cities(&country, &state, cancel).await?)
        }
    }
}
