use thiserror::Error;
use tracing::warn;

use crate::providers::GeocodeProvider;

/// Geocoding fails loudly: there is no sensible default coordinate.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocode: address is empty")]
    EmptyAddress,
    #[error("geocode failed: no provider returned a result")]
    Exhausted,
}

/// Address resolution over an explicit, ordered provider list
/// (primary first), short-circuiting on the first success.
pub struct Geocoder {
    providers: Vec<Box<dyn GeocodeProvider>>,
}

impl Geocoder {
    pub fn new(providers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self { providers }
    }

    pub async fn resolve(&self, address: &str) -> Result<(f64, f64), GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        for provider in &self.providers {
            match provider.geocode(address).await {
                Ok(coords) => return Ok(coords),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "geocode provider failed");
                }
            }
        }

        Err(GeocodeError::Exhausted)
    }
}
