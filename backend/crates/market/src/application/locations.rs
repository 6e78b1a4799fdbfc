//! Location Use Cases

use std::sync::Arc;

use auth::AuthContext;
use kernel::id::LocationId;
use kernel::validation::Validator;

use crate::domain::entity::location::{Location, LocationChanges};
use crate::domain::repository::SharedMarketRepository;
use crate::domain::value_object::{country::Country, place_name::PlaceName};
use crate::error::{MarketError, MarketResult};

pub struct CreateLocationInput {
    pub city: String,
    pub state: String,
    pub country_code: String,
}

#[derive(Debug, Default)]
pub struct UpdateLocationInput {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
}

pub struct LocationUseCase<R> {
    repo: Arc<R>,
}

impl<R: SharedMarketRepository> LocationUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        ctx: &AuthContext,
        input: CreateLocationInput,
    ) -> MarketResult<Location> {
        let user = ctx.require_active()?;

        let mut v = Validator::new();
        let city = v.check("city", PlaceName::new(input.city, "city"));
        let state = v.check("state", PlaceName::new(input.state, "state"));
        let country = v.check("country_code", Country::from_code(&input.country_code));
        let (Some(city), Some(state), Some(country)) = (city, state, country) else {
            return Err(MarketError::Validation(v.into_errors()));
        };

        let location = Location::new(city, state, country, user.user_id);
        self.repo.create_location(&location).await?;

        tracing::info!(location_id = %location.location_id, "Location created");

        Ok(location)
    }

    pub async fn list(&self) -> MarketResult<Vec<Location>> {
        self.repo.list_locations().await
    }

    pub async fn get(&self, location_id: &LocationId) -> MarketResult<Location> {
        self.repo
            .find_location(location_id)
            .await?
            .ok_or(MarketError::LocationNotFound)
    }

    /// Owner-only; city, state and country are the only mutable fields
    pub async fn update(
        &self,
        ctx: &AuthContext,
        location_id: &LocationId,
        input: UpdateLocationInput,
    ) -> MarketResult<Location> {
        let user = ctx.require_active()?;
        let location = self.get(location_id).await?;
        if !location.is_owned_by(&user.user_id) {
            return Err(MarketError::NotOwner);
        }

        let mut v = Validator::new();
        let changes = LocationChanges {
            city: input
                .city
                .and_then(|c| v.check("city", PlaceName::new(c, "city"))),
            state: input
                .state
                .and_then(|s| v.check("state", PlaceName::new(s, "state"))),
            country: input
                .country_code
                .and_then(|c| v.check("country_code", Country::from_code(&c))),
        };
        if !v.has_errors() && changes.is_empty() {
            v.reject("location", "Please supply at least one field to update");
        }
        if v.has_errors() {
            return Err(MarketError::Validation(v.into_errors()));
        }

        self.repo
            .update_location(location_id, &changes)
            .await?
            .ok_or(MarketError::LocationNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::Fixture;

    fn input(city: &str, code: &str) -> CreateLocationInput {
        CreateLocationInput {
            city: city.into(),
            state: "Oyo".into(),
            country_code: code.into(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_place_names() {
        let fx = Fixture::new().await;
        let location = fx
            .locations()
            .create(&fx.user("ada", true), input("ibadan", "ng"))
            .await
            .unwrap();

        assert_eq!(location.city.as_str(), "IBADAN");
        assert_eq!(location.state.as_str(), "OYO");
        assert_eq!(location.country, "Nigeria");
        assert_eq!(location.country_code, "NG");
        assert_eq!(fx.locations().get(&location.location_id).await.unwrap(), location);
    }

    #[tokio::test]
    async fn test_unknown_country_is_a_field_error() {
        let fx = Fixture::new().await;
        let err = fx
            .locations()
            .create(&fx.user("ada", true), input("Ibadan", "XX"))
            .await
            .unwrap_err();

        let MarketError::Validation(fields) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(fields["country_code"], "Please supply a valid country code");
    }

    #[tokio::test]
    async fn test_only_owner_updates() {
        let fx = Fixture::new().await;
        let ada = fx.user("ada", true);
        let location = fx.locations().create(&ada, input("Ibadan", "NG")).await.unwrap();
        let rename = || UpdateLocationInput {
            city: Some("Ogbomoso".into()),
            ..Default::default()
        };

        assert!(matches!(
            fx.locations()
                .update(&fx.user("bob", true), &location.location_id, rename())
                .await,
            Err(MarketError::NotOwner)
        ));

        let updated = fx
            .locations()
            .update(&ada, &location.location_id, rename())
            .await
            .unwrap();
        assert_eq!(updated.city.as_str(), "OGBOMOSO");
        assert_eq!(updated.state, location.state);
    }

    #[tokio::test]
    async fn test_missing_location() {
        let fx = Fixture::new().await;
        assert!(matches!(
            fx.locations().get(&LocationId::new()).await,
            Err(MarketError::LocationNotFound)
        ));
    }
}
