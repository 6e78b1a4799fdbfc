//! PostgreSQL Repository Implementation
//!
//! Items are read joined with their owner (users) and location.

use chrono::{DateTime, Utc};
use kernel::id::{ItemId, LocationId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::item::{Item, ItemChanges, ItemOwner, NewItem};
use crate::domain::entity::location::{Location, LocationChanges};
use crate::domain::repository::{ItemRepository, LocationRepository};
use crate::domain::value_object::{
    item_name::ItemName, message_text::MessageText, phone_no::PhoneNo, place_name::PlaceName,
};
use crate::error::{MarketError, MarketResult};

const LOCATION_COLUMNS: &str = r#"
    location_id,
    city,
    state,
    country,
    country_code,
    user_id,
    created_at,
    updated_at
"#;

const ITEM_SELECT: &str = r#"
    SELECT
        i.item_id,
        i.user_id,
        u.display_name,
        u.email,
        i.name,
        i.phone_no,
        i.closed,
        i.instruction,
        i.created_at,
        i.updated_at,
        l.location_id,
        l.city,
        l.state,
        l.country,
        l.country_code,
        l.user_id AS location_owner_id,
        l.created_at AS location_created_at,
        l.updated_at AS location_updated_at
    FROM items i
    JOIN users u ON u.user_id = i.user_id
    JOIN locations l ON l.location_id = i.location_id
"#;

/// PostgreSQL-backed item and location repository
#[derive(Clone)]
pub struct PgMarketRepository {
    pool: PgPool,
}

impl PgMarketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ItemRepository for PgMarketRepository {
    async fn create_item(&self, item: &NewItem) -> MarketResult<Item> {
        sqlx::query(
            r#"
            INSERT INTO items (
                item_id,
                user_id,
                name,
                phone_no,
                location_id,
                instruction,
                closed,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $7)
            "#,
        )
        .bind(item.item_id.as_uuid())
        .bind(item.owner.user_id.as_uuid())
        .bind(item.name.as_str())
        .bind(item.phone_no.as_str())
        .bind(item.location_id.as_uuid())
        .bind(item.instruction.as_str())
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        self.find_item(&item.item_id)
            .await?
            .ok_or_else(|| MarketError::Internal("inserted item not readable".into()))
    }

    async fn find_item(&self, item_id: &ItemId) -> MarketResult<Option<Item>> {
        let sql = format!("{ITEM_SELECT} WHERE i.item_id = $1");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(item_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ItemRow::into_item))
    }

    async fn update_item(
        &self,
        item_id: &ItemId,
        changes: &ItemChanges,
    ) -> MarketResult<Option<Item>> {
        // Absent fields keep their current value.
        let updated = sqlx::query(
            r#"
            UPDATE items SET
                name = COALESCE($2, name),
                phone_no = COALESCE($3, phone_no),
                location_id = COALESCE($4, location_id),
                instruction = COALESCE($5, instruction),
                updated_at = $6
            WHERE item_id = $1
            "#,
        )
        .bind(item_id.as_uuid())
        .bind(changes.name.as_ref().map(ItemName::as_str))
        .bind(changes.phone_no.as_ref().map(PhoneNo::as_str))
        .bind(changes.location_id.map(LocationId::into_uuid))
        .bind(changes.instruction.as_ref().map(MessageText::as_str))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.find_item(item_id).await
    }

    async fn close_item(&self, item_id: &ItemId) -> MarketResult<Option<Item>> {
        let updated = sqlx::query("UPDATE items SET closed = TRUE, updated_at = $2 WHERE item_id = $1")
            .bind(item_id.as_uuid())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.find_item(item_id).await
    }

    async fn list_open_items(&self) -> MarketResult<Vec<Item>> {
        let sql = format!("{ITEM_SELECT} WHERE NOT i.closed ORDER BY i.created_at DESC");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }

    async fn list_open_items_in(&self, location_id: &LocationId) -> MarketResult<Vec<Item>> {
        let sql = format!(
            "{ITEM_SELECT} WHERE NOT i.closed AND i.location_id = $1 ORDER BY i.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(location_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }
}

impl LocationRepository for PgMarketRepository {
    async fn create_location(&self, location: &Location) -> MarketResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (
                location_id,
                city,
                state,
                country,
                country_code,
                user_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(location.location_id.as_uuid())
        .bind(location.city.as_str())
        .bind(location.state.as_str())
        .bind(&location.country)
        .bind(&location.country_code)
        .bind(location.owner_id.map(UserId::into_uuid))
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_location(&self, location_id: &LocationId) -> MarketResult<Option<Location>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE location_id = $1");
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(location_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(LocationRow::into_location))
    }

    async fn list_locations(&self) -> MarketResult<Vec<Location>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations ORDER BY country, state, city");
        let rows = sqlx::query_as::<_, LocationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(LocationRow::into_location).collect())
    }

    async fn update_location(
        &self,
        location_id: &LocationId,
        changes: &LocationChanges,
    ) -> MarketResult<Option<Location>> {
        let sql = format!(
            r#"
            UPDATE locations SET
                city = COALESCE($2, city),
                state = COALESCE($3, state),
                country = COALESCE($4, country),
                country_code = COALESCE($5, country_code),
                updated_at = $6
            WHERE location_id = $1
            RETURNING {LOCATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(location_id.as_uuid())
            .bind(changes.city.as_ref().map(PlaceName::as_str))
            .bind(changes.state.as_ref().map(PlaceName::as_str))
            .bind(changes.country.map(|c| c.name()))
            .bind(changes.country.map(|c| c.code()))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(LocationRow::into_location))
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    location_id: Uuid,
    city: String,
    state: String,
    country: String,
    country_code: String,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LocationRow {
    fn into_location(self) -> Location {
        Location {
            location_id: LocationId::from_uuid(self.location_id),
            city: PlaceName::from_db(self.city),
            state: PlaceName::from_db(self.state),
            country: self.country,
            country_code: self.country_code,
            owner_id: self.user_id.map(UserId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    item_id: Uuid,
    user_id: Uuid,
    display_name: String,
    email: String,
    name: String,
    phone_no: String,
    closed: bool,
    instruction: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    location_id: Uuid,
    city: String,
    state: String,
    country: String,
    country_code: String,
    location_owner_id: Option<Uuid>,
    location_created_at: DateTime<Utc>,
    location_updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> Item {
        Item {
            item_id: ItemId::from_uuid(self.item_id),
            owner: ItemOwner {
                user_id: UserId::from_uuid(self.user_id),
                display_name: self.display_name,
                email: self.email,
            },
            name: ItemName::from_db(self.name),
            phone_no: PhoneNo::from_db(self.phone_no),
            location: Location {
                location_id: LocationId::from_uuid(self.location_id),
                city: PlaceName::from_db(self.city),
                state: PlaceName::from_db(self.state),
                country: self.country,
                country_code: self.country_code,
                owner_id: self.location_owner_id.map(UserId::from_uuid),
                created_at: self.location_created_at,
                updated_at: self.location_updated_at,
            },
            closed: self.closed,
            instruction: MessageText::from_db(self.instruction),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
