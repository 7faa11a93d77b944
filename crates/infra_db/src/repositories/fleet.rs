//! Vehicle, part, and installation repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use domain_warranty::{InstalledPart, Part, Vehicle};

use crate::error::DatabaseError;

const INSTALLED_COLUMNS: &str = "id, part_id, vehicle_id, installation_date, mileage_at_installation_km, \
     warranty_expiration_date, warranty_mileage_limit_km, recorded_at";

#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: Uuid,
    pub vin: String,
    pub model: String,
    pub customer_id: Uuid,
    pub mileage_km: i64,
    pub purchase_date: NaiveDate,
    pub warranty_start_date: NaiveDate,
    pub warranty_end_date: NaiveDate,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: row.id.into(),
            vin: row.vin,
            model: row.model,
            customer_id: row.customer_id.into(),
            mileage_km: row.mileage_km,
            purchase_date: row.purchase_date,
            warranty_start_date: row.warranty_start_date,
            warranty_end_date: row.warranty_end_date,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PartRow {
    pub id: Uuid,
    pub part_number: String,
    pub name: String,
    pub has_extended_warranty: bool,
    pub default_warranty_mileage_km: Option<i64>,
    pub grace_period_days: Option<i64>,
    pub paid_fee_min_ratio: Option<Decimal>,
    pub paid_fee_max_ratio: Option<Decimal>,
}

impl From<PartRow> for Part {
    fn from(row: PartRow) -> Self {
        Part {
            id: row.id.into(),
            part_number: row.part_number,
            name: row.name,
            has_extended_warranty: row.has_extended_warranty,
            default_warranty_mileage_km: row.default_warranty_mileage_km,
            grace_period_days: row.grace_period_days,
            paid_fee_min_ratio: row.paid_fee_min_ratio,
            paid_fee_max_ratio: row.paid_fee_max_ratio,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InstalledPartRow {
    pub id: Uuid,
    pub part_id: Uuid,
    pub vehicle_id: Uuid,
    pub installation_date: NaiveDate,
    pub mileage_at_installation_km: Option<i64>,
    pub warranty_expiration_date: NaiveDate,
    pub warranty_mileage_limit_km: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

impl From<InstalledPartRow> for InstalledPart {
    fn from(row: InstalledPartRow) -> Self {
        InstalledPart {
            id: row.id.into(),
            part_id: row.part_id.into(),
            vehicle_id: row.vehicle_id.into(),
            installation_date: row.installation_date,
            mileage_at_installation_km: row.mileage_at_installation_km,
            warranty_expiration_date: row.warranty_expiration_date,
            warranty_mileage_limit_km: row.warranty_mileage_limit_km,
            recorded_at: row.recorded_at,
        }
    }
}

/// Repository for the fleet data the lifecycles read
#[derive(Debug, Clone)]
pub struct FleetRepository {
    pool: PgPool,
}

impl FleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_vehicle(&self, id: Uuid) -> Result<Option<VehicleRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, VehicleRow>(
            "SELECT id, vin, model, customer_id, mileage_km, purchase_date, \
             warranty_start_date, warranty_end_date FROM vehicles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Inserts or replaces a vehicle; a VIN held by another vehicle is a duplicate
    pub async fn upsert_vehicle(&self, vehicle: &Vehicle) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (
                id, vin, model, customer_id, mileage_km,
                purchase_date, warranty_start_date, warranty_end_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                vin = EXCLUDED.vin,
                model = EXCLUDED.model,
                customer_id = EXCLUDED.customer_id,
                mileage_km = EXCLUDED.mileage_km,
                purchase_date = EXCLUDED.purchase_date,
                warranty_start_date = EXCLUDED.warranty_start_date,
                warranty_end_date = EXCLUDED.warranty_end_date
            "#,
        )
        .bind(Uuid::from(vehicle.id))
        .bind(&vehicle.vin)
        .bind(&vehicle.model)
        .bind(Uuid::from(vehicle.customer_id))
        .bind(vehicle.mileage_km)
        .bind(vehicle.purchase_date)
        .bind(vehicle.warranty_start_date)
        .bind(vehicle.warranty_end_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_part(&self, id: Uuid) -> Result<Option<PartRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PartRow>(
            "SELECT id, part_number, name, has_extended_warranty, default_warranty_mileage_km, \
             grace_period_days, paid_fee_min_ratio, paid_fee_max_ratio FROM parts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn upsert_part(&self, part: &Part) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO parts (
                id, part_number, name, has_extended_warranty, default_warranty_mileage_km,
                grace_period_days, paid_fee_min_ratio, paid_fee_max_ratio
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                part_number = EXCLUDED.part_number,
                name = EXCLUDED.name,
                has_extended_warranty = EXCLUDED.has_extended_warranty,
                default_warranty_mileage_km = EXCLUDED.default_warranty_mileage_km,
                grace_period_days = EXCLUDED.grace_period_days,
                paid_fee_min_ratio = EXCLUDED.paid_fee_min_ratio,
                paid_fee_max_ratio = EXCLUDED.paid_fee_max_ratio
            "#,
        )
        .bind(Uuid::from(part.id))
        .bind(&part.part_number)
        .bind(&part.name)
        .bind(part.has_extended_warranty)
        .bind(part.default_warranty_mileage_km)
        .bind(part.grace_period_days)
        .bind(part.paid_fee_min_ratio)
        .bind(part.paid_fee_max_ratio)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_installed_part(&self, id: Uuid) -> Result<Option<InstalledPartRow>, DatabaseError> {
        let sql = format!("SELECT {INSTALLED_COLUMNS} FROM installed_parts WHERE id = $1");
        Ok(sqlx::query_as::<_, InstalledPartRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn upsert_installed_part(&self, installed: &InstalledPart) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO installed_parts (
                id, part_id, vehicle_id, installation_date, mileage_at_installation_km,
                warranty_expiration_date, warranty_mileage_limit_km, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                part_id = EXCLUDED.part_id,
                vehicle_id = EXCLUDED.vehicle_id,
                installation_date = EXCLUDED.installation_date,
                mileage_at_installation_km = EXCLUDED.mileage_at_installation_km,
                warranty_expiration_date = EXCLUDED.warranty_expiration_date,
                warranty_mileage_limit_km = EXCLUDED.warranty_mileage_limit_km
            "#,
        )
        .bind(Uuid::from(installed.id))
        .bind(Uuid::from(installed.part_id))
        .bind(Uuid::from(installed.vehicle_id))
        .bind(installed.installation_date)
        .bind(installed.mileage_at_installation_km)
        .bind(installed.warranty_expiration_date)
        .bind(installed.warranty_mileage_limit_km)
        .bind(installed.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn installations_of_part(&self, part_id: Uuid) -> Result<Vec<InstalledPartRow>, DatabaseError> {
        let sql = format!("SELECT {INSTALLED_COLUMNS} FROM installed_parts WHERE part_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, InstalledPartRow>(&sql)
            .bind(part_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// The most recent installation of a part type on a vehicle
    pub async fn installation_on_vehicle(
        &self,
        part_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<Option<InstalledPartRow>, DatabaseError> {
        let sql = format!(
            "SELECT {INSTALLED_COLUMNS} FROM installed_parts WHERE part_id = $1 AND vehicle_id = $2 \
             ORDER BY installation_date DESC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, InstalledPartRow>(&sql)
            .bind(part_id)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
