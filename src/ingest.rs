//! The batch loop: replace the target table on the first batch, append after.

use std::io::Read;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use sqlx::PgPool;

use crate::trip::{self, TripRecord};

pub async fn run<R: Read>(
    pool: &PgPool,
    mut reader: csv::Reader<R>,
    table: &str,
    batch_size: usize,
) -> Result<()> {
    let started = Instant::now();
    let mut batch = Vec::with_capacity(batch_size);
    let mut total: u64 = 0;
    let mut replaced = false;

    for (i, result) in reader.deserialize().enumerate() {
        let record: TripRecord =
            result.with_context(|| format!("failed to decode row {}", i + 1))?;
        batch.push(record);

        if batch.len() == batch_size {
            if !replaced {
                replace_table(pool, table).await?;
                replaced = true;
            }
            write_batch(pool, table, &batch).await?;
            total += batch.len() as u64;
            batch.clear();
            info!("{total} rows in {:.1?}", started.elapsed());
        }
    }

    // the schema step runs even when the source is empty
    if !replaced {
        replace_table(pool, table).await?;
    }
    if !batch.is_empty() {
        write_batch(pool, table, &batch).await?;
        total += batch.len() as u64;
    }

    info!("done: {total} rows in {:.1?}", started.elapsed());
    Ok(())
}

async fn replace_table(pool: &PgPool, table: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query(&trip::drop_table_sql(table))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&trip::create_table_sql(table))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to create table {table}"))?;
    tx.commit().await?;
    Ok(())
}

/// One transaction per batch, one parameterized insert per row.
async fn write_batch(pool: &PgPool, table: &str, batch: &[TripRecord]) -> Result<()> {
    let sql = trip::insert_sql(table);
    let mut tx = pool.begin().await?;
    for record in batch {
        sqlx::query(&sql)
            .bind(record.vendor_id)
            .bind(record.tpep_pickup_datetime)
            .bind(record.tpep_dropoff_datetime)
            .bind(record.passenger_count)
            .bind(record.trip_distance)
            .bind(record.ratecode_id)
            .bind(record.store_and_fwd_flag.as_deref())
            .bind(record.pu_location_id)
            .bind(record.do_location_id)
            .bind(record.payment_type)
            .bind(record.fare_amount)
            .bind(record.extra)
            .bind(record.mta_tax)
            .bind(record.tip_amount)
            .bind(record.tolls_amount)
            .bind(record.improvement_surcharge)
            .bind(record.total_amount)
            .bind(record.congestion_surcharge)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert into {table}"))?;
    }
    tx.commit().await?;
    Ok(())
}
