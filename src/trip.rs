//! Serde types and SQL for the TLC yellow cab trip export.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

/// One row of the export. Field order matches the CSV header.
#[derive(Debug, Deserialize)]
pub struct TripRecord {
    #[serde(rename = "VendorID")]
    pub vendor_id: Option<i64>,
    #[serde(deserialize_with = "timestamp")]
    pub tpep_pickup_datetime: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    pub tpep_dropoff_datetime: NaiveDateTime,
    pub passenger_count: Option<i64>,
    pub trip_distance: f64,
    #[serde(rename = "RatecodeID")]
    pub ratecode_id: Option<i64>,
    pub store_and_fwd_flag: Option<String>,
    #[serde(rename = "PULocationID")]
    pub pu_location_id: Option<i64>,
    #[serde(rename = "DOLocationID")]
    pub do_location_id: Option<i64>,
    pub payment_type: Option<i64>,
    pub fare_amount: f64,
    pub extra: f64,
    pub mta_tax: f64,
    pub tip_amount: f64,
    pub tolls_amount: f64,
    pub improvement_surcharge: f64,
    pub total_amount: f64,
    pub congestion_surcharge: f64,
}

// timestamps in the export use a space separator, not RFC 3339
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
}

/// Destination columns in CSV header order with their Postgres types.
pub const COLUMNS: &[(&str, &str)] = &[
    ("VendorID", "bigint"),
    ("tpep_pickup_datetime", "timestamp"),
    ("tpep_dropoff_datetime", "timestamp"),
    ("passenger_count", "bigint"),
    ("trip_distance", "double precision"),
    ("RatecodeID", "bigint"),
    ("store_and_fwd_flag", "text"),
    ("PULocationID", "bigint"),
    ("DOLocationID", "bigint"),
    ("payment_type", "bigint"),
    ("fare_amount", "double precision"),
    ("extra", "double precision"),
    ("mta_tax", "double precision"),
    ("tip_amount", "double precision"),
    ("tolls_amount", "double precision"),
    ("improvement_surcharge", "double precision"),
    ("total_amount", "double precision"),
    ("congestion_surcharge", "double precision"),
];

// mixed-case identifiers need quoting in Postgres
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn drop_table_sql(table: &str) -> String {
    format!("drop table if exists {}", quote(table))
}

pub fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ty)| format!("{} {ty}", quote(name)))
        .collect();
    format!("create table {} ({})", quote(table), columns.join(", "))
}

pub fn insert_sql(table: &str) -> String {
    let columns: Vec<String> = COLUMNS.iter().map(|(name, _)| quote(name)).collect();
    let params: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("${i}")).collect();
    format!(
        "insert into {} ({}) values ({})",
        quote(table),
        columns.join(", "),
        params.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,RatecodeID,store_and_fwd_flag,PULocationID,DOLocationID,payment_type,fare_amount,extra,mta_tax,tip_amount,tolls_amount,improvement_surcharge,total_amount,congestion_surcharge";

    fn parse(row: &str) -> Result<TripRecord, csv::Error> {
        let data = format!("{HEADER}\n{row}");
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn full_row() {
        let record = parse(
            "1,2021-01-01 00:30:10,2021-01-01 00:36:12,1,2.1,1,N,142,43,2,8.0,3.0,0.5,0.0,0.0,0.3,11.8,2.5",
        )
        .unwrap();
        assert_eq!(record.vendor_id, Some(1));
        assert_eq!(
            record.tpep_pickup_datetime,
            NaiveDateTime::parse_from_str("2021-01-01 00:30:10", TIMESTAMP_FORMAT).unwrap()
        );
        assert_eq!(record.passenger_count, Some(1));
        assert_eq!(record.trip_distance, 2.1);
        assert_eq!(record.store_and_fwd_flag.as_deref(), Some("N"));
        assert_eq!(record.pu_location_id, Some(142));
        assert_eq!(record.total_amount, 11.8);
        assert_eq!(record.congestion_surcharge, 2.5);
    }

    #[test]
    fn nullable_fields() {
        let record = parse(
            ",2021-01-01 00:30:10,2021-01-01 00:36:12,,2.1,,,,,,8.0,3.0,0.5,0.0,0.0,0.3,11.8,2.5",
        )
        .unwrap();
        assert_eq!(record.vendor_id, None);
        assert_eq!(record.passenger_count, None);
        assert_eq!(record.ratecode_id, None);
        assert_eq!(record.store_and_fwd_flag, None);
        assert_eq!(record.pu_location_id, None);
        assert_eq!(record.payment_type, None);
    }

    #[test]
    fn non_numeric_distance() {
        let result = parse(
            "1,2021-01-01 00:30:10,2021-01-01 00:36:12,1,oops,1,N,142,43,2,8.0,3.0,0.5,0.0,0.0,0.3,11.8,2.5",
        );
        assert!(result.is_err());
    }

    #[test]
    fn bad_timestamp() {
        let result = parse(
            "1,01/01/2021 00:30,2021-01-01 00:36:12,1,2.1,1,N,142,43,2,8.0,3.0,0.5,0.0,0.0,0.3,11.8,2.5",
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_amount() {
        // monetary columns are not nullable
        let result = parse(
            "1,2021-01-01 00:30:10,2021-01-01 00:36:12,1,2.1,1,N,142,43,2,8.0,3.0,0.5,0.0,0.0,0.3,11.8,",
        );
        assert!(result.is_err());
    }

    #[test]
    fn statements() {
        assert_eq!(
            drop_table_sql("yellow_taxi_data"),
            "drop table if exists \"yellow_taxi_data\""
        );

        let create = create_table_sql("yellow_taxi_data");
        assert!(create.starts_with("create table \"yellow_taxi_data\" (\"VendorID\" bigint, "));
        assert!(create.contains("\"tpep_pickup_datetime\" timestamp"));
        assert!(create.contains("\"store_and_fwd_flag\" text"));
        assert!(create.ends_with("\"congestion_surcharge\" double precision)"));

        let insert = insert_sql("yellow_taxi_data");
        assert!(insert.starts_with("insert into \"yellow_taxi_data\" (\"VendorID\", "));
        assert!(insert.ends_with("$17, $18)"));
    }
}
