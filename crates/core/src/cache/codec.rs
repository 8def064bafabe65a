//! Typed access to cached tables and state records.

use crate::error::Result;
use phpscope_api::cache::{references_key, symbols_key};
use phpscope_api::{Cache, ReferenceTable, SymbolTable};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}

pub async fn read_value<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Result<Option<T>> {
    match cache.read(key).await? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

pub async fn write_value<T: Serialize>(cache: &dyn Cache, key: &str, value: &T) -> Result<()> {
    let bytes = encode(value)?;
    cache.write(key, bytes).await?;
    Ok(())
}

pub async fn read_symbol_table(cache: &dyn Cache, uri: &str) -> Result<Option<SymbolTable>> {
    read_value(cache, &symbols_key(uri)).await
}

pub async fn write_symbol_table(cache: &dyn Cache, table: &SymbolTable) -> Result<()> {
    write_value(cache, &symbols_key(&table.uri), table).await
}

pub async fn read_reference_table(cache: &dyn Cache, uri: &str) -> Result<Option<ReferenceTable>> {
    read_value(cache, &references_key(uri)).await
}

pub async fn write_reference_table(cache: &dyn Cache, table: &ReferenceTable) -> Result<()> {
    write_value(cache, &references_key(&table.uri), table).await
}

/// Drops both tables of `uri`.
pub async fn delete_tables(cache: &dyn Cache, uri: &str) -> Result<()> {
    cache.delete(&symbols_key(uri)).await?;
    cache.delete(&references_key(uri)).await?;
    Ok(())
}
