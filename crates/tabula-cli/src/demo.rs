// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use tabula_app::{CatalogColumn, MemoryBackend};

const SUPPLIERS: [[&str; 4]; 4] = [
    ["Northwind Traders", "Seattle", "4", "net 30"],
    ["Blue Harbor Supply", "Portland", "5", ""],
    ["Granite & Co", "Denver", "3", "ships Tuesdays"],
    ["Lakeside Parts", "Madison", "4", "net 15"],
];

const INVENTORY: [[&str; 4]; 6] = [
    ["hex bolt M8", "240", "0.35", "bin A3"],
    ["washer 8mm", "1200", "0.04", ""],
    ["hinge, brass", "36", "4.80", "reorder at 20"],
    ["cabinet pull", "58", "2.15", ""],
    ["wood glue 250ml", "14", "6.99", "keep from frost"],
    ["sandpaper P120", "90", "0.60", ""],
];

fn column(name: &str, data_type: &str, udt_name: &str, has_default: bool) -> CatalogColumn {
    CatalogColumn {
        name: name.to_owned(),
        data_type: data_type.to_owned(),
        udt_name: udt_name.to_owned(),
        has_default,
    }
}

/// In-memory tables for `--demo`.
pub fn backend() -> Result<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.add_table(
        "suppliers",
        vec![
            column("id", "integer", "int4", true),
            column("company_name", "character varying", "varchar", false),
            column("city", "text", "text", false),
            column("rating", "smallint", "int2", false),
            column("terms", "text", "text", false),
        ],
        Some("id"),
    );
    backend.add_table(
        "inventory",
        vec![
            column("sku_id", "bigint", "int8", true),
            column("product", "text", "text", false),
            column("quantity", "integer", "int4", false),
            column("unit_price", "numeric", "numeric", false),
            column("note", "text", "text", false),
        ],
        Some("sku_id"),
    );

    for [name, city, rating, terms] in SUPPLIERS {
        backend
            .push_values("suppliers", &["", name, city, rating, terms])
            .with_context(|| format!("seed supplier {name}"))?;
    }
    for [product, quantity, price, note] in INVENTORY {
        backend
            .push_values("inventory", &["", product, quantity, price, note])
            .with_context(|| format!("seed inventory item {product}"))?;
    }
    Ok(backend)
}
