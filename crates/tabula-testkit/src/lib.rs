// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use tabula_app::{CatalogColumn, MemoryBackend, Translations};

pub const CUSTOMERS: &str = "customers";
pub const ORDERS: &str = "orders";

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const CITIES: [&str; 14] = [
    "Austin",
    "Seattle",
    "Denver",
    "Madison",
    "Raleigh",
    "Pittsburgh",
    "Portland",
    "Boise",
    "Phoenix",
    "Nashville",
    "Columbus",
    "Minneapolis",
    "Omaha",
    "Tucson",
];
const ITEMS: [&str; 12] = [
    "Desk lamp",
    "Notebook",
    "Stapler",
    "Monitor arm",
    "Keyboard",
    "Cable tray",
    "Whiteboard",
    "Chair mat",
    "Headset",
    "Label maker",
    "Paper shredder",
    "Bookshelf",
];
const NOTES: [&str; 6] = [
    "gift wrap",
    "leave at door",
    "call on arrival",
    "fragile",
    "rush",
    "",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub city: String,
    pub age: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub item: String,
    pub quantity: i32,
    /// Cents; rendered with a comma separator to exercise normalization.
    pub unit_price_cents: i64,
    pub note: String,
}

impl Order {
    pub fn unit_price(&self) -> String {
        format!(
            "{},{:02}",
            self.unit_price_cents / 100,
            self.unit_price_cents % 100
        )
    }
}

/// Reproducible rows for demo tables.
#[derive(Debug, Clone)]
pub struct RowFaker {
    rng: DeterministicRng,
}

impl RowFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn customer(&mut self) -> Customer {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        Customer {
            name: format!("{first} {last}"),
            city: self.pick(&CITIES).to_owned(),
            age: 18 + self.int_n(60) as i32,
        }
    }

    pub fn order(&mut self) -> Order {
        Order {
            item: self.pick(&ITEMS).to_owned(),
            quantity: 1 + self.int_n(9) as i32,
            unit_price_cents: 199 + self.int_n(20_000) as i64,
            note: self.pick(&NOTES).to_owned(),
        }
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

fn column(name: &str, data_type: &str, udt_name: &str, has_default: bool) -> CatalogColumn {
    CatalogColumn {
        name: name.to_owned(),
        data_type: data_type.to_owned(),
        udt_name: udt_name.to_owned(),
        has_default,
    }
}

pub fn customer_columns() -> Vec<CatalogColumn> {
    vec![
        column("id", "integer", "int4", true),
        column("full_name", "character varying", "varchar", false),
        column("city", "text", "text", false),
        column("age", "smallint", "int2", false),
    ]
}

pub fn order_columns() -> Vec<CatalogColumn> {
    vec![
        column("order_id", "bigint", "int8", true),
        column("item", "text", "text", false),
        column("quantity", "integer", "int4", false),
        column("unit_price", "numeric", "numeric", false),
        column("note", "text", "text", false),
    ]
}

/// Backend holding `customers` and `orders` filled with `rows` faked rows
/// each.
pub fn seeded_backend(seed: u64, rows: usize) -> Result<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.add_table(CUSTOMERS, customer_columns(), Some("id"));
    backend.add_table(ORDERS, order_columns(), Some("order_id"));

    let mut faker = RowFaker::new(seed);
    for _ in 0..rows {
        let customer = faker.customer();
        let age = customer.age.to_string();
        backend
            .push_values(CUSTOMERS, &["", &customer.name, &customer.city, &age])
            .context("seed customer")?;

        let order = faker.order();
        let quantity = order.quantity.to_string();
        let price = order.unit_price().replace(',', ".");
        backend
            .push_values(ORDERS, &["", &order.item, &quantity, &price, &order.note])
            .context("seed order")?;
    }
    Ok(backend)
}

pub fn demo_translations() -> Translations {
    Translations::from_maps(
        [
            ("full_name".to_owned(), "Name".to_owned()),
            ("unit_price".to_owned(), "Price".to_owned()),
        ],
        [("orders".to_owned(), "Order book".to_owned())],
    )
}
