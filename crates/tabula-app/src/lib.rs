// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod backend;
pub mod controller;
pub mod error;
pub mod form;
pub mod memory;
pub mod model;
pub mod rows;
pub mod shell;
pub mod state;
pub mod translate;
pub mod validation;

pub use backend::*;
pub use controller::*;
pub use error::*;
pub use form::*;
pub use memory::*;
pub use model::*;
pub use rows::*;
pub use shell::*;
pub use state::*;
pub use translate::*;
pub use validation::*;
