// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod actions;
pub mod forms;
pub mod ids;
pub mod model;
pub mod pages;
pub mod response;
pub mod selection;
pub mod state;

pub use actions::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use pages::*;
pub use response::*;
pub use selection::*;
pub use state::*;
