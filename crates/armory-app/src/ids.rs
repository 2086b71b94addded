// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(RowId);
entity_id!(ItemId);
entity_id!(KitId);
entity_id!(PendingSigningId);
entity_id!(SigningId);
entity_id!(SwitchRequestId);
entity_id!(UserId);
entity_id!(TrackingId);

impl RowId {
    /// Identity for rows whose listing omitted the identity field.
    pub fn positional(index: usize) -> Self {
        Self(format!("#{index}"))
    }

    pub fn is_positional(&self) -> bool {
        self.0.starts_with('#')
    }
}
