//! Shared entity fixtures for depot tests.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use depot_types::{Document, ScopedFilter};

/// A scope-owned, soft-deletable document for repository tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    pub scope_id: Uuid,
    pub name: String,
    pub is_deleted: bool,
}

impl Widget {
    pub fn new(scope_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope_id,
            name: name.into(),
            is_deleted: false,
        }
    }
}

impl Document for Widget {
    type Id = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }
}

/// The standard scoped filter over [`Widget`] documents.
pub type WidgetFilter = ScopedFilter<Uuid>;
