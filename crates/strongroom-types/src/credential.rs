//! The credential model: a stored login for some resource.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{DataModel, ModelId, UNSET_ID};

/// A login for some resource, stored with every text field encrypted.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credential {
    pub id: ModelId,
    pub title: String,
    pub username: String,
    pub password: String,
    /// Where the credential is used (URL, host, application name).
    pub associated_resource: String,
    pub description: String,
    pub notes: String,
}

impl Credential {
    /// A transient credential with the required fields set.
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: UNSET_ID,
            title: title.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.associated_resource = resource.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl DataModel for Credential {
    fn id(&self) -> ModelId {
        self.id
    }

    fn set_id(&mut self, id: ModelId) {
        self.id = id;
    }
}

// The password never appears in Debug output.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"***")
            .field("associated_resource", &self.associated_resource)
            .field("description", &self.description)
            .field("notes", &self.notes)
            .finish()
    }
}
