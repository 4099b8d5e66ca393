//! Field policies: which string fields of a model are encrypted at rest.
//!
//! A policy is a list of named accessors. The encrypting repository runs each
//! selected field through the cipher and leaves every other field untouched,
//! so a new model type needs a policy value rather than a new repository type.

use strongroom_types::credential::Credential;

/// One encrypted field: a name for diagnostics and a mutable accessor.
pub struct SecretField<T> {
    name: &'static str,
    access: fn(&mut T) -> &mut String,
}

impl<T> SecretField<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for SecretField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SecretField<T> {}

/// The set of fields of `T` that are encrypted before storage.
pub struct FieldPolicy<T> {
    fields: Vec<SecretField<T>>,
}

impl<T> FieldPolicy<T> {
    /// A policy that encrypts nothing.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field to the policy.
    pub fn field(mut self, name: &'static str, access: fn(&mut T) -> &mut String) -> Self {
        self.fields.push(SecretField { name, access });
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(SecretField::name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replace every selected field of `model` with `transform(field)`.
    ///
    /// Stops at the first failing field; the model may then be partially
    /// transformed, so callers must discard it on error.
    pub fn apply<E>(
        &self,
        model: &mut T,
        mut transform: impl FnMut(&str) -> Result<String, E>,
    ) -> Result<(), E> {
        for field in &self.fields {
            let value = (field.access)(model);
            *value = transform(value.as_str())?;
        }
        Ok(())
    }
}

impl<T> Default for FieldPolicy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FieldPolicy<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

/// Every text field of a credential is encrypted.
pub fn credential_policy() -> FieldPolicy<Credential> {
    FieldPolicy::<Credential>::new()
        .field("title", |c| &mut c.title)
        .field("username", |c| &mut c.username)
        .field("password", |c| &mut c.password)
        .field("associated_resource", |c| &mut c.associated_resource)
        .field("description", |c| &mut c.description)
        .field("notes", |c| &mut c.notes)
}
