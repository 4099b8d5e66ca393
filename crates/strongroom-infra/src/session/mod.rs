//! Session management: configuration, session factories and the provider
//! that builds and rebuilds them as model sources register.

pub mod configuration;
pub mod factory;
pub mod provider;

pub use configuration::Configuration;
pub use factory::SessionFactory;
pub use provider::{ProviderStatus, SessionFactoryProvider};
