//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and depend only on the driving
//! ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountAuth, ContactsCommand, ContactsQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub contacts: Arc<dyn ContactsQuery>,
    pub commands: Arc<dyn ContactsCommand>,
    pub auth: Arc<dyn AccountAuth>,
}

impl HttpState {
    /// Bundle the three driving ports.
    pub fn new(
        contacts: Arc<dyn ContactsQuery>,
        commands: Arc<dyn ContactsCommand>,
        auth: Arc<dyn AccountAuth>,
    ) -> Self {
        Self {
            contacts,
            commands,
            auth,
        }
    }

    /// Build state from one service implementing every driving port.
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: ContactsQuery + ContactsCommand + AccountAuth + 'static,
    {
        Self {
            contacts: service.clone(),
            commands: service.clone(),
            auth: service,
        }
    }
}
