// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responder registry: registration, token rotation, retirement, health.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AirError;
use crate::model::{epoch_ms, Responder, ResponderId, ResponderStatus};
use crate::store::{IdentityStore, NewResponder, StoreError};

/// Attempts at drawing a token that no other responder holds.
const TOKEN_ATTEMPTS: usize = 8;

/// Outcome of a successful `register` call.
#[derive(Debug, Clone)]
pub struct Registration {
    pub responder: Responder,
    /// True when an existing identity was re-activated under a new token.
    pub rotated: bool,
}

/// Owns responder lifecycle on top of an [`IdentityStore`].
pub struct ResponderRegistry {
    store: Arc<dyn IdentityStore>,
    rng: Mutex<StdRng>,
    healthy_probability: f64,
}

impl ResponderRegistry {
    pub fn new(store: Arc<dyn IdentityStore>, healthy_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { store, rng: Mutex::new(rng), healthy_probability: healthy_probability.clamp(0.0, 1.0) }
    }

    /// Register a responder, or re-activate a retired one under a new token.
    ///
    /// An empty token counts as absent.
    pub fn register(
        &self,
        token: Option<&str>,
        name: Option<&str>,
    ) -> Result<Registration, AirError> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => self.reregister(token),
            None => self.create(name).map(|responder| Registration { responder, rotated: false }),
        }
    }

    fn create(&self, name: Option<&str>) -> Result<Responder, AirError> {
        let (name, status) = {
            let mut rng = self.rng.lock();
            let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
                Some(n) => n.to_owned(),
                None => format!("Responder-{}", rng.random_range(0..1000)),
            };
            let status = if rng.random_bool(self.healthy_probability) {
                ResponderStatus::Healthy
            } else {
                ResponderStatus::Unhealthy
            };
            (name, status)
        };

        for _ in 0..TOKEN_ATTEMPTS {
            let new = NewResponder {
                name: name.clone(),
                token: self.generate_token(),
                status,
                now: epoch_ms(),
            };
            match self.store.insert_responder(new) {
                Ok(responder) => {
                    tracing::info!(
                        responder_id = responder.id,
                        name = %responder.name,
                        status = %responder.status,
                        "new responder created"
                    );
                    return Ok(responder);
                }
                Err(StoreError::DuplicateToken) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(AirError::Internal("could not generate a unique token".to_owned()))
    }

    fn reregister(&self, token: &str) -> Result<Registration, AirError> {
        let existing = self.store.responder_by_token(token)?.ok_or(AirError::UnknownToken)?;
        if existing.is_registered {
            tracing::warn!(responder_id = existing.id, name = %existing.name, "responder already registered");
            return Err(AirError::AlreadyRegistered);
        }

        for _ in 0..TOKEN_ATTEMPTS {
            match self.store.reactivate(token, &self.generate_token(), epoch_ms()) {
                Ok(Some(responder)) => {
                    tracing::info!(
                        responder_id = responder.id,
                        name = %responder.name,
                        "responder re-registered with new token"
                    );
                    return Ok(Registration { responder, rotated: true });
                }
                // Lost a race: another caller re-activated this token first.
                Ok(None) => return Err(AirError::AlreadyRegistered),
                Err(StoreError::DuplicateToken) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(AirError::Internal("could not generate a unique token".to_owned()))
    }

    /// Retire a registered responder. Its token stays valid for re-registration.
    pub fn deregister(&self, token: &str) -> Result<Responder, AirError> {
        let existing = self.store.responder_by_token(token)?.ok_or(AirError::NotFound)?;
        if !existing.is_registered {
            tracing::warn!(responder_id = existing.id, name = %existing.name, "responder already deregistered");
            return Err(AirError::AlreadyDeregistered);
        }
        match self.store.deactivate(token, epoch_ms())? {
            Some(responder) => {
                tracing::info!(responder_id = responder.id, name = %responder.name, "responder deregistered");
                Ok(responder)
            }
            None => Err(AirError::AlreadyDeregistered),
        }
    }

    /// Registered responders, ordered by id.
    pub fn list_active(&self) -> Result<Vec<Responder>, AirError> {
        Ok(self.store.registered_responders()?)
    }

    /// Mark a responder healthy and record the network facts it reported.
    pub fn record_heartbeat(
        &self,
        id: ResponderId,
        ip_address: &str,
        operating_system: &str,
    ) -> Result<(), AirError> {
        if self.store.record_heartbeat(id, ip_address, operating_system, epoch_ms())? {
            Ok(())
        } else {
            Err(AirError::NotFound)
        }
    }

    /// Look up the responder holding `token`.
    pub fn resolve(&self, token: &str) -> Result<Responder, AirError> {
        self.store.responder_by_token(token)?.ok_or(AirError::NotFound)
    }

    pub fn by_id(&self, id: ResponderId) -> Result<Option<Responder>, AirError> {
        Ok(self.store.responder_by_id(id)?)
    }

    pub fn count(&self) -> Result<usize, AirError> {
        Ok(self.store.responder_count()?)
    }

    /// 16 random bytes, lowercase hex.
    fn generate_token(&self) -> String {
        let bytes: [u8; 16] = self.rng.lock().random();
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
