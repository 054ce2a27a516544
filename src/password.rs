use crate::middleware::{PasswordHasher, StoreError};

/// bcrypt-backed [`PasswordHasher`].
///
/// Stored form is the standard modular crypt string (`$2b$<cost>$<salt><digest>`), so
/// hashes carry their own cost and salt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Hasher with an explicit work factor, clamped to the range bcrypt accepts.
    #[must_use]
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, StoreError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!(error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        BcryptHasher::with_cost(4)
    }

    #[test]
    fn verifies_own_hash() {
        let hash = hasher().hash("hunter2").unwrap();
        assert!(hasher().verify("hunter2", &hash));
        assert!(!hasher().verify("hunter3", &hash));
    }

    #[test]
    fn salts_differ_per_hash() {
        assert_ne!(hasher().hash("same").unwrap(), hasher().hash("same").unwrap());
    }

    #[test]
    fn hash_records_its_work_factor() {
        let hash = BcryptHasher::with_cost(5).hash("pw").unwrap();
        assert!(hash.starts_with("$2b$05$"), "unexpected hash {hash}");
        // Verification reads the cost from the hash, not from the hasher.
        assert!(hasher().verify("pw", &hash));
    }

    #[test]
    fn cost_is_clamped() {
        assert_eq!(BcryptHasher::with_cost(1).cost(), 4);
        assert_eq!(BcryptHasher::with_cost(99).cost(), 31);
        assert_eq!(BcryptHasher::default().cost(), bcrypt::DEFAULT_COST);
    }

    #[test]
    fn rejects_malformed_hash() {
        assert!(!hasher().verify("pw", "no-separator"));
        assert!(!hasher().verify("pw", "$2b$04$short"));
        assert!(!hasher().verify("pw", ""));
    }
}
