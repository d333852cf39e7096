//! Pluggable capabilities consumed by the mappers.
//!
//! Mirrors the registry pattern used for transforms: a small trait, a blanket
//! impl for closures, and one production implementation each.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::CapabilityError;

/// Produces identifiers that are unique within a run
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Result<String, CapabilityError>;
}

impl<F> IdGenerator for F
where
    F: Fn() -> Result<String, CapabilityError> + Send + Sync,
{
    fn new_id(&self) -> Result<String, CapabilityError> {
        self()
    }
}

/// Random v4 UUIDs in hyphenated form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Result<String, CapabilityError> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// One-way hash applied to plaintext passwords.
///
/// Implementations may be CPU-heavy; the pipeline calls them on the blocking
/// thread pool.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, CapabilityError>;
}

impl<F> PasswordHasher for F
where
    F: Fn(&str) -> Result<String, CapabilityError> + Send + Sync,
{
    fn hash(&self, plaintext: &str) -> Result<String, CapabilityError> {
        self(plaintext)
    }
}

/// bcrypt with a fresh random salt per call
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub const DEFAULT_COST: u32 = 10;

    pub fn new(cost: u32) -> Result<Self, CapabilityError> {
        if !(4..=31).contains(&cost) {
            return Err(CapabilityError::Hashing(format!(
                "bcrypt cost must be between 4 and 31, got {}",
                cost
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CapabilityError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| CapabilityError::Hashing(e.to_string()))
    }
}

/// Capabilities shared by every mapper during a run
#[derive(Clone)]
pub struct Capabilities {
    pub ids: Arc<dyn IdGenerator>,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl Capabilities {
    pub fn new(ids: Arc<dyn IdGenerator>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { ids, hasher }
    }

    /// Hash `plaintext` off the async executor.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String, CapabilityError> {
        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| CapabilityError::Hashing(format!("hashing task aborted: {}", e)))?
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            ids: Arc::new(UuidGenerator),
            hasher: Arc::new(BcryptHasher::default()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Deterministic ids `id-1`, `id-2`, ...
    #[derive(Default)]
    pub struct SequentialIds {
        next: AtomicU64,
    }

    impl IdGenerator for SequentialIds {
        fn new_id(&self) -> Result<String, CapabilityError> {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("id-{}", n))
        }
    }

    pub fn capabilities() -> Capabilities {
        Capabilities::new(
            Arc::new(SequentialIds::default()),
            Arc::new(|plaintext: &str| -> Result<String, CapabilityError> {
                Ok(format!("hashed:{}", plaintext))
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_generator_is_unique() {
        let ids = UuidGenerator;
        let a = ids.new_id().unwrap();
        let b = ids.new_id().unwrap();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert!(BcryptHasher::new(3).is_err());
        assert!(BcryptHasher::new(32).is_err());
        assert_eq!(BcryptHasher::new(4).unwrap().cost(), 4);
    }

    #[test]
    fn test_bcrypt_hash_verifies() {
        let hasher = BcryptHasher::new(4).unwrap();
        let hashed = hasher.hash("s3nha").unwrap();

        assert_ne!(hashed, "s3nha");
        assert!(bcrypt::verify("s3nha", &hashed).unwrap());
    }

    #[tokio::test]
    async fn test_hash_password_runs_capability() {
        let caps = testing::capabilities();
        assert_eq!(caps.hash_password("abc").await.unwrap(), "hashed:abc");
    }

    #[tokio::test]
    async fn test_hash_password_surfaces_failure() {
        let caps = Capabilities::new(
            Arc::new(UuidGenerator),
            Arc::new(|_: &str| -> Result<String, CapabilityError> {
                Err(CapabilityError::Hashing("backend down".to_string()))
            }),
        );

        let err = caps.hash_password("abc").await.unwrap_err();
        assert_eq!(err, CapabilityError::Hashing("backend down".to_string()));
    }
}
