//! Administrative authority checks.

use crate::Error;

/// Answers whether the current caller may run administrative actions.
pub trait Authorizer: Send + Sync {
    fn can_manage(&self) -> bool;

    /// `Err(Unauthorized)` unless [`Authorizer::can_manage`] holds.
    fn require_manage(&self, action: &str) -> Result<(), Error> {
        if self.can_manage() {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!("insufficient permissions to {action}")))
        }
    }
}

/// Fixed answer, decided by whoever builds it.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuthorizer(bool);

impl StaticAuthorizer {
    /// Operator at a shell or an uninstall run.
    pub fn granted() -> Self {
        Self(true)
    }

    pub fn denied() -> Self {
        Self(false)
    }
}

impl Authorizer for StaticAuthorizer {
    fn can_manage(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_manage() {
        assert!(StaticAuthorizer::granted().require_manage("clear the cache").is_ok());

        let err = StaticAuthorizer::denied().require_manage("clear the cache").unwrap_err();
        assert!(matches!(err, Error::Unauthorized(msg) if msg.contains("clear the cache")));
    }
}
