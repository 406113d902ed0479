use std::sync::{Arc, RwLock};

/// Supplies the current access token; read fresh on every connect attempt
pub trait TokenSupplier: Send + Sync + 'static {
    fn access_token(&self) -> Option<String>;
}

impl<F> TokenSupplier for F
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    fn access_token(&self) -> Option<String> {
        self()
    }
}

/// Token slot shared with the auth layer, which sets and clears it
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        self.replace(Some(token.into()));
    }

    pub fn clear(&self) {
        self.replace(None);
    }

    fn replace(&self, token: Option<String>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

impl TokenSupplier for SharedToken {
    fn access_token(&self) -> Option<String> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
