use tokio_util::sync::CancellationToken;

/// Cooperative stop flag shared between the caller and the engine.
///
/// The engine only looks at it before starting a model and before starting a
/// record; a request already on the wire always completes.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}
