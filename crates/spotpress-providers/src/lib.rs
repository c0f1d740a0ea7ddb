//! spotpress-providers: the external image-generation capability as an
//! explicit interface.
//!
//! The core pipeline never talks to a network. Generation is modeled
//! as a trait with two operations (generate a design, fill a masked
//! region) and a [`FallbackChain`] that tries an ordered list of
//! providers in sequence, aggregating every failure so the caller can
//! distinguish "no credential anywhere" from "everyone rate-limited".
//! The chain never retries a provider internally.

use serde::{Deserialize, Serialize};

/// Why a single provider attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ProviderError {
    /// The provider is not configured with a credential.
    #[error("missing credential")]
    MissingCredential,

    /// The provider refused the request due to rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// The provider answered, but not with usable image bytes.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider could not be reached.
    #[error("network failure: {0}")]
    NetworkFailure(String),
}

/// A design generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Free-text description of the desired design.
    pub prompt: String,
    /// Style preset name, applied provider-side.
    pub style: Option<String>,
    /// Optional reference image (encoded PNG bytes).
    pub reference_png: Option<Vec<u8>>,
}

impl GenerationRequest {
    /// A plain prompt with no style or reference.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: None,
            reference_png: None,
        }
    }
}

/// An image-generation backend.
///
/// Implementations own transport, authentication, and response
/// parsing; callers see only image bytes or a classified error.
pub trait GenerationProvider {
    /// Provider name, used in error reports and logs.
    fn name(&self) -> &str;

    /// Generate a design from a request.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] classifying the failure.
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>, ProviderError>;

    /// Fill the transparent region of an image.
    ///
    /// `image_png` is a design with a hole cut where new content
    /// should appear; `instruction` describes what to put there. The
    /// result covers the full canvas.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] classifying the failure.
    fn fill_region(&self, image_png: &[u8], instruction: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Every provider in the chain failed.
#[derive(Debug, thiserror::Error)]
#[error(
    "all {} providers failed{}",
    attempts.len(),
    attempts
        .last()
        .map(|(name, err)| format!(" (last: {name}: {err})"))
        .unwrap_or_default()
)]
pub struct AllProvidersFailed {
    /// One entry per attempted provider, in attempt order.
    pub attempts: Vec<(String, ProviderError)>,
}

/// An ordered list of providers tried in sequence.
///
/// The first success wins. Errors from earlier providers are kept and
/// returned together if every provider fails, so nothing about the
/// chain's path is hidden from the caller.
#[derive(Default)]
pub struct FallbackChain {
    providers: Vec<Box<dyn GenerationProvider>>,
}

impl FallbackChain {
    /// An empty chain. Calling it fails with an empty attempt list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider; earlier entries are tried first.
    #[must_use]
    pub fn with(mut self, provider: Box<dyn GenerationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of providers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try [`GenerationProvider::generate`] on each provider in order.
    ///
    /// # Errors
    ///
    /// Returns [`AllProvidersFailed`] with one entry per attempt if no
    /// provider succeeds.
    pub fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>, AllProvidersFailed> {
        self.try_each(|provider| provider.generate(request))
    }

    /// Try [`GenerationProvider::fill_region`] on each provider in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`AllProvidersFailed`] with one entry per attempt if no
    /// provider succeeds.
    pub fn fill_region(
        &self,
        image_png: &[u8],
        instruction: &str,
    ) -> Result<Vec<u8>, AllProvidersFailed> {
        self.try_each(|provider| provider.fill_region(image_png, instruction))
    }

    fn try_each(
        &self,
        mut attempt: impl FnMut(&dyn GenerationProvider) -> Result<Vec<u8>, ProviderError>,
    ) -> Result<Vec<u8>, AllProvidersFailed> {
        let mut attempts = Vec::new();
        for provider in &self.providers {
            match attempt(provider.as_ref()) {
                Ok(bytes) => return Ok(bytes),
                Err(err) => attempts.push((provider.name().to_owned(), err)),
            }
        }
        Err(AllProvidersFailed { attempts })
    }
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field(
                "providers",
                &self
                    .providers
                    .iter()
                    .map(|p| p.name().to_owned())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
