//! Fetch collaborators: the SSRF guard that vets user-supplied URLs and the
//! fetcher that downloads and decodes pages.
//!
//! Both are traits so the orchestrator can run against fakes in tests.

pub(crate) mod charset;
mod fetch;
mod guard;

pub use fetch::{
    is_accepted_content_type, media_type, ContentFetcher, FetchedContent, MockFetcher,
    MockResponse, ReqwestFetcher, ACCEPTED_CONTENT_TYPES, MAX_BODY_BYTES,
};
pub use guard::{check_url_shape, is_public_ip, DnsUrlGuard, FakeUrlGuard, UrlGuard, UrlValidation};
