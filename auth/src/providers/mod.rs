//! Provider adapters and persistence interfaces.
//!
//! Everything the gateway talks to across a network boundary is a trait
//! here, so tests swap in the in-memory versions from [`crate::mocks`].
//!
//! - [`ProviderAdapter`]: one per identity provider, held as a trait object
//!   in the [`ProviderRegistry`]
//! - [`UserRepository`] / [`SessionStore`]: storage, used as generics

pub mod oauth;
pub mod registry;
pub mod session;
pub mod spotify;
pub mod user;
pub mod youtube_music;

pub use oauth::{ProviderAdapter, http_client};
pub use registry::ProviderRegistry;
pub use session::SessionStore;
pub use spotify::SpotifyAdapter;
pub use user::UserRepository;
pub use youtube_music::YouTubeMusicAdapter;
