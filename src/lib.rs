pub mod adlibrary;
pub mod credentials;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod signer;

pub use adlibrary::AdLibraryClient;
pub use credentials::{Cookie, CookieJar, Credentials};
pub use error::{AdLensError, Result};
pub use models::{Ad, AdDetail, AdInfo, AdListing, AgeRange, Page, PageInfo, Targeting};
