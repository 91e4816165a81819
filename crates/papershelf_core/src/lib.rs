pub mod catalog;
pub mod domain;
pub mod ports;
pub mod session;
pub mod validation;

pub use catalog::PaperCatalog;
pub use domain::{Paper, Principal, ProfileDocument, SessionSnapshot, UserProfile};
pub use ports::{IdentityError, IdentityService, ProfileStore, StoreError};
pub use session::{AuthFailure, SessionManager};
pub use validation::{normalize_email, ValidationError};
