mod credentials;

pub use credentials::{Credentials, UserName};
