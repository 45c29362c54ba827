//! Avatar image hosting adapters.

mod cloudinary;

pub use cloudinary::{CloudinaryAvatarStore, CloudinaryCredentials, UnconfiguredAvatarStore};
