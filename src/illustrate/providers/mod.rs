// src/illustrate/providers/mod.rs
pub mod pexels;
pub mod unsplash;

pub use pexels::PexelsProvider;
pub use unsplash::UnsplashProvider;
