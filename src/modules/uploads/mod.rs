pub mod controller;
pub mod router;
pub mod service;
pub mod storage;

pub use router::init_uploads_router;
pub use storage::{LocalUploadStore, StorageError, UploadStore};
