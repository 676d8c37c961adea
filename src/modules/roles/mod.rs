pub mod controller;
pub mod policy_store;
pub mod router;
pub mod service;

pub use policy_store::PgPolicyStore;
pub use router::init_roles_router;
