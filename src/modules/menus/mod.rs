pub mod controller;
pub mod importer;
pub mod model;
pub mod router;
pub mod service;
