pub mod controller;
pub mod grades;
pub mod model;
pub mod router;
pub mod service;
