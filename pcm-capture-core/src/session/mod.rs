pub mod capture_loop;
pub mod controller;
