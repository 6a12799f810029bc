pub mod index_routes;
pub mod system_routes;
