pub mod index_service;
