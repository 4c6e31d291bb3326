pub mod stations_api;
