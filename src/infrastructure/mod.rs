pub mod http_repo;
