pub mod session_repo;
