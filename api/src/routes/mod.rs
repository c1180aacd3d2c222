pub mod embedd;
pub mod health_route;
