pub mod embedd_request;
pub mod embedd_route;
