pub mod ollama_service;
pub mod open_ai_service;
pub mod vertex_service;
