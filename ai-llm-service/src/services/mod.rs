pub mod ollama_service;
