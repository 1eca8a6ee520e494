pub mod completion;
pub mod embeddings;
pub mod prompt;
pub mod responder;
pub mod retriever;
pub mod vector_index;
