pub mod db;
pub mod vision_llm;

pub use db::DbAdapter;
pub use vision_llm::OpenAiVisionAdapter;
