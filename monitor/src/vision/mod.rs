pub mod gemini;

pub use gemini::GeminiAnalyzer;
