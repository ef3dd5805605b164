use heroes_engine::PaginationConfig;
use heroes_store::{Engine, EngineOptions};

#[allow(dead_code)]
pub fn engine() -> Engine {
    let engine = Engine::open_in_memory(EngineOptions::default()).expect("open in-memory engine");
    engine.ensure_schema().expect("ensure schema");
    engine
}

#[allow(dead_code)]
pub fn pagination() -> PaginationConfig {
    PaginationConfig::default()
}
