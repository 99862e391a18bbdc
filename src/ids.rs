use uuid::Uuid;

/// Source of fresh subscriber identifiers.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// Random UUID v4, hyphenated.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4;

impl IdGenerator for UuidV4 {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
