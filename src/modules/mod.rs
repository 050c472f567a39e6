// Module exports for pure logic
pub mod sort_order;          // Tab zones, pins, display order
pub mod hierarchy;           // Tab/group/bookmark edits
pub mod drag;                // Drag gesture -> mutation
pub mod document_store;      // In-memory document + implicit save
pub mod storage;             // Persistence layer
pub mod save_queue;          // Serialized background saves
pub mod icons;               // Icon catalog
pub mod links;               // Typed URL normalization
