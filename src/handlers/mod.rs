// handlers/mod.rs - Two-tier handler layout
//
// Public (anonymous allowed) → Protected (signed-in user required)

pub mod payload;
pub mod protected;
pub mod public;
