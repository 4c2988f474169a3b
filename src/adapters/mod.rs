pub mod component_registry;
pub mod editor;
pub mod fixture_store;
pub mod sandbox;
pub mod serialize;

#[cfg(test)]
mod sandbox_test;
