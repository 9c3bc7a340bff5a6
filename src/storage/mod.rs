pub mod collection;
pub mod factory;
pub mod registry;

pub use collection::MirrorCollection;
pub use factory::EntityFactory;
pub use registry::Registry;
