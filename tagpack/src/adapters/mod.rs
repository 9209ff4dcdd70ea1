//! Built-in adapters.

pub mod callable;
pub mod datetime;
pub mod object;

pub use callable::Callable;
pub use object::ObjectAdapter;

use tagpack_common::logging::Component;

use crate::serializer::Serializer;

/// Install the date/time and callable strategies
pub fn install_defaults(serializer: &mut Serializer) {
    datetime::register(serializer);
    callable::register(serializer);
    serializer
        .logger()
        .with_component(Component::Adapter)
        .debug("Installed date/time and callable adapters");
}
