//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each backend module (storage, courier, asset host) provides a `Registry`
/// struct implementing this trait, so the service binary can build its
/// factory maps from the names used in configuration.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// for example "memory" for `storage.implementations.memory` or "ghn" for
	/// `courier.implementations.ghn`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
