//! The fact producer contract and link-time registration of built-ins.
//!
//! A producer computes zero or more facts from host state, taking no input.
//! Built-in producers live in `hostfacts-producers` and register themselves
//! with [`fact_producer!`](crate::fact_producer); external producers are
//! executables discovered at run time (see [`crate::external`]).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ProducerError;
use crate::value::FactMap;

/// Outcome of one producer invocation.
pub type ProducerResult = Result<FactMap, ProducerError>;

/// Uniform contract every fact producer implements.
///
/// Implementations acquire any OS resources they need inside [`produce`]
/// and release them before returning; nothing is shared between producers.
///
/// [`produce`]: FactProducer::produce
pub trait FactProducer: Send + Sync {
	/// Computes this producer's facts from current host state.
	fn produce(&self) -> ProducerResult;
}

impl<P: FactProducer + ?Sized> FactProducer for &P {
	fn produce(&self) -> ProducerResult {
		(**self).produce()
	}
}

/// Where a producer came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProducerSource {
	/// Compiled into the binary.
	Builtin,
	/// Executable discovered in the facts directory.
	External(PathBuf),
}

impl fmt::Display for ProducerSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Builtin => f.write_str("builtin"),
			Self::External(path) => write!(f, "{}", path.display()),
		}
	}
}

/// Identifies one producer for the duration of a run.
#[derive(Clone)]
pub struct ProducerHandle {
	name: String,
	source: ProducerSource,
	producer: Arc<dyn FactProducer>,
}

impl ProducerHandle {
	/// Creates a handle for `producer`, registered as `name`.
	pub fn new(name: impl Into<String>, source: ProducerSource, producer: Arc<dyn FactProducer>) -> Self {
		Self {
			name: name.into(),
			source,
			producer,
		}
	}

	/// Returns the producer name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns where the producer came from.
	pub fn source(&self) -> &ProducerSource {
		&self.source
	}

	/// Invokes the producer on the calling thread.
	pub fn invoke(&self) -> ProducerResult {
		self.producer.produce()
	}
}

impl fmt::Debug for ProducerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProducerHandle")
			.field("name", &self.name)
			.field("source", &self.source)
			.finish_non_exhaustive()
	}
}

/// A producer compiled into the binary.
pub struct BuiltinProducer {
	/// Unique producer name (the module name by convention).
	pub name: &'static str,
	/// One-line description for `hostfacts list`.
	pub description: &'static str,
	/// Crate that defined this producer.
	pub crate_name: &'static str,
	pub produce: fn() -> ProducerResult,
}

impl FactProducer for BuiltinProducer {
	fn produce(&self) -> ProducerResult {
		(self.produce)()
	}
}

impl fmt::Debug for BuiltinProducer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BuiltinProducer")
			.field("name", &self.name)
			.field("crate_name", &self.crate_name)
			.finish()
	}
}

/// Wrapper for `inventory::collect!`.
pub struct BuiltinProducerReg(pub &'static BuiltinProducer);

inventory::collect!(BuiltinProducerReg);

/// All linked built-in producers, in link order.
pub fn builtin_producers() -> impl Iterator<Item = &'static BuiltinProducer> {
	inventory::iter::<BuiltinProducerReg>.into_iter().map(|reg| reg.0)
}

/// Registers a built-in fact producer via `inventory`.
///
/// ```ignore
/// fact_producer!(
/// 	sip_status,
/// 	{ description: "System Integrity Protection status" },
/// 	produce: sip_status
/// );
/// ```
#[macro_export]
macro_rules! fact_producer {
	($name:ident, { description: $desc:expr $(,)? }, produce: $produce:path $(,)?) => {
		$crate::paste::paste! {
			#[allow(non_upper_case_globals)]
			pub static [<FACT_PRODUCER_ $name>]: $crate::producer::BuiltinProducer =
				$crate::producer::BuiltinProducer {
					name: stringify!($name),
					description: $desc,
					crate_name: env!("CARGO_PKG_NAME"),
					produce: $produce,
				};

			$crate::inventory::submit!($crate::producer::BuiltinProducerReg(&[<FACT_PRODUCER_ $name>]));
		}
	};
}
