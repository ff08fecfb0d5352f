mod kv;
pub use kv::KeyValue;

mod env;
pub use env::Env;

mod flag;
pub use flag::Flag;

mod labels;
pub use labels::Labels;

mod constants;
pub use constants::{LABEL_MANAGED, LABEL_SERVICE, LABEL_STACK, MANAGED_VALUE};

/// Name of a stack.
///
/// Every runtime object owned by a stack carries the label `stack=<StackName>`,
/// which is the only link between the stack and its containers.
pub type StackName = String;

/// Duration value in milliseconds.
///
/// Used by configuration structs where an explicit time limit is required.
pub type TimeoutMs = u64;
