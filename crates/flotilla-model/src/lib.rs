mod domain;
pub use domain::{Env, Flag, KeyValue, Labels, StackName, TimeoutMs};
pub use domain::{LABEL_MANAGED, LABEL_SERVICE, LABEL_STACK, MANAGED_VALUE};

mod error;
pub use error::{ModelError, ModelResult};

mod service;
pub use service::{
    Dependency, DependencyCondition, NetworkPlacement, NetworkReference, PortMapping, Protocol,
    RestartPolicy, ServiceSpec, SpecialMode, VolumeBinding, VolumeKind,
};

mod project;
pub use project::Project;
