mod depends;
pub use depends::{Dependency, DependencyCondition};

mod network;
pub use network::{NetworkPlacement, NetworkReference, SpecialMode};

mod port;
pub use port::{PortMapping, Protocol};

mod restart;
pub use restart::RestartPolicy;

mod spec;
pub use spec::ServiceSpec;

mod volume;
pub use volume::{VolumeBinding, VolumeKind};
