// Domain models for the telemetry pipeline

mod container;
mod flags;
mod network;
mod process;
mod rates;
mod snapshot;
mod storage;
mod system;
mod thermal;

pub use container::{ContainerStat, DockerReading};
pub use flags::{CauseEntityType, PrimaryCause, SnapshotFlags};
pub use network::{ConnectivityReading, NetInterfaceCounters, NetReading};
pub use process::{ProcessReading, ProcessSample, TopProcess};
pub use rates::{DerivedRates, PrevCounters};
pub use snapshot::{HostIdentity, NormalizedSnapshot, RawSnapshot, SnapshotKind};
pub use storage::{DiskHealth, DiskHealthStatus, DiskIoCounters, DiskReading, PartitionUsage};
pub use system::{CpuReading, HostReading, LoadAverages, MemoryReading};
pub use thermal::{TemperatureReading, ThermalReading};
