//! 类型定义模块

mod dns;

pub use dns::{
    CleanupFailure, CleanupReport, CreateOutcome, CreateRecordRequest, DeleteOutcome,
    ManagedRecord,
};

// Re-export provider 库的公共类型
pub use autoserve_provider::{
    DnsRecord, DnsRecordType, NewDnsRecord, RecordFilter, RegistrarCapabilities, Zone,
};
