//! Batch audit of capsule archives.

pub mod assist;
mod auditor;
pub mod discovery;
pub mod metadata;
mod summary;

pub use assist::Advisor;
pub use assist::AdvisorError;
pub use assist::AgentAssist;
pub use assist::AssistRequest;
pub use auditor::Auditor;
pub use auditor::REPAIRED_SUFFIX;
pub use metadata::CapsuleTemplates;
pub use metadata::GptHook;
pub use metadata::PersonalityDocument;
pub use metadata::ReflectDocument;
pub use summary::ArchiveAudit;
pub use summary::AuditBatch;
pub use summary::AuditOutcome;
pub use summary::RepairSummary;
