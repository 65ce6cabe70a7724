pub mod generation_repository;
pub mod memory_rate_limit_repository;
pub mod openai_generation_repository;
pub mod proposal_repository;
pub mod rate_limit_repository;
pub mod redis_rate_limit_repository;
pub mod revocation_repository;
pub mod usage_repository;

pub use generation_repository::{GenerationRepository, GenerationRepositoryError};
pub use memory_rate_limit_repository::MemoryRateLimitRepository;
pub use openai_generation_repository::OpenAiGenerationRepository;
pub use proposal_repository::{PostgresProposalRepository, ProposalRepository};
pub use rate_limit_repository::{
    RateLimitDecision, RateLimitRepository, RateLimiterUnavailable, RATE_LIMIT_PREFIX,
};
pub use redis_rate_limit_repository::RedisRateLimitRepository;
pub use revocation_repository::{PostgresRevocationRepository, RevocationRepository};
pub use usage_repository::{LedgerError, PostgresUsageRepository, QuotaMutation, UsageRepository};
