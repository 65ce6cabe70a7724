use super::error::GenerationServiceError;
use super::prompt::{build_user_prompt, sanitize, sanitize_profile, SYSTEM_PROMPT};
use crate::domain::auth::IdentityVerifier;
use crate::domain::quota::{decide, QuotaDecision};
use crate::infrastructure::repositories::{
    GenerationRepository, RateLimitRepository, UsageRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// One generation attempt as received at the HTTP boundary
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub job_text: String,
    pub profile: serde_json::Value,
    pub tone: String,
    /// Bearer token, `None` for visitors
    pub credential: Option<String>,
    /// Client network identifier used for the visitor window
    pub client_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Visitor { client_key: String },
    Account { account_id: String },
}

pub struct GenerationService {
    identity: Arc<dyn IdentityVerifier>,
    usage_repo: Arc<dyn UsageRepository>,
    rate_limiter: Arc<dyn RateLimitRepository>,
    /// `None` when the backend credential is missing from the environment
    backend: Option<Arc<dyn GenerationRepository>>,
    max_tokens: u32,
    timeout: Duration,
}

impl GenerationService {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        usage_repo: Arc<dyn UsageRepository>,
        rate_limiter: Arc<dyn RateLimitRepository>,
        backend: Option<Arc<dyn GenerationRepository>>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            identity,
            usage_repo,
            rate_limiter,
            backend,
            max_tokens,
            timeout,
        }
    }
}

#[async_trait]
pub trait GenerationServiceApi: Send + Sync {
    /// Generate a proposal for the given job description
    ///
    /// This operation:
    /// - Sanitizes every free-text field
    /// - Resolves the caller (visitor or account)
    /// - Consumes one unit of quota: visitor window or weekly ledger
    /// - Calls the generation backend with a bounded timeout
    ///
    /// Quota is consumed on attempt. A backend failure after a successful
    /// quota check does not give the unit back.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationServiceError>;
}

#[async_trait]
impl GenerationServiceApi for GenerationService {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationServiceError> {
        // Fail fast without touching any quota
        let backend = self
            .backend
            .as_ref()
            .ok_or(GenerationServiceError::Misconfiguration)?;

        // 1. Normalize input
        let job_text = sanitize(&request.job_text);
        if job_text.trim().is_empty() {
            return Err(GenerationServiceError::Invalid(
                "jobText cannot be empty".to_string(),
            ));
        }
        let profile = sanitize_profile(&request.profile);
        let tone = sanitize(&request.tone);

        // 2. Resolve identity
        let caller = self.resolve_caller(&request).await?;

        // 3. Quota check
        match &caller {
            Caller::Visitor { client_key } => self.guard_visitor(client_key).await?,
            Caller::Account { account_id } => self.consume_weekly_quota(account_id).await?,
        }

        // 4. Generation call
        let user_prompt = build_user_prompt(&job_text, &profile, &tone);
        let start_time = std::time::Instant::now();

        let proposal = tokio::time::timeout(
            self.timeout,
            backend.complete(SYSTEM_PROMPT, &user_prompt, self.max_tokens),
        )
        .await
        .map_err(|_| {
            GenerationServiceError::BackendFailure(format!(
                "generation timed out after {}s",
                self.timeout.as_secs_f32()
            ))
        })??;

        tracing::info!(
            caller = ?caller,
            latency_ms = start_time.elapsed().as_millis(),
            proposal_length = proposal.len(),
            "Proposal generated"
        );

        Ok(proposal)
    }
}

impl GenerationService {
    async fn resolve_caller(
        &self,
        request: &GenerationRequest,
    ) -> Result<Caller, GenerationServiceError> {
        match &request.credential {
            Some(token) => {
                let account_id = self.identity.verify(token, true).await?;
                Ok(Caller::Account { account_id })
            }
            None => Ok(Caller::Visitor {
                client_key: request.client_key.clone(),
            }),
        }
    }

    async fn guard_visitor(&self, client_key: &str) -> Result<(), GenerationServiceError> {
        let key = format!("visitor:{}", client_key);
        let decision = self.rate_limiter.limit(&key).await?;

        if !decision.success {
            tracing::warn!(
                key = %key,
                reset_at = %decision.reset_at,
                "Visitor trial exhausted"
            );
            return Err(GenerationServiceError::VisitorTrialExhausted {
                resets_at: decision.reset_at,
            });
        }

        tracing::info!(
            key = %key,
            remaining = decision.remaining,
            "Visitor request allowed"
        );

        Ok(())
    }

    async fn consume_weekly_quota(&self, account_id: &str) -> Result<(), GenerationServiceError> {
        let now = Utc::now();
        let decision = self
            .usage_repo
            .transact(account_id, &|existing| decide(account_id, existing, now))
            .await
            .map_err(|e| {
                tracing::warn!(account_id = %account_id, error = %e, "Weekly quota check failed");
                GenerationServiceError::from(e)
            })?;

        let record = decision.record();
        tracing::info!(
            account_id = %account_id,
            outcome = decision.kind(),
            plan = %record.plan,
            weekly_count = record.weekly_count,
            "Weekly quota consumed"
        );

        if let QuotaDecision::Unmetered(_) = decision {
            tracing::debug!(account_id = %account_id, "Unmetered plan, ledger not written");
        }

        Ok(())
    }
}
